//! JSON run report: one record per analysis with timings and outcome.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value as Json};
use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use crate::{
    analysis::{AnalysisRun, AnalysisValue},
    error::{AnalyticsError, Result},
    table::{Table, Value},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub analysis: String,
    pub status: String,
    pub rows: Option<u64>,
    pub result: Json,
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub elapsed_ms: i64,
}

impl From<&AnalysisRun> for AnalysisRecord {
    fn from(run: &AnalysisRun) -> Self {
        Self {
            analysis: run.analysis.name().to_string(),
            status: run.status().to_string(),
            rows: run.rows,
            result: run.value.as_ref().map_or(Json::Null, value_json),
            error: run.error.clone(),
            started_at: run.started_at,
            finished_at: run.finished_at,
            elapsed_ms: run.elapsed_ms(),
        }
    }
}

fn cell_json(v: &Value) -> Json {
    match v {
        Value::Null => Json::Null,
        Value::Bool(b) => json!(b),
        Value::Int(i) => json!(i),
        Value::Decimal(d) => json!(d),
        Value::Str(s) => json!(s),
    }
}

fn table_json(t: &Table) -> Json {
    let names: Vec<&str> = t.schema().names().collect();
    Json::Array(
        t.rows()
            .iter()
            .map(|row| {
                let obj: Map<String, Json> = names
                    .iter()
                    .zip(row)
                    .map(|(n, v)| (n.to_string(), cell_json(v)))
                    .collect();
                Json::Object(obj)
            })
            .collect(),
    )
}

fn value_json(value: &AnalysisValue) -> Json {
    match value {
        AnalysisValue::Count(n) => json!(n),
        AnalysisValue::List(values) => Json::Array(values.iter().map(cell_json).collect()),
        AnalysisValue::Table(t) => table_json(t),
    }
}

/// Write `runs` as a pretty JSON array to `path`.
///
/// Written to `.<name>.tmp` next to the target, then renamed over it.
pub fn write_report(path: impl AsRef<Path>, runs: &[AnalysisRun]) -> Result<()> {
    let path = path.as_ref();
    let records: Vec<AnalysisRecord> = runs.iter().map(AnalysisRecord::from).collect();

    // 1) Make sure the parent exists
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir).map_err(|e| AnalyticsError::write(&dir, e))?;

    // 2) Write atomically: to tmp file, then rename over original
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| AnalyticsError::write(path, "report path has no file name"))?;
    let tmp_path = dir.join(format!(".{}.tmp", file_name));
    let mut tmp = fs::File::create(&tmp_path).map_err(|e| AnalyticsError::write(&tmp_path, e))?;

    // pretty-print with a trailing newline
    serde_json::to_writer_pretty(&mut tmp, &records).map_err(|e| AnalyticsError::write(path, e))?;
    tmp.write_all(b"\n")
        .map_err(|e| AnalyticsError::write(&tmp_path, e))?;

    fs::rename(&tmp_path, path).map_err(|e| AnalyticsError::write(path, e))?;
    Ok(())
}
