use arrow::{
    array::{Array, StringArray},
    csv::ReaderBuilder as ArrowCsvReaderBuilder,
};
use csv::ReaderBuilder;
use glob::glob;
use std::{
    fs::File,
    path::{Path, PathBuf},
};
use tracing::{debug, info, warn};

use crate::{
    error::{AnalyticsError, Result},
    schema::{utf8_schema, Dataset},
    table::{Column, ColumnType, Row, Schema, Table, Value},
};

const BATCH_SIZE: usize = 8_192;

/// Load one base dataset from a CSV file, or from every `*.csv` part inside a
/// directory (parts are read in file-name order and must share a header).
///
/// Column types come from the dataset's declarations; undeclared columns are
/// text. Empty cells are null, and so are cells that do not parse as their
/// column's numeric type (counted and reported once per column).
pub fn load_dataset(dataset: Dataset, path: impl AsRef<Path>) -> Result<Table> {
    let path = path.as_ref();

    // 1) Resolve the file list
    let files = resolve_files(path)?;

    // 2) Header from the first part; later parts must agree
    let header = read_header(&files[0])?;
    let columns = dataset.columns_for(&header);
    let mut stats = vec![0usize; columns.len()];
    let mut rows: Vec<Row> = Vec::new();

    for file in &files {
        let part_header = read_header(file)?;
        if part_header != header {
            let column = part_header
                .iter()
                .zip(&header)
                .find(|(a, b)| a != b)
                .map(|(a, _)| a.clone())
                .unwrap_or_else(|| format!("#{}", part_header.len().min(header.len())));
            return Err(AnalyticsError::SchemaMismatch {
                table: dataset.key().to_string(),
                column,
            });
        }

        // 3) Text batches through the Arrow CSV reader, then typed cells
        let before = rows.len();
        read_part(file, &header, &columns, &mut stats, &mut rows)?;
        debug!(dataset = %dataset, file = %file.display(), rows = rows.len() - before, "read part");
    }

    for (col, bad) in columns.iter().zip(&stats) {
        if *bad > 0 {
            warn!(
                dataset = %dataset,
                column = %col.name,
                expected = %col.ty,
                cells = bad,
                "unparsable cells loaded as null"
            );
        }
    }

    info!(
        dataset = %dataset,
        path = %path.display(),
        rows = rows.len(),
        columns = columns.len(),
        "loaded dataset"
    );
    Table::new(dataset.key(), Schema::new(columns), rows)
}

fn resolve_files(path: &Path) -> Result<Vec<PathBuf>> {
    if !path.exists() {
        return Err(AnalyticsError::FileNotFound(path.to_path_buf()));
    }
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }

    let pattern = path.join("*.csv");
    let pattern = pattern.to_string_lossy();
    let mut files: Vec<PathBuf> = glob(&pattern)
        .map_err(|e| AnalyticsError::read(path, e))?
        .filter_map(|entry| match entry {
            Ok(p) => Some(p),
            Err(e) => {
                warn!("Skipping unreadable entry under {:?}: {}", path, e);
                None
            }
        })
        .collect();
    files.sort();

    if files.is_empty() {
        return Err(AnalyticsError::FileNotFound(path.join("*.csv")));
    }
    Ok(files)
}

fn read_header(file: &Path) -> Result<Vec<String>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .from_path(file)
        .map_err(|e| AnalyticsError::read(file, e))?;
    let header = rdr
        .headers()
        .map_err(|e| AnalyticsError::read(file, e))?
        .iter()
        .map(|h| h.trim().trim_start_matches('\u{feff}').to_string())
        .collect::<Vec<_>>();
    if header.is_empty() || header.iter().all(String::is_empty) {
        return Err(AnalyticsError::read(file, "missing header row"));
    }
    Ok(header)
}

fn read_part(
    file: &Path,
    header: &[String],
    columns: &[Column],
    stats: &mut [usize],
    rows: &mut Vec<Row>,
) -> Result<()> {
    let handle = File::open(file).map_err(|e| AnalyticsError::read(file, e))?;
    let reader = ArrowCsvReaderBuilder::new(utf8_schema(header))
        .with_header(true)
        .with_truncated_rows(true)
        .with_batch_size(BATCH_SIZE)
        .build(handle)
        .map_err(|e| AnalyticsError::read(file, e))?;

    for batch in reader {
        let batch = batch.map_err(|e| AnalyticsError::read(file, e))?;
        let arrays = batch
            .columns()
            .iter()
            .map(|a| {
                a.as_any()
                    .downcast_ref::<StringArray>()
                    .ok_or_else(|| AnalyticsError::read(file, "expected a text column"))
            })
            .collect::<Result<Vec<_>>>()?;

        rows.reserve(batch.num_rows());
        for r in 0..batch.num_rows() {
            let row: Row = arrays
                .iter()
                .zip(columns)
                .zip(stats.iter_mut())
                .map(|((array, col), bad)| {
                    let cell = if array.is_null(r) { None } else { Some(array.value(r)) };
                    let (value, parsed) = parse_cell(cell, col.ty);
                    if !parsed {
                        *bad += 1;
                    }
                    value
                })
                .collect();
            rows.push(row);
        }
    }
    Ok(())
}

/// Typed value of one CSV cell. The flag is false when a non-empty cell did
/// not parse as `ty` and was replaced by null.
fn parse_cell(cell: Option<&str>, ty: ColumnType) -> (Value, bool) {
    let text = match cell {
        Some(s) if !s.is_empty() => s,
        _ => return (Value::Null, true),
    };
    let parsed = match ty {
        ColumnType::String | ColumnType::Categorical => Some(Value::Str(text.to_string())),
        ColumnType::Integer => text.trim().parse().ok().map(Value::Int),
        ColumnType::Decimal => text.trim().parse().ok().map(Value::Decimal),
        ColumnType::Boolean => match text.trim().to_ascii_lowercase().as_str() {
            "true" => Some(Value::Bool(true)),
            "false" => Some(Value::Bool(false)),
            _ => None,
        },
    };
    match parsed {
        Some(v) => (v, true),
        None => (Value::Null, false),
    }
}
