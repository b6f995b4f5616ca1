//! The eight crash analyses and the driver that runs them.
//!
//! Every analysis is a pipeline over the immutable base tables held by
//! [`Datasets`]. A pipeline produces the value that is printed and the table
//! that is written to its output directory. Pipelines share nothing mutable,
//! so they can run one after another or side by side on the rayon pool; the
//! only shared resource is the [`Sink`], which serialises writes per
//! destination.

pub mod pipelines;

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use std::{
    collections::BTreeMap,
    fmt,
    path::PathBuf,
    str::FromStr,
    time::Instant,
};
use tracing::{error, info, info_span, warn};

use crate::{
    config::AppConfig,
    error::{AnalyticsError, Result},
    io::{load_dataset, Sink},
    schema::Dataset,
    table::{Table, Value},
};

/// One of the eight questions asked of the crash data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Analysis {
    MaleCrashCount,
    TwoWheelerCount,
    TopFemaleState,
    TopMakesByCasualties,
    TopEthnicityPerBodyStyle,
    TopAlcoholZipCodes,
    InsuredHighDamageCrashes,
    TopSpeedingMakes,
}

impl Analysis {
    pub const ALL: [Analysis; 8] = [
        Analysis::MaleCrashCount,
        Analysis::TwoWheelerCount,
        Analysis::TopFemaleState,
        Analysis::TopMakesByCasualties,
        Analysis::TopEthnicityPerBodyStyle,
        Analysis::TopAlcoholZipCodes,
        Analysis::InsuredHighDamageCrashes,
        Analysis::TopSpeedingMakes,
    ];

    /// 1-based position, also the print order.
    pub fn number(self) -> usize {
        match self {
            Analysis::MaleCrashCount => 1,
            Analysis::TwoWheelerCount => 2,
            Analysis::TopFemaleState => 3,
            Analysis::TopMakesByCasualties => 4,
            Analysis::TopEthnicityPerBodyStyle => 5,
            Analysis::TopAlcoholZipCodes => 6,
            Analysis::InsuredHighDamageCrashes => 7,
            Analysis::TopSpeedingMakes => 8,
        }
    }

    /// Configuration key of the analysis output (`Analysis_N`).
    pub fn name(self) -> &'static str {
        match self {
            Analysis::MaleCrashCount => "Analysis_1",
            Analysis::TwoWheelerCount => "Analysis_2",
            Analysis::TopFemaleState => "Analysis_3",
            Analysis::TopMakesByCasualties => "Analysis_4",
            Analysis::TopEthnicityPerBodyStyle => "Analysis_5",
            Analysis::TopAlcoholZipCodes => "Analysis_6",
            Analysis::InsuredHighDamageCrashes => "Analysis_7",
            Analysis::TopSpeedingMakes => "Analysis_8",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Analysis::MaleCrashCount => "person records with a male gender",
            Analysis::TwoWheelerCount => "units with a motorcycle body style",
            Analysis::TopFemaleState => "driver licence state with the most female person records",
            Analysis::TopMakesByCasualties => "vehicle makes ranked 6th to 15th by injuries plus deaths",
            Analysis::TopEthnicityPerBodyStyle => "most frequent ethnicity for each body style",
            Analysis::TopAlcoholZipCodes => "top 5 driver zip codes of alcohol-related crashes",
            Analysis::InsuredHighDamageCrashes => {
                "insured crashes with damage above level 4 and no damaged property"
            }
            Analysis::TopSpeedingMakes => "top 5 makes among licensed speeding drivers",
        }
    }

    fn pipeline(self) -> fn(&Datasets) -> Result<AnalysisOutcome> {
        match self {
            Analysis::MaleCrashCount => pipelines::male_crash_count,
            Analysis::TwoWheelerCount => pipelines::two_wheeler_count,
            Analysis::TopFemaleState => pipelines::top_female_state,
            Analysis::TopMakesByCasualties => pipelines::top_makes_by_casualties,
            Analysis::TopEthnicityPerBodyStyle => pipelines::top_ethnicity_per_body_style,
            Analysis::TopAlcoholZipCodes => pipelines::top_alcohol_zip_codes,
            Analysis::InsuredHighDamageCrashes => pipelines::insured_high_damage_crashes,
            Analysis::TopSpeedingMakes => pipelines::top_speeding_makes,
        }
    }
}

impl fmt::Display for Analysis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Accepts `Analysis_3` or a bare `3`.
impl FromStr for Analysis {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        Analysis::ALL
            .into_iter()
            .find(|a| a.name().eq_ignore_ascii_case(s) || a.number().to_string() == s)
            .ok_or_else(|| AnalyticsError::Config(format!("unknown analysis `{}`", s)))
    }
}

/// The six base tables, loaded once and shared read-only by every pipeline.
#[derive(Debug, Clone, Default)]
pub struct Datasets {
    tables: BTreeMap<Dataset, Table>,
}

impl Datasets {
    pub fn from_tables(tables: impl IntoIterator<Item = (Dataset, Table)>) -> Self {
        Self {
            tables: tables.into_iter().collect(),
        }
    }

    /// Load every base dataset named in `config`, in parallel.
    pub fn load(config: &AppConfig) -> Result<Self> {
        let start = Instant::now();
        let tables = Dataset::ALL
            .par_iter()
            .map(|&dataset| {
                let path = config.input_path(dataset)?;
                Ok((dataset, load_dataset(dataset, path)?))
            })
            .collect::<Result<Vec<_>>>()?;
        info!(datasets = tables.len(), elapsed = ?start.elapsed(), "loaded base datasets");
        Ok(Self::from_tables(tables))
    }

    pub fn get(&self, dataset: Dataset) -> Result<&Table> {
        self.tables
            .get(&dataset)
            .ok_or_else(|| AnalyticsError::MissingDataset(dataset.key().to_string()))
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

/// The reduced answer of one analysis.
#[derive(Debug, Clone)]
pub enum AnalysisValue {
    Count(u64),
    List(Vec<Value>),
    Table(Table),
}

/// Counts print bare, lists as `["A", "B"]`, tables as aligned rows.
impl fmt::Display for AnalysisValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisValue::Count(n) => write!(f, "{}", n),
            AnalysisValue::List(values) => {
                let items: Vec<String> = values
                    .iter()
                    .map(|v| match v {
                        Value::Str(s) => format!("{:?}", s),
                        other => other.to_string(),
                    })
                    .collect();
                write!(f, "[{}]", items.join(", "))
            }
            AnalysisValue::Table(t) => write!(f, "{}", t),
        }
    }
}

/// What a pipeline hands back: the printed value and the table for the sink.
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub value: AnalysisValue,
    pub output: Table,
}

/// Result of running one analysis end to end, kept even on failure.
#[derive(Debug, Clone)]
pub struct AnalysisRun {
    pub analysis: Analysis,
    /// Present whenever the pipeline itself succeeded, even if the write failed.
    pub value: Option<AnalysisValue>,
    pub rows: Option<u64>,
    pub bytes: Option<u64>,
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl AnalysisRun {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }

    pub fn status(&self) -> &'static str {
        match (&self.value, &self.error) {
            (_, None) => "ok",
            (Some(_), Some(_)) => "write_failed",
            (None, Some(_)) => "failed",
        }
    }

    pub fn elapsed_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}

/// Base tables plus where and how to write each answer.
pub struct EngineContext {
    datasets: Datasets,
    outputs: BTreeMap<Analysis, PathBuf>,
    sink: Sink,
}

impl EngineContext {
    pub fn new(datasets: Datasets, outputs: BTreeMap<Analysis, PathBuf>, sink: Sink) -> Self {
        Self {
            datasets,
            outputs,
            sink,
        }
    }

    /// Validate `config` for `selected`, then load the base datasets.
    pub fn from_config(config: &AppConfig, selected: &[Analysis]) -> Result<Self> {
        config.validate(selected)?;
        let outputs = selected
            .iter()
            .map(|&a| Ok((a, config.output_path(a)?)))
            .collect::<Result<BTreeMap<_, _>>>()?;
        let datasets = Datasets::load(config)?;
        Ok(Self::new(datasets, outputs, Sink::new(config.output_format)))
    }

    pub fn datasets(&self) -> &Datasets {
        &self.datasets
    }

    /// Run one analysis and write its output. Never fails: errors are
    /// captured in the returned run.
    pub fn run(&self, analysis: Analysis) -> AnalysisRun {
        let span = info_span!("analysis", name = analysis.name());
        let _enter = span.enter();
        let started_at = Utc::now();
        let start = Instant::now();

        let mut run = AnalysisRun {
            analysis,
            value: None,
            rows: None,
            bytes: None,
            error: None,
            started_at,
            finished_at: started_at,
        };

        match (analysis.pipeline())(&self.datasets) {
            Ok(outcome) => {
                run.rows = Some(outcome.output.num_rows() as u64);
                run.value = Some(outcome.value);
                match self.write(analysis, &outcome.output) {
                    Ok(bytes) => run.bytes = Some(bytes),
                    Err(e) => {
                        error!(error = %e, "writing output failed");
                        run.error = Some(error_chain(&e));
                    }
                }
            }
            Err(e) => {
                error!(error = %e, "pipeline failed");
                run.error = Some(error_chain(&e));
            }
        }

        run.finished_at = Utc::now();
        info!(
            status = run.status(),
            rows = ?run.rows,
            elapsed = ?start.elapsed(),
            "finished"
        );
        run
    }

    fn write(&self, analysis: Analysis, table: &Table) -> Result<u64> {
        let destination = self
            .outputs
            .get(&analysis)
            .ok_or_else(|| AnalyticsError::MissingOutput(analysis.name().to_string()))?;
        self.sink.write(table, destination)
    }
}

/// Run `selected` and return their runs in analysis order, whatever order
/// they finished in.
pub fn run_analyses(ctx: &EngineContext, selected: &[Analysis], parallel: bool) -> Vec<AnalysisRun> {
    let mut selected = selected.to_vec();
    selected.sort();
    selected.dedup();

    let runs: Vec<AnalysisRun> = if parallel {
        selected.par_iter().map(|&a| ctx.run(a)).collect()
    } else {
        selected.iter().map(|&a| ctx.run(a)).collect()
    };

    let failed = runs.iter().filter(|r| !r.succeeded()).count();
    if failed > 0 {
        warn!(failed, of = runs.len(), "some analyses failed");
    }
    runs
}

fn error_chain(err: &AnalyticsError) -> String {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
