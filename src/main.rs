use anyhow::{bail, Context, Result};
use crash_analytics::{
    analysis::{run_analyses, Analysis, AnalysisValue, EngineContext},
    config::{AppConfig, DEFAULT_CONFIG_PATH},
    report::write_report,
};
use std::{env, time::Instant};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

/// Usage: `crash_analytics [CONFIG] [Analysis_N ...]`
fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();
    info!("startup");

    // ─── 2) arguments ────────────────────────────────────────────────
    let mut args = env::args().skip(1).peekable();
    let config_path = match args.peek() {
        Some(first) if first.parse::<Analysis>().is_err() => args.next().unwrap_or_default(),
        _ => DEFAULT_CONFIG_PATH.to_string(),
    };
    let mut selected = args
        .map(|a| a.parse::<Analysis>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .context("parsing analysis selection")?;
    if selected.is_empty() {
        selected = Analysis::ALL.to_vec();
    }

    // ─── 3) configuration & base datasets ────────────────────────────
    let config = AppConfig::load(&config_path)
        .with_context(|| format!("loading config {}", config_path))?;
    info!(config = %config_path, analyses = selected.len(), parallel = config.parallel, "configured");
    let start = Instant::now();
    let ctx = EngineContext::from_config(&config, &selected).context("preparing datasets")?;

    // ─── 4) run & print in analysis order ────────────────────────────
    let runs = run_analyses(&ctx, &selected, config.parallel);
    for run in &runs {
        match &run.value {
            Some(AnalysisValue::Table(table)) => {
                println!("Analysis {}:", run.analysis.number());
                print!("{}", table);
            }
            Some(value) => println!("Analysis {}: {}", run.analysis.number(), value),
            None => println!("Analysis {}: failed", run.analysis.number()),
        }
    }

    // ─── 5) run report ───────────────────────────────────────────────
    if let Some(report_path) = &config.report_path {
        write_report(report_path, &runs)
            .with_context(|| format!("writing run report {}", report_path))?;
        info!(path = %report_path, "wrote run report");
    }

    let failed: Vec<&str> = runs
        .iter()
        .filter(|r| !r.succeeded())
        .map(|r| r.analysis.name())
        .collect();
    info!(elapsed = ?start.elapsed(), failed = failed.len(), "done");
    if !failed.is_empty() {
        for run in runs.iter().filter(|r| !r.succeeded()) {
            error!(
                analysis = run.analysis.name(),
                error = run.error.as_deref().unwrap_or_default(),
                "analysis failed"
            );
        }
        bail!("{} analyses failed: {}", failed.len(), failed.join(", "));
    }
    Ok(())
}
