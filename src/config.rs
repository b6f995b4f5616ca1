//! Job configuration: where the base datasets live and where each answer goes.

use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use crate::{
    analysis::Analysis,
    error::{AnalyticsError, Result},
    io::OutputFormat,
    schema::Dataset,
};

pub const DEFAULT_CONFIG_PATH: &str = "./configs/config.json";

/// ```json
/// {
///   "input_file_path":  { "Charges": "Data/Charges_use.csv", ... },
///   "output_file_path": { "Analysis_1": "Output/Analysis_1", ... },
///   "output_format": "csv",
///   "parallel": false,
///   "report_path": "Output/run_report.json"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Dataset key (`Charges`, `Primary_Person`, ...) → CSV file or directory.
    #[serde(alias = "input_file_path")]
    pub input_paths: BTreeMap<String, String>,

    /// Analysis name (`Analysis_1` ... `Analysis_8`) → output directory.
    #[serde(alias = "output_file_path")]
    pub output_paths: BTreeMap<String, String>,

    #[serde(default)]
    pub output_format: OutputFormat,

    /// Run the selected analyses concurrently.
    #[serde(default)]
    pub parallel: bool,

    #[serde(default)]
    pub report_path: Option<String>,
}

impl AppConfig {
    /// Read a JSON config, or YAML when the file ends in `.yaml` / `.yml`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(AnalyticsError::FileNotFound(path.to_path_buf()));
        }
        let text = fs::read_to_string(path).map_err(|e| AnalyticsError::read(path, e))?;
        let is_yaml = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml") | Some("yml")
        );
        let config = if is_yaml {
            serde_yaml::from_str(&text)
                .map_err(|e| AnalyticsError::Config(format!("{}: {}", path.display(), e)))?
        } else {
            serde_json::from_str(&text)
                .map_err(|e| AnalyticsError::Config(format!("{}: {}", path.display(), e)))?
        };
        Ok(config)
    }

    /// Every base dataset needs an input, every selected analysis an output.
    pub fn validate(&self, selected: &[Analysis]) -> Result<()> {
        for dataset in Dataset::ALL {
            if !self.input_paths.contains_key(dataset.key()) {
                return Err(AnalyticsError::MissingDataset(dataset.key().to_string()));
            }
        }
        for analysis in selected {
            if !self.output_paths.contains_key(analysis.name()) {
                return Err(AnalyticsError::MissingOutput(analysis.name().to_string()));
            }
        }
        Ok(())
    }

    pub fn input_path(&self, dataset: Dataset) -> Result<PathBuf> {
        self.input_paths
            .get(dataset.key())
            .map(PathBuf::from)
            .ok_or_else(|| AnalyticsError::MissingDataset(dataset.key().to_string()))
    }

    pub fn output_path(&self, analysis: Analysis) -> Result<PathBuf> {
        self.output_paths
            .get(analysis.name())
            .map(PathBuf::from)
            .ok_or_else(|| AnalyticsError::MissingOutput(analysis.name().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const JOB_CONFIG: &str = r#"{
        "input_file_path": {
            "Charges": "Data/Charges_use.csv",
            "Damages": "Data/Damages_use.csv",
            "Endorse": "Data/Endorse_use.csv",
            "Primary_Person": "Data/Primary_Person_use.csv",
            "Units": "Data/Units_use.csv",
            "Restrict": "Data/Restrict_use.csv"
        },
        "output_file_path": {
            "Analysis_1": "Output/Analysis_1",
            "Analysis_2": "Output/Analysis_2"
        }
    }"#;

    #[test]
    fn reads_the_job_layout_with_defaults() -> Result<()> {
        let mut file = NamedTempFile::with_suffix(".json")?;
        file.write_all(JOB_CONFIG.as_bytes())?;

        let config = AppConfig::load(file.path())?;
        assert_eq!(config.input_paths.len(), 6);
        assert_eq!(config.output_format, OutputFormat::Csv);
        assert!(!config.parallel);
        assert_eq!(config.report_path, None);
        assert_eq!(
            config.input_path(Dataset::PrimaryPerson)?,
            PathBuf::from("Data/Primary_Person_use.csv")
        );
        Ok(())
    }

    #[test]
    fn yaml_files_use_the_yaml_reader() -> Result<()> {
        let mut file = NamedTempFile::with_suffix(".yaml")?;
        file.write_all(
            b"input_paths:\n  Units: u.csv\noutput_paths:\n  Analysis_2: out/a2\noutput_format: parquet\nparallel: true\n",
        )?;
        let config = AppConfig::load(file.path())?;
        assert_eq!(config.output_format, OutputFormat::Parquet);
        assert!(config.parallel);
        assert_eq!(config.output_path(Analysis::TwoWheelerCount)?, PathBuf::from("out/a2"));
        Ok(())
    }

    #[test]
    fn validate_names_the_missing_entry() -> Result<()> {
        let config: AppConfig = serde_json::from_str(JOB_CONFIG)?;
        config.validate(&[Analysis::MaleCrashCount, Analysis::TwoWheelerCount])?;
        assert!(matches!(
            config.validate(&Analysis::ALL),
            Err(AnalyticsError::MissingOutput(ref name)) if name == "Analysis_3"
        ));

        let mut partial = config.clone();
        partial.input_paths.remove("Restrict");
        assert!(matches!(
            partial.validate(&[]),
            Err(AnalyticsError::MissingDataset(ref name)) if name == "Restrict"
        ));
        Ok(())
    }

    #[test]
    fn malformed_file_is_a_config_error() -> Result<()> {
        let mut file = NamedTempFile::with_suffix(".json")?;
        file.write_all(b"{ not json")?;
        assert!(matches!(
            AppConfig::load(file.path()),
            Err(AnalyticsError::Config(_))
        ));
        Ok(())
    }
}
