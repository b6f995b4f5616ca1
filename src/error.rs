use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading, transforming or writing tables.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// A column referenced by an operator or supplied in a row is not part of the table.
    #[error("column `{column}` is not part of table `{table}`")]
    SchemaMismatch { table: String, column: String },

    /// An unqualified column name matches more than one prefixed column after a join.
    #[error("column `{column}` is ambiguous in table `{table}`; qualify it as `<table>.{column}`")]
    AmbiguousColumn { table: String, column: String },

    /// An expression or cell does not fit the type it is used with.
    #[error("type mismatch in {context}: expected {expected}, found {found}")]
    TypeMismatch {
        context: String,
        expected: String,
        found: String,
    },

    #[error("input not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("failed to read {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("failed to write {}", destination.display())]
    Write {
        destination: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("no input path configured for dataset `{0}`")]
    MissingDataset(String),

    #[error("no output path configured for `{0}`")]
    MissingOutput(String),
}

pub type Result<T> = std::result::Result<T, AnalyticsError>;

impl AnalyticsError {
    pub fn type_mismatch(
        context: impl Into<String>,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        Self::TypeMismatch {
            context: context.into(),
            expected: expected.into(),
            found: found.into(),
        }
    }

    pub(crate) fn read(
        path: impl Into<PathBuf>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Read {
            path: path.into(),
            source: source.into(),
        }
    }

    pub(crate) fn write(
        destination: impl Into<PathBuf>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Write {
            destination: destination.into(),
            source: source.into(),
        }
    }
}
