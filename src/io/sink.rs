use arrow::csv::WriterBuilder;
use parquet::{arrow::ArrowWriter, basic::Compression, file::properties::WriterProperties};
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    fmt,
    fs::{self, File},
    path::{Path, PathBuf},
    sync::{Arc, Mutex, PoisonError, RwLock},
};
use tracing::{debug, info};

use crate::{
    error::{AnalyticsError, Result},
    schema::to_record_batch,
    table::Table,
};

/// On-disk format of sink output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    Parquet,
}

impl OutputFormat {
    fn part_name(self) -> &'static str {
        match self {
            OutputFormat::Csv => "part-00000.csv",
            OutputFormat::Parquet => "part-00000.parquet",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Parquet => "parquet",
        })
    }
}

/// Writes result tables to destination directories.
///
/// Each destination is a directory holding a single `part-00000.*` file and is
/// replaced as a whole on every write. Writes to the same destination are
/// serialised, each destination locked independently.
pub struct Sink {
    format: OutputFormat,
    /// Map: destination → lock held for the duration of one write
    locks: RwLock<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl Sink {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            locks: RwLock::new(HashMap::new()),
        }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Acquire or insert the per-destination lock.
    fn lock_for(&self, destination: &Path) -> Arc<Mutex<()>> {
        {
            let map_r = self.locks.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(lock) = map_r.get(destination) {
                return Arc::clone(lock);
            }
        }
        let mut map_w = self.locks.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(
            map_w
                .entry(destination.to_path_buf())
                .or_insert_with(|| Arc::new(Mutex::new(()))),
        )
    }

    /// Write `table` to `destination`, replacing whatever was there.
    /// Returns the size in bytes of the written part file.
    pub fn write(&self, table: &Table, destination: impl AsRef<Path>) -> Result<u64> {
        let destination = destination.as_ref();
        let lock = self.lock_for(destination);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        // 1) Fresh temporary sibling directory
        let tmp_dir = tmp_sibling(destination)?;
        if tmp_dir.exists() {
            fs::remove_dir_all(&tmp_dir).map_err(|e| AnalyticsError::write(&tmp_dir, e))?;
        }
        fs::create_dir_all(&tmp_dir).map_err(|e| AnalyticsError::write(&tmp_dir, e))?;

        // 2) Single part file
        let part = tmp_dir.join(self.format.part_name());
        let batch = to_record_batch(table)?;
        let file = File::create(&part).map_err(|e| AnalyticsError::write(&part, e))?;
        match self.format {
            OutputFormat::Csv => {
                let mut writer = WriterBuilder::new().with_header(true).build(file);
                writer
                    .write(&batch)
                    .map_err(|e| AnalyticsError::write(destination, e))?;
            }
            OutputFormat::Parquet => {
                let props = WriterProperties::builder()
                    .set_compression(Compression::SNAPPY)
                    .build();
                let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))
                    .map_err(|e| AnalyticsError::write(destination, e))?;
                writer
                    .write(&batch)
                    .map_err(|e| AnalyticsError::write(destination, e))?;
                writer
                    .close()
                    .map_err(|e| AnalyticsError::write(destination, e))?;
            }
        }
        let bytes = fs::metadata(&part)
            .map_err(|e| AnalyticsError::write(&part, e))?
            .len();

        // 3) Swap into place
        if destination.is_dir() {
            fs::remove_dir_all(destination).map_err(|e| AnalyticsError::write(destination, e))?;
        } else if destination.exists() {
            fs::remove_file(destination).map_err(|e| AnalyticsError::write(destination, e))?;
        }
        fs::rename(&tmp_dir, destination).map_err(|e| AnalyticsError::write(destination, e))?;
        debug!(from = %tmp_dir.display(), to = %destination.display(), "renamed output");

        info!(
            destination = %destination.display(),
            table = table.name(),
            rows = table.num_rows(),
            bytes,
            format = %self.format,
            "wrote output"
        );
        Ok(bytes)
    }
}

/// `<parent>/.<name>.tmp`, creating `<parent>` when needed.
fn tmp_sibling(destination: &Path) -> Result<PathBuf> {
    let name = destination
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| AnalyticsError::write(destination, "destination has no file name"))?;
    let parent = match destination.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent).map_err(|e| AnalyticsError::write(&parent, e))?;
    Ok(parent.join(format!(".{}.tmp", name)))
}
