use anyhow::{Context, Result};
use atomic_write_file::AtomicWriteFile;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;

/// JSON envelope for every machine-readable result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report<T> {
    pub generated_at: DateTime<Utc>,
    pub data: T,
}

impl<T> Report<T> {
    pub fn new(data: T) -> Self {
        Self {
            generated_at: Utc::now(),
            data,
        }
    }
}

/// Serialize `data` inside a [`Report`] envelope as pretty JSON
pub fn to_report_json<T: Serialize>(data: &T) -> Result<String> {
    serde_json::to_string_pretty(&Report::new(data)).context("Failed to serialize report")
}

/// Write text to `path` atomically, or to stdout when no path is given.
///
/// Uses atomic-write-file so the target is never left half-written.
pub fn write_output(path: Option<&Path>, text: &str) -> Result<()> {
    match path {
        Some(path) => {
            let mut file = AtomicWriteFile::open(path)
                .with_context(|| format!("Failed to open atomic write file at {}", path.display()))?;
            file.write_all(text.as_bytes())
                .with_context(|| format!("Failed to write {}", path.display()))?;
            file.write_all(b"\n")
                .with_context(|| format!("Failed to write {}", path.display()))?;
            file.commit()
                .with_context(|| format!("Failed to save output to {}", path.display()))?;
            log::debug!("Wrote output to {}", path.display());
        }
        None => println!("{}", text),
    }
    Ok(())
}
