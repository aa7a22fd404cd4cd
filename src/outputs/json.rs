//! On-disk copies of a run's results.
//!
//! When an output directory is configured, each run leaves two files named
//! after its date:
//!
//! ```text
//! output_dir/
//! ├── 2026-10-18.html   # the delivered document
//! └── 2026-10-18.json   # aggregation snapshot
//! ```
//!
//! A second run on the same day overwrites both.

use crate::aggregate::Aggregation;
use crate::models::Keyword;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::error::Error;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, instrument};

/// Everything a run found, in serializable form.
#[derive(Debug, Serialize)]
pub struct RunSnapshot<'a> {
    pub date: NaiveDate,
    pub generated_at: DateTime<Utc>,
    pub keywords: &'a [Keyword],
    /// Keywords whose pagination ended in a transport or decoding failure.
    pub failed_keywords: Vec<Keyword>,
    pub aggregation: &'a Aggregation,
}

/// Write `snapshot` as pretty-printed JSON.
///
/// # Arguments
///
/// * `snapshot` - The run's aggregation, keywords and failed keywords
/// * `output_dir` - Directory for the file, created if missing
///
/// # Returns
///
/// The path written, or an error if serialization, directory creation or the
/// write itself fails.
///
/// # Output Path
///
/// `{output_dir}/{date}.json`
#[instrument(level = "info", skip_all, fields(output_dir = %output_dir.display()))]
pub async fn write_snapshot(
    snapshot: &RunSnapshot<'_>,
    output_dir: &Path,
) -> Result<PathBuf, Box<dyn Error>> {
    let json = serde_json::to_string_pretty(snapshot)?;
    let path = output_dir.join(format!("{}.json", snapshot.date));
    write_file(&path, json.as_bytes()).await?;
    info!(path = %path.display(), "Wrote JSON snapshot");
    Ok(path)
}

/// Write the rendered document as `{output_dir}/{date}.html`.
#[instrument(level = "info", skip_all, fields(output_dir = %output_dir.display()))]
pub async fn write_document(
    document: &str,
    date: NaiveDate,
    output_dir: &Path,
) -> Result<PathBuf, Box<dyn Error>> {
    let path = output_dir.join(format!("{date}.html"));
    write_file(&path, document.as_bytes()).await?;
    info!(path = %path.display(), bytes = document.len(), "Wrote HTML document");
    Ok(path)
}

async fn write_file(path: &Path, contents: &[u8]) -> Result<(), Box<dyn Error>> {
    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent).await {
            error!(dir = %parent.display(), error = %e, "Failed to create output dir");
            return Err(e.into());
        }
    }
    fs::write(path, contents).await?;
    Ok(())
}
