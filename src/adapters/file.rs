//! File adapter: import and export of nomogram documents.
//!
//! Exports are written atomically (temp file + rename) so a crash never
//! leaves a truncated `nomogram-data.json` behind.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::domain::NomogramRecord;

/// File name of exported documents.
pub const EXPORT_FILE_NAME: &str = "nomogram-data.json";

/// Read a file as text.
///
/// Parsing is left to the caller so a malformed document can be rejected
/// before any state is touched.
///
/// # Errors
/// Returns `NomogramError::Io` if the file cannot be read.
pub fn read_document(path: &Path) -> crate::Result<String> {
    let text = fs::read_to_string(path)?;
    tracing::debug!("Read {} bytes from {:?}", text.len(), path);
    Ok(text)
}

/// Write an export document into `dir` as [`EXPORT_FILE_NAME`].
///
/// # Errors
/// Returns error if serialization or any filesystem step fails.
pub fn write_export(dir: &Path, record: &NomogramRecord) -> crate::Result<PathBuf> {
    let json = record.to_json_pretty()?;

    fs::create_dir_all(dir)?;
    let target = dir.join(EXPORT_FILE_NAME);
    let tmp = dir.join(format!(".{EXPORT_FILE_NAME}.tmp"));

    let write_result = write_synced(&tmp, json.as_bytes());
    if let Err(err) = write_result {
        let _ = fs::remove_file(&tmp);
        return Err(err.into());
    }

    fs::rename(&tmp, &target).inspect_err(|_| {
        let _ = fs::remove_file(&tmp);
    })?;

    tracing::info!("Exported nomogram document to {:?}", target);
    Ok(target)
}

fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}
