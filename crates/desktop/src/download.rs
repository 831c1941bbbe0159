//! Saving committed export files.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ExportError;

/// Name used when the server does not suggest one.
pub const DEFAULT_FILE_NAME: &str = "orders.csv";

/// Extract the quoted `filename="..."` from a Content-Disposition value.
pub fn file_name_from_disposition(value: Option<&str>) -> String {
    value
        .and_then(|v| {
            let start = v.find("filename=\"")? + "filename=\"".len();
            let rest = &v[start..];
            let end = rest.rfind('"')?;
            Some(&rest[..end])
        })
        .filter(|name| !name.is_empty())
        .map_or_else(|| DEFAULT_FILE_NAME.to_string(), str::to_string)
}

/// Destination for committed export bodies.
pub trait FileSink: Send + Sync {
    /// Persist `body` under `file_name` and return where it landed.
    fn save(&self, file_name: &str, body: &[u8]) -> Result<PathBuf, ExportError>;
}

/// Writes files into one directory, never outside it.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl FileSink for DirectorySink {
    fn save(&self, file_name: &str, body: &[u8]) -> Result<PathBuf, ExportError> {
        let name = sanitize_file_name(file_name);
        let save_err = |e: std::io::Error| ExportError::Save {
            file_name: name.clone(),
            reason: e.to_string(),
        };

        fs::create_dir_all(&self.dir).map_err(save_err)?;
        let path = self.dir.join(&name);
        fs::write(&path, body).map_err(save_err)?;

        tracing::info!(path = %path.display(), bytes = body.len(), "export file saved");
        Ok(path)
    }
}

/// Keep only the last path component and drop characters that are unsafe in
/// file names on common platforms.
fn sanitize_file_name(raw: &str) -> String {
    let last = raw.rsplit(['/', '\\']).next().unwrap_or(raw);
    let cleaned: String = last
        .chars()
        .filter(|c| !c.is_control() && !matches!(c, ':' | '*' | '?' | '"' | '<' | '>' | '|'))
        .collect();
    let cleaned = cleaned.trim().trim_start_matches('.');
    if cleaned.is_empty() {
        DEFAULT_FILE_NAME.to_string()
    } else {
        cleaned.to_string()
    }
}
