//! Client configuration.

use std::path::PathBuf;

pub const DEFAULT_API_URL: &str = "http://localhost:8080";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_url: String,
    /// Forwarded as a bearer token when set.
    pub auth_token: Option<String>,
    /// Where committed export files are written.
    pub out_dir: PathBuf,
}

impl ClientConfig {
    pub fn new(api_url: Option<String>, auth_token: Option<String>, out_dir: Option<PathBuf>) -> Self {
        Self {
            api_url: api_url
                .filter(|u| !u.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            auth_token: auth_token.filter(|t| !t.trim().is_empty()),
            out_dir: out_dir.unwrap_or_else(default_out_dir),
        }
    }
}

/// The user's download directory, or the working directory when there is none.
pub fn default_out_dir() -> PathBuf {
    dirs::download_dir().unwrap_or_else(|| PathBuf::from("."))
}
