use thiserror::Error;

/// Outcome of a failed preview or commit.
///
/// `Display` is the message shown to the operator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExportError {
    /// Input rejected before any request was sent.
    #[error("{0}")]
    Validation(String),

    /// Commit selected no rows.
    #[error("no data to export in the selected range")]
    NoData,

    /// The server answered with a non-success status.
    #[error("{message}")]
    Request { status: u16, message: String },

    /// Transport or decoding failure.
    #[error("{message}")]
    Unexpected { message: String },

    /// The same action is already running.
    #[error("{action} is already in progress")]
    Busy { action: &'static str },

    /// The export was committed but the file could not be written.
    #[error("export committed but saving {file_name} failed: {reason}")]
    Save { file_name: String, reason: String },
}

impl ExportError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn unexpected(msg: impl Into<String>) -> Self {
        Self::Unexpected { message: msg.into() }
    }
}
