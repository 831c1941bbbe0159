//! Operator-facing notifications.

/// Receives one message per finished action.
pub trait Notifier: Send + Sync {
    fn success(&self, message: &str);
    fn error(&self, message: &str);
}

/// Prints to the terminal and mirrors the message into the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn success(&self, message: &str) {
        tracing::info!(notice = message, "export action succeeded");
        println!("{message}");
    }

    fn error(&self, message: &str) {
        tracing::warn!(notice = message, "export action failed");
        eprintln!("error: {message}");
    }
}
