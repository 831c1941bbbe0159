//! Command-line interface for `opsdesk-export`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::config::{ClientConfig, DEFAULT_API_URL};
use crate::types::StatusOption;

/// Preview and export order lines as CSV.
#[derive(Parser, Debug)]
#[command(name = "opsdesk-export")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Base URL of the opsdesk API
    #[arg(long, env = "OPSDESK_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Bearer token forwarded to the API
    #[arg(long, env = "OPSDESK_AUTH_TOKEN", hide_env_values = true)]
    pub auth_token: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Count the order lines that would be exported
    Preview(FilterArgs),

    /// Export the order lines and mark their orders as exported
    Commit(CommitArgs),
}

#[derive(Args, Debug, Clone)]
pub struct FilterArgs {
    /// First order date (YYYY-MM-DD); defaults to the first of this month
    #[arg(long)]
    pub start: Option<String>,

    /// Last order date (YYYY-MM-DD); defaults to today
    #[arg(long)]
    pub end: Option<String>,

    #[arg(long, value_enum, default_value_t = StatusArg::NotExported)]
    pub status: StatusArg,
}

#[derive(Args, Debug, Clone)]
pub struct CommitArgs {
    #[command(flatten)]
    pub filter: FilterArgs,

    /// Directory for the exported file; defaults to the download directory
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// Run a preview first and skip the export when it finds nothing
    #[arg(long)]
    pub check_first: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusArg {
    NotExported,
    All,
    Exported,
}

impl From<StatusArg> for StatusOption {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::NotExported => StatusOption::NotExported,
            StatusArg::All => StatusOption::All,
            StatusArg::Exported => StatusOption::Exported,
        }
    }
}

impl Cli {
    pub fn filter(&self) -> &FilterArgs {
        match &self.command {
            Commands::Preview(filter) => filter,
            Commands::Commit(args) => &args.filter,
        }
    }

    pub fn client_config(&self) -> ClientConfig {
        let out_dir = match &self.command {
            Commands::Commit(args) => args.out_dir.clone(),
            Commands::Preview(_) => None,
        };
        ClientConfig::new(Some(self.api_url.clone()), self.auth_token.clone(), out_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_defaults_to_not_exported() {
        let cli = Cli::parse_from(["opsdesk-export", "preview"]);
        assert!(matches!(cli.command, Commands::Preview(_)));
        assert_eq!(cli.filter().status, StatusArg::NotExported);
        assert_eq!(cli.filter().start, None);
    }

    #[test]
    fn commit_accepts_range_status_and_out_dir() {
        let cli = Cli::parse_from([
            "opsdesk-export",
            "--api-url",
            "http://ops:9000",
            "commit",
            "--start",
            "2024-06-01",
            "--end",
            "2024-06-30",
            "--status",
            "all",
            "--out-dir",
            "/tmp/exports",
            "--check-first",
        ]);
        let Commands::Commit(args) = &cli.command else {
            panic!("expected commit");
        };
        assert!(args.check_first);
        assert_eq!(args.filter.start.as_deref(), Some("2024-06-01"));
        assert_eq!(StatusOption::from(args.filter.status), StatusOption::All);

        let cfg = cli.client_config();
        assert_eq!(cfg.api_url, "http://ops:9000");
        assert_eq!(cfg.out_dir, PathBuf::from("/tmp/exports"));
    }

    #[test]
    fn unknown_status_is_rejected() {
        assert!(Cli::try_parse_from(["opsdesk-export", "preview", "--status", "pending"]).is_err());
    }
}
