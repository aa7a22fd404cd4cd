//! Command-line interface definitions for arxiv_notify.
//!
//! Search settings live in the YAML config file; the CLI only chooses the
//! file, where to keep a copy of the report, and whether to deliver it.

use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments.
///
/// # Examples
///
/// ```sh
/// # Fetch, build and deliver the report
/// arxiv_notify -c ./arxiv_notify.yaml
///
/// # Build the report and keep a copy, without sending it
/// arxiv_notify --dry-run -o ./reports
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to the YAML configuration file
    #[arg(short, long, env = "ARXIV_NOTIFY_CONFIG", default_value = "arxiv_notify.yaml")]
    pub config: PathBuf,

    /// Directory where the HTML report and JSON snapshot are written
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Build the report without delivering it
    #[arg(long)]
    pub dry_run: bool,

    /// Telegram bot token (overrides the config file)
    #[arg(long, env = "TELEGRAM_BOT_TOKEN", hide_env_values = true)]
    pub telegram_bot_token: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from([
            "arxiv_notify",
            "--config",
            "/etc/arxiv_notify.yaml",
            "--output-dir",
            "./reports",
            "--dry-run",
        ]);

        assert_eq!(cli.config, PathBuf::from("/etc/arxiv_notify.yaml"));
        assert_eq!(cli.output_dir, Some(PathBuf::from("./reports")));
        assert!(cli.dry_run);
    }

    #[test]
    fn test_cli_short_flags() {
        let cli = Cli::parse_from(["arxiv_notify", "-c", "a.yaml", "-o", "/tmp/out"]);

        assert_eq!(cli.config, PathBuf::from("a.yaml"));
        assert_eq!(cli.output_dir, Some(PathBuf::from("/tmp/out")));
        assert!(!cli.dry_run);
    }

    #[test]
    fn test_cli_token_flag() {
        let cli = Cli::parse_from(["arxiv_notify", "-c", "a.yaml", "--telegram-bot-token", "123:abc"]);
        assert_eq!(cli.telegram_bot_token.as_deref(), Some("123:abc"));
    }
}
