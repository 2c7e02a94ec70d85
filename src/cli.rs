use clap::Parser;

/// Gather your open Jira issues and GitHub pull requests into one report.
#[derive(Debug, Default, Parser)]
#[command(name = "standup", version)]
pub struct Cli {
    /// Repository owner to report on (defaults to the configured one)
    #[arg(long)]
    pub owner: Option<String>,

    /// Repository name to report on (defaults to the configured one)
    #[arg(long)]
    pub repo: Option<String>,

    /// Where to write the report file
    #[arg(long, short)]
    pub output: Option<String>,

    /// Application to open the written report with
    #[arg(long)]
    pub app: Option<String>,

    /// Don't open issues and pull requests in the browser
    #[arg(long)]
    pub no_browser: bool,

    /// Only write the report file: no browser, viewer, or indexing
    #[arg(long)]
    pub summary_only: bool,

    /// Send a plain counts notification instead of the rich summary
    #[arg(long)]
    pub plain_notifications: bool,

    /// Send a test notification and exit
    #[arg(long)]
    pub test_notification: bool,

    /// Write a starter standup.toml and exit
    #[arg(long)]
    pub init: bool,

    /// Prompt for a Jira API token and store it in the OS keyring
    #[arg(long)]
    pub set_jira_token: bool,

    /// Prompt for a GitHub token and store it in the OS keyring
    #[arg(long)]
    pub set_github_token: bool,
}
