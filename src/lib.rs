use log::info;
use miette::{IntoDiagnostic, Result};

pub use crate::cli::Cli;
use crate::config::{Config, Overrides, RunConfig};
use crate::credentials::{CredentialStore, Keychain, HOST_TOKEN, TRACKER_TOKEN};
use crate::sinks::Notifier;

mod cli;
mod config;
mod credentials;
mod host;
mod pipeline;
mod prompt;
mod report;
mod sinks;
mod tracker;

pub fn run(cli: Cli) -> Result<()> {
    if cli.init {
        return config::generate();
    }
    let store = Keychain;
    if cli.set_jira_token {
        return store_token(&store, TRACKER_TOKEN, "Paste your Jira API token");
    }
    if cli.set_github_token {
        return store_token(&store, HOST_TOKEN, "Paste your GitHub token");
    }
    if cli.test_notification {
        sinks::DesktopNotifier.notify("Standup", "Notifications are working.", None);
        return Ok(());
    }

    let config = Config::load()?;
    let run_config = RunConfig::resolve(
        &config,
        &Overrides {
            owner: cli.owner,
            repo: cli.repo,
            output: cli.output,
            app: cli.app,
            no_browser: cli.no_browser,
            summary_only: cli.summary_only,
            plain_notifications: cli.plain_notifications,
        },
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .into_diagnostic()?;
    let http = reqwest::Client::new();
    let issue_source = tracker::JiraClient::new(&http, run_config.tracker.url.clone(), &store);
    let change_request_source = host::GitHubClient::new(&http, config.github.clone(), &store);
    let sinks = pipeline::Sinks {
        file: &sinks::FsSink,
        url: &sinks::SystemOpener,
        notifier: &sinks::DesktopNotifier,
        indexer: &sinks::SpotlightIndexer,
    };

    let report = runtime.block_on(pipeline::run(
        &run_config,
        &issue_source,
        &change_request_source,
        &sinks,
    ))?;
    info!(
        "Reported {} open issues and {} open pull requests",
        report.issues.len(),
        report.change_requests.len()
    );
    Ok(())
}

fn store_token(store: &impl CredentialStore, name: &str, prompt_text: &str) -> Result<()> {
    let token = prompt::get_input(prompt_text)?;
    if store.set(name, &token) {
        println!("Token saved.");
    } else {
        // A failed save never blocks: the run can still be pointed at a
        // working keyring later.
        eprintln!("The token could not be saved, you will need to try again.");
    }
    Ok(())
}
