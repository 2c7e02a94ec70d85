//! The run itself: fetch both upstreams, assemble the report, deliver it.

use log::debug;
use miette::Diagnostic;
use time::OffsetDateTime;

use crate::config::RunConfig;
use crate::host::{self, ChangeRequestSource};
use crate::report::{CombinedReport, RepoCoordinates};
use crate::sinks::{self, FileSink, Indexer, Notifier, UrlSink};
use crate::tracker::{self, IssueQuery, IssueSource};

pub(crate) struct Sinks<'a, F, U, N, I> {
    pub(crate) file: &'a F,
    pub(crate) url: &'a U,
    pub(crate) notifier: &'a N,
    pub(crate) indexer: &'a I,
}

#[derive(Debug, Diagnostic, thiserror::Error)]
pub(crate) enum Error {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Tracker(#[from] tracker::Error),
    #[error(transparent)]
    #[diagnostic(transparent)]
    Host(#[from] host::Error),
    #[error(transparent)]
    #[diagnostic(transparent)]
    Deliver(#[from] sinks::Error),
    #[error("Could not serialize the report: {0}")]
    #[diagnostic(code(pipeline::serialize))]
    Serialize(#[from] serde_json::Error),
}

/// Drive one full run. Emits exactly one failure notification on any fatal
/// error and exactly one success notification otherwise.
pub(crate) async fn run<T, C, F, U, N, I>(
    config: &RunConfig,
    issue_source: &T,
    change_request_source: &C,
    sinks: &Sinks<'_, F, U, N, I>,
) -> Result<CombinedReport, Error>
where
    T: IssueSource + Sync,
    C: ChangeRequestSource + Sync,
    F: FileSink,
    U: UrlSink,
    N: Notifier,
    I: Indexer,
{
    sinks.notifier.notify(
        "Standup",
        "Gathering your open issues and pull requests...",
        None,
    );
    match execute(config, issue_source, change_request_source, sinks).await {
        Ok(report) => Ok(report),
        Err(err) => {
            sinks
                .notifier
                .notify("Standup failed", &err.to_string(), Some("error"));
            Err(err)
        }
    }
}

async fn execute<T, C, F, U, N, I>(
    config: &RunConfig,
    issue_source: &T,
    change_request_source: &C,
    sinks: &Sinks<'_, F, U, N, I>,
) -> Result<CombinedReport, Error>
where
    T: IssueSource + Sync,
    C: ChangeRequestSource + Sync,
    F: FileSink,
    U: UrlSink,
    N: Notifier,
    I: Indexer,
{
    let query = IssueQuery {
        project: config.tracker.project.clone(),
        status: config.status.clone(),
    };
    debug!("Fetching issues and pull requests");
    // The two fetches are independent; join them all-or-nothing. The first
    // failure wins and the other in-flight request is dropped.
    let (issues, change_requests) = tokio::try_join!(
        async { issue_source.fetch_open_issues(&query).await.map_err(Error::from) },
        async {
            change_request_source
                .fetch_open_change_requests(&config.owner, &config.repo)
                .await
                .map_err(Error::from)
        },
    )?;

    debug!(
        "Assembling report with {} issues and {} pull requests",
        issues.len(),
        change_requests.len()
    );
    let report = CombinedReport::new(
        OffsetDateTime::now_utc(),
        config.tracker.project.clone(),
        RepoCoordinates {
            owner: config.owner.clone(),
            name: config.repo.clone(),
        },
        issues,
        change_requests,
    );

    deliver(config, &report, sinks)?;
    Ok(report)
}

fn deliver<F, U, N, I>(
    config: &RunConfig,
    report: &CombinedReport,
    sinks: &Sinks<'_, F, U, N, I>,
) -> Result<(), Error>
where
    F: FileSink,
    U: UrlSink,
    N: Notifier,
    I: Indexer,
{
    debug!("Delivering report");
    if config.open_in_browser && !config.summary_only {
        for issue in &report.issues {
            sinks
                .url
                .open(&format!("{}/browse/{}", config.tracker.url, issue.key));
        }
        for change_request in &report.change_requests {
            match &change_request.url {
                Some(url) => sinks.url.open(url),
                None => debug!(
                    "Pull request #{} has no URL, not opening it",
                    change_request.number
                ),
            }
        }
    }

    let rich = config.rich_notifications && !config.summary_only;
    if rich {
        sinks
            .notifier
            .notify("Standup report", &report.summary_text(), None);
    }

    let json = report.to_json()?;
    let written = sinks.file.write(&json, &config.output_path)?;

    if !config.summary_only {
        sinks.url.open_file(&written, config.output_app.as_deref());
        sinks.indexer.index(&written);
    }

    // The rich summary doubles as the success notification; send the plain
    // counts one only when it was suppressed.
    if !rich {
        sinks.notifier.notify(
            "Standup complete",
            &format!(
                "{} open issues and {} open pull requests",
                report.issues.len(),
                report.change_requests.len()
            ),
            None,
        );
    }
    Ok(())
}
