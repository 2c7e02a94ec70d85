//! Open-issue retrieval from a Jira-style tracker.

use async_trait::async_trait;
use http::StatusCode;
use log::debug;
use miette::Diagnostic;
use reqwest::Client;
use serde::Deserialize;

use crate::credentials::{CredentialStore, StoreError, TRACKER_TOKEN};
use crate::report::Issue;

/// Fields requested from the search endpoint, nothing more comes back.
const REQUESTED_FIELDS: &str = "key,summary,status";

/// The filter for one search: a project key and a status label.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct IssueQuery {
    pub(crate) project: String,
    pub(crate) status: String,
}

#[async_trait]
pub(crate) trait IssueSource {
    async fn fetch_open_issues(&self, query: &IssueQuery) -> Result<Vec<Issue>, Error>;
}

pub(crate) struct JiraClient<'a, S> {
    http: &'a Client,
    base_url: String,
    store: &'a S,
}

impl<'a, S: CredentialStore + Sync> JiraClient<'a, S> {
    pub(crate) fn new(http: &'a Client, base_url: String, store: &'a S) -> Self {
        Self {
            http,
            base_url,
            store,
        }
    }
}

#[async_trait]
impl<S: CredentialStore + Sync> IssueSource for JiraClient<'_, S> {
    async fn fetch_open_issues(&self, query: &IssueQuery) -> Result<Vec<Issue>, Error> {
        let token = self
            .store
            .get(TRACKER_TOKEN)?
            .ok_or(Error::MissingCredential)?;
        let jql = build_jql(query);
        let url = format!("{}/rest/api/3/search", self.base_url);
        debug!("Searching {url} with {jql}");
        let response = self
            .http
            .get(&url)
            .bearer_auth(&token)
            .query(&[("jql", jql.as_str()), ("fields", REQUESTED_FIELDS)])
            .send()
            .await
            .map_err(|source| Error::Request {
                activity: "searching for issues",
                source: Box::new(source),
            })?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|source| Error::Request {
            activity: "reading the search response",
            source: Box::new(source),
        })?;
        // Only the first page the upstream returns is used, no pagination.
        parse_search_response(status, &body)
    }
}

fn build_jql(query: &IssueQuery) -> String {
    format!(
        "project = {} AND status = \"{}\"",
        query.project, query.status
    )
}

fn parse_search_response(status: u16, body: &str) -> Result<Vec<Issue>, Error> {
    let success = StatusCode::from_u16(status).map_or(false, |status| status.is_success());
    if !success {
        return Err(Error::Api {
            status,
            body: body.to_string(),
        });
    }
    let response: SearchResponse = serde_json::from_str(body).map_err(|source| Error::Decode {
        source,
        body: body.to_string(),
    })?;
    Ok(response
        .issues
        .into_iter()
        .map(|issue| Issue {
            key: issue.key,
            summary: issue.fields.summary,
            status: issue.fields.status.name,
        })
        .collect())
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    issues: Vec<JiraIssue>,
}

#[derive(Debug, Deserialize)]
struct JiraIssue {
    key: String,
    fields: IssueFields,
}

#[derive(Debug, Deserialize)]
struct IssueFields {
    summary: String,
    status: IssueStatus,
}

#[derive(Debug, Deserialize)]
struct IssueStatus {
    name: String,
}

#[derive(Debug, Diagnostic, thiserror::Error)]
pub(crate) enum Error {
    #[error("No tracker token is stored")]
    #[diagnostic(
        code(tracker::missing_credential),
        help("Run standup --set-jira-token to store one.")
    )]
    MissingCredential,
    #[error(transparent)]
    #[diagnostic(transparent)]
    Store(#[from] StoreError),
    #[error("Trouble communicating with the tracker while {activity}: {source}")]
    #[diagnostic(
        code(tracker::api_request_error),
        help("This may be a network issue or a permissions issue.")
    )]
    Request {
        activity: &'static str,
        #[source]
        source: Box<reqwest::Error>,
    },
    #[error("The tracker responded with status {status}: {body}")]
    #[diagnostic(
        code(tracker::api_response_error),
        help("Check that the configured Jira URL and project are correct and the token is valid.")
    )]
    Api { status: u16, body: String },
    #[error("Could not decode the tracker search response: {source}")]
    #[diagnostic(code(tracker::decode_error))]
    Decode {
        #[source]
        source: serde_json::Error,
        body: String,
    },
}
