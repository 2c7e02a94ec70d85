//! Open pull-request retrieval from a GitHub-style code host.

use async_trait::async_trait;
use http::StatusCode;
use log::{debug, info};
use miette::Diagnostic;
use reqwest::Client;
use serde::Deserialize;

use crate::config;
use crate::credentials::{CredentialStore, HOST_TOKEN, StoreError};
use crate::report::ChangeRequest;

const ACCEPT: &str = "application/vnd.github+json";
const API_VERSION: &str = "2022-11-28";
const USER_AGENT: &str = "standup";

#[async_trait]
pub(crate) trait ChangeRequestSource {
    async fn fetch_open_change_requests(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<Vec<ChangeRequest>, Error>;
}

pub(crate) struct GitHubClient<'a, S> {
    http: &'a Client,
    base_url: String,
    fallback: config::GitHub,
    store: &'a S,
}

impl<'a, S: CredentialStore + Sync> GitHubClient<'a, S> {
    pub(crate) fn new(http: &'a Client, fallback: config::GitHub, store: &'a S) -> Self {
        Self {
            http,
            base_url: "https://api.github.com".to_string(),
            fallback,
            store,
        }
    }

    #[cfg(test)]
    fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    /// Empty coordinates fall back to the configured repository. A
    /// convenience default, not an error, so it is logged rather than
    /// rejected.
    fn effective_coords(&self, owner: &str, repo: &str) -> (String, String) {
        let owner = if owner.is_empty() {
            info!(
                "No owner passed, falling back to configured {}",
                self.fallback.owner
            );
            self.fallback.owner.clone()
        } else {
            owner.to_string()
        };
        let repo = if repo.is_empty() {
            info!(
                "No repository passed, falling back to configured {}",
                self.fallback.repo
            );
            self.fallback.repo.clone()
        } else {
            repo.to_string()
        };
        (owner, repo)
    }
}

#[async_trait]
impl<S: CredentialStore + Sync> ChangeRequestSource for GitHubClient<'_, S> {
    async fn fetch_open_change_requests(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<Vec<ChangeRequest>, Error> {
        let (owner, repo) = self.effective_coords(owner, repo);
        let token = self.store.get(HOST_TOKEN)?.ok_or(Error::MissingCredential)?;
        let url = format!("{}/repos/{owner}/{repo}/pulls", self.base_url);
        debug!("Fetching open pull requests from {url}");
        let response = self
            .http
            .get(&url)
            .query(&[("state", "open")])
            .header("Accept", ACCEPT)
            .header("X-GitHub-Api-Version", API_VERSION)
            .header("User-Agent", USER_AGENT)
            .bearer_auth(&token)
            .send()
            .await
            .map_err(|source| Error::Request {
                activity: "fetching open pull requests",
                source: Box::new(source),
            })?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|source| Error::Request {
            activity: "reading the pull request response",
            source: Box::new(source),
        })?;
        // First page only, same policy as the tracker side.
        parse_pulls_response(status, &body)
    }
}

fn parse_pulls_response(status: u16, body: &str) -> Result<Vec<ChangeRequest>, Error> {
    let success = StatusCode::from_u16(status).map_or(false, |status| status.is_success());
    if !success {
        return Err(Error::Api {
            status,
            body: body.to_string(),
        });
    }
    let pulls: Vec<PullRequest> = serde_json::from_str(body).map_err(|source| Error::Decode {
        source,
        body: body.to_string(),
    })?;
    Ok(pulls
        .into_iter()
        .map(|pull| ChangeRequest {
            number: pull.number,
            title: pull.title,
            url: pull.html_url,
            author: pull.user.login,
            created_at: pull.created_at,
        })
        .collect())
}

#[derive(Debug, Deserialize)]
struct PullRequest {
    number: u64,
    title: String,
    html_url: Option<String>,
    user: User,
    created_at: String,
}

#[derive(Debug, Deserialize)]
struct User {
    login: String,
}

#[derive(Debug, Diagnostic, thiserror::Error)]
pub(crate) enum Error {
    #[error("No code host token is stored")]
    #[diagnostic(
        code(host::missing_credential),
        help("Run standup --set-github-token to store one.")
    )]
    MissingCredential,
    #[error(transparent)]
    #[diagnostic(transparent)]
    Store(#[from] StoreError),
    #[error("Trouble communicating with the code host while {activity}: {source}")]
    #[diagnostic(
        code(host::api_request_error),
        help("This may be a network issue or a permissions issue.")
    )]
    Request {
        activity: &'static str,
        #[source]
        source: Box<reqwest::Error>,
    },
    #[error("The code host responded with status {status}: {body}")]
    #[diagnostic(
        code(host::api_response_error),
        help("Check that the owner and repository exist and the token can read them.")
    )]
    Api { status: u16, body: String },
    #[error("Could not decode the pull request response: {source}")]
    #[diagnostic(code(host::decode_error))]
    Decode {
        #[source]
        source: serde_json::Error,
        body: String,
    },
}
