use std::fmt;

use serde::Serialize;
use time::OffsetDateTime;

/// One open ticket from the issue tracker, exactly as the upstream returned it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub(crate) struct Issue {
    pub(crate) key: String,
    pub(crate) summary: String,
    pub(crate) status: String,
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.key, self.summary)
    }
}

/// One open pull request from the code host.
///
/// `url` is optional: a record without a canonical URL is still reported, it
/// just can't be opened in a browser.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ChangeRequest {
    pub(crate) number: u64,
    pub(crate) title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) url: Option<String>,
    pub(crate) author: String,
    pub(crate) created_at: String,
}

impl fmt::Display for ChangeRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {} (@{})", self.number, self.title, self.author)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RepoCoordinates {
    pub(crate) owner: String,
    pub(crate) name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Metadata {
    #[serde(with = "time::serde::rfc3339")]
    pub(crate) generated: OffsetDateTime,
    pub(crate) tracker_project: String,
    pub(crate) repo_coordinates: RepoCoordinates,
}

/// The terminal artifact of one run: both upstream lists merged under a
/// single metadata header. Built once, never mutated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CombinedReport {
    pub(crate) metadata: Metadata,
    pub(crate) issues: Vec<Issue>,
    pub(crate) change_requests: Vec<ChangeRequest>,
}

impl CombinedReport {
    pub(crate) fn new(
        generated: OffsetDateTime,
        tracker_project: String,
        repo_coordinates: RepoCoordinates,
        issues: Vec<Issue>,
        change_requests: Vec<ChangeRequest>,
    ) -> Self {
        Self {
            metadata: Metadata {
                generated,
                tracker_project,
                repo_coordinates,
            },
            issues,
            change_requests,
        }
    }

    pub(crate) fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// The rich notification body: up to the first three entries of each
    /// list, an "…and N more" suffix when truncated, and an explicit
    /// "none found" line instead of an empty section.
    pub(crate) fn summary_text(&self) -> String {
        let mut lines = Vec::new();
        lines.push(format!("Issues ({}):", self.issues.len()));
        lines.extend(preview(&self.issues, "open issues"));
        lines.push(format!("Pull requests ({}):", self.change_requests.len()));
        lines.extend(preview(&self.change_requests, "open pull requests"));
        lines.join("\n")
    }
}

const PREVIEW_LIMIT: usize = 3;

fn preview<T: fmt::Display>(items: &[T], what: &str) -> Vec<String> {
    if items.is_empty() {
        return vec![format!("  no {what} found")];
    }
    let mut lines: Vec<String> = items
        .iter()
        .take(PREVIEW_LIMIT)
        .map(|item| format!("  {item}"))
        .collect();
    if items.len() > PREVIEW_LIMIT {
        lines.push(format!("  ...and {} more", items.len() - PREVIEW_LIMIT));
    }
    lines
}
