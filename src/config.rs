use std::fs;
use std::path::Path;

use log::info;
use miette::{IntoDiagnostic, Result, WrapErr};
use serde::{Deserialize, Serialize};

pub(crate) const CONFIG_PATH: &str = "standup.toml";

const DEFAULT_STATUS: &str = "Open";
const DEFAULT_OUTPUT_PATH: &str = "~/standup-report.json";

/// Contents of `standup.toml`.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub(crate) struct Config {
    /// The Jira instance to pull open issues from.
    pub(crate) jira: Jira,
    /// The GitHub repository to pull open pull requests from.
    pub(crate) github: GitHub,
    /// Optional output overrides.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) output: Option<Output>,
}

impl Config {
    /// Create a Config from a TOML file.
    ///
    /// ## Errors
    /// 1. Provided path is not found
    /// 2. Cannot parse file contents into a Config
    pub(crate) fn load() -> Result<Self> {
        let contents = fs::read_to_string(CONFIG_PATH)
            .into_diagnostic()
            .wrap_err_with(|| {
                format!("Could not find {CONFIG_PATH}, run standup --init to create one")
            })?;
        toml::from_str(&contents)
            .into_diagnostic()
            .wrap_err("Invalid TOML when parsing config")
    }
}

/// Config required to talk to Jira.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub(crate) struct Jira {
    /// The URL to your Atlassian instance running Jira
    pub(crate) url: String,
    /// The key of the Jira project to filter on
    pub(crate) project: String,
    /// The status to filter issues on, defaults to "Open"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) status: Option<String>,
}

/// The repository that open pull requests are reported for.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub(crate) struct GitHub {
    /// The user or organization that owns the `repo`.
    pub(crate) owner: String,
    /// The name of the repository in GitHub
    pub(crate) repo: String,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub(crate) struct Output {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) app: Option<String>,
}

/// Generate a starter config file in the current directory.
pub(crate) fn generate() -> Result<()> {
    if Path::new(CONFIG_PATH).exists() {
        return Err(miette::miette!(
            "{CONFIG_PATH} already exists, not overwriting"
        ));
    }
    let contents = toml::to_string(&Config {
        jira: Jira {
            url: String::from("https://your-company.atlassian.net"),
            project: String::from("PROJ"),
            status: None,
        },
        github: GitHub {
            owner: String::from("your-github-user"),
            repo: String::from("your-repo"),
        },
        output: None,
    })
    .into_diagnostic()?;
    fs::write(CONFIG_PATH, contents).into_diagnostic()?;
    println!("Wrote {CONFIG_PATH}");
    Ok(())
}

/// Caller-supplied overrides, layered over [`Config`] and compiled defaults.
#[derive(Clone, Debug, Default)]
pub(crate) struct Overrides {
    pub(crate) owner: Option<String>,
    pub(crate) repo: Option<String>,
    pub(crate) output: Option<String>,
    pub(crate) app: Option<String>,
    pub(crate) no_browser: bool,
    pub(crate) summary_only: bool,
    pub(crate) plain_notifications: bool,
}

/// Everything one pipeline run needs, resolved up front and immutable after.
#[derive(Clone, Debug)]
pub(crate) struct RunConfig {
    pub(crate) tracker: Jira,
    pub(crate) status: String,
    pub(crate) owner: String,
    pub(crate) repo: String,
    pub(crate) output_path: String,
    pub(crate) output_app: Option<String>,
    pub(crate) open_in_browser: bool,
    pub(crate) summary_only: bool,
    pub(crate) rich_notifications: bool,
}

impl RunConfig {
    pub(crate) fn resolve(config: &Config, overrides: &Overrides) -> Self {
        let owner = match non_empty(overrides.owner.as_deref()) {
            Some(owner) => owner.to_string(),
            None => {
                info!(
                    "No repository owner given, using configured {}",
                    config.github.owner
                );
                config.github.owner.clone()
            }
        };
        let repo = match non_empty(overrides.repo.as_deref()) {
            Some(repo) => repo.to_string(),
            None => {
                info!(
                    "No repository name given, using configured {}",
                    config.github.repo
                );
                config.github.repo.clone()
            }
        };
        let output = config.output.clone().unwrap_or_default();
        RunConfig {
            status: config
                .jira
                .status
                .clone()
                .unwrap_or_else(|| DEFAULT_STATUS.to_string()),
            tracker: config.jira.clone(),
            owner,
            repo,
            output_path: overrides
                .output
                .clone()
                .or(output.path)
                .unwrap_or_else(|| DEFAULT_OUTPUT_PATH.to_string()),
            output_app: overrides.app.clone().or(output.app),
            open_in_browser: !overrides.no_browser,
            summary_only: overrides.summary_only,
            rich_notifications: !overrides.plain_notifications,
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn config() -> Config {
        toml::from_str(
            r#"
            [jira]
            url = "https://example.atlassian.net"
            project = "PROJ"

            [github]
            owner = "configured-owner"
            repo = "configured-repo"

            [output]
            path = "~/reports/standup.json"
            app = "TextEdit"
            "#,
        )
        .unwrap()
    }

    #[test]
    fn defaults_apply_without_overrides() {
        let resolved = RunConfig::resolve(&config(), &Overrides::default());
        assert_eq!(resolved.owner, "configured-owner");
        assert_eq!(resolved.repo, "configured-repo");
        assert_eq!(resolved.status, "Open");
        assert_eq!(resolved.output_path, "~/reports/standup.json");
        assert_eq!(resolved.output_app.as_deref(), Some("TextEdit"));
        assert!(resolved.open_in_browser);
        assert!(!resolved.summary_only);
        assert!(resolved.rich_notifications);
    }

    #[test]
    fn overrides_win_over_config() {
        let overrides = Overrides {
            owner: Some("other-owner".to_string()),
            repo: Some("other-repo".to_string()),
            output: Some("/tmp/report.json".to_string()),
            app: Some("Preview".to_string()),
            no_browser: true,
            summary_only: true,
            plain_notifications: true,
        };
        let resolved = RunConfig::resolve(&config(), &overrides);
        assert_eq!(resolved.owner, "other-owner");
        assert_eq!(resolved.repo, "other-repo");
        assert_eq!(resolved.output_path, "/tmp/report.json");
        assert_eq!(resolved.output_app.as_deref(), Some("Preview"));
        assert!(!resolved.open_in_browser);
        assert!(resolved.summary_only);
        assert!(!resolved.rich_notifications);
    }

    #[test]
    fn empty_string_override_falls_back_to_config() {
        let overrides = Overrides {
            owner: Some(String::new()),
            repo: Some(String::new()),
            ..Overrides::default()
        };
        let resolved = RunConfig::resolve(&config(), &overrides);
        assert_eq!(resolved.owner, "configured-owner");
        assert_eq!(resolved.repo, "configured-repo");
    }

    #[test]
    fn missing_output_section_uses_compiled_defaults() {
        let config: Config = toml::from_str(
            r#"
            [jira]
            url = "https://example.atlassian.net"
            project = "PROJ"
            status = "In Progress"

            [github]
            owner = "o"
            repo = "r"
            "#,
        )
        .unwrap();
        let resolved = RunConfig::resolve(&config, &Overrides::default());
        assert_eq!(resolved.output_path, "~/standup-report.json");
        assert_eq!(resolved.output_app, None);
        assert_eq!(resolved.status, "In Progress");
    }
}
