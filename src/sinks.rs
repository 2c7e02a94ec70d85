//! Delivery side effects: the report file, browser opens, desktop
//! notifications, and search indexing.
//!
//! Only the file sink can fail the run. Everything else is fire-and-forget:
//! failures are logged and swallowed so a broken opener or notifier never
//! loses an already-produced report. All external commands are spawned with
//! structured arguments, never through a shell.

use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use log::{debug, trace, warn};
use miette::Diagnostic;
use thiserror::Error;

pub(crate) trait FileSink {
    /// Write `content` to `path`, expanding a leading `~/` and creating
    /// intermediate directories. Overwrites. Returns the resolved path.
    fn write(&self, content: &str, path: &str) -> Result<PathBuf, Error>;
}

pub(crate) trait UrlSink {
    fn open(&self, url: &str);
    fn open_file(&self, path: &Path, app: Option<&str>);
}

pub(crate) trait Notifier {
    fn notify(&self, title: &str, message: &str, tone: Option<&str>);
}

pub(crate) trait Indexer {
    fn index(&self, path: &Path);
}

#[derive(Debug, Diagnostic, Error)]
pub(crate) enum Error {
    #[error("Error writing to {path}: {source}")]
    #[diagnostic(
        code(sinks::write),
        help("Make sure you have permission to write to this file.")
    )]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Resolves a leading `~/` against the current home directory.
fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

pub(crate) struct FsSink;

impl FileSink for FsSink {
    fn write(&self, content: &str, path: &str) -> Result<PathBuf, Error> {
        let resolved = expand_home(path);
        if let Some(parent) = resolved.parent() {
            std::fs::create_dir_all(parent).map_err(|source| Error::Write {
                path: resolved.clone(),
                source,
            })?;
        }
        trace!("Writing report to {}", resolved.display());
        std::fs::write(&resolved, content).map_err(|source| Error::Write {
            path: resolved.clone(),
            source,
        })?;
        Ok(resolved)
    }
}

/// Runs a command, logging instead of failing: sinks other than the file
/// writer must never abort the run.
fn run_quiet(program: &str, args: &[&str]) {
    match Command::new(program).args(args).status() {
        Ok(status) if status.success() => {}
        Ok(status) => warn!("{program} exited with {status}"),
        Err(err) => warn!("Could not run {program}: {err}"),
    }
}

pub(crate) struct SystemOpener;

impl UrlSink for SystemOpener {
    fn open(&self, url: &str) {
        debug!("Opening {url}");
        if cfg!(target_os = "macos") {
            run_quiet("open", &[url]);
        } else if cfg!(windows) {
            run_quiet("explorer", &[url]);
        } else {
            run_quiet("xdg-open", &[url]);
        }
    }

    fn open_file(&self, path: &Path, app: Option<&str>) {
        let path = path.to_string_lossy();
        debug!("Opening {path} in {}", app.unwrap_or("the default viewer"));
        if cfg!(target_os = "macos") {
            match app {
                Some(app) => run_quiet("open", &["-a", app, &path]),
                None => run_quiet("open", &[&path]),
            }
        } else {
            if app.is_some() {
                debug!("Viewer hints are only supported on macOS, using the default handler");
            }
            if cfg!(windows) {
                run_quiet("explorer", &[&path]);
            } else {
                run_quiet("xdg-open", &[&path]);
            }
        }
    }
}

pub(crate) struct DesktopNotifier;

impl Notifier for DesktopNotifier {
    fn notify(&self, title: &str, message: &str, tone: Option<&str>) {
        debug!("Notification [{title}] {message}");
        if cfg!(target_os = "macos") {
            let script = format!(
                "display notification \"{}\" with title \"{}\"",
                applescript_escape(message),
                applescript_escape(title)
            );
            run_quiet("osascript", &["-e", &script]);
        } else if cfg!(target_os = "linux") {
            let urgency = match tone {
                Some("error") => "critical",
                _ => "normal",
            };
            run_quiet("notify-send", &["-u", urgency, title, message]);
        }
    }
}

fn applescript_escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

pub(crate) struct SpotlightIndexer;

impl Indexer for SpotlightIndexer {
    fn index(&self, path: &Path) {
        if cfg!(target_os = "macos") {
            run_quiet("mdimport", &[&path.to_string_lossy()]);
        } else {
            debug!("Search indexing is only available on macOS, skipping");
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn tilde_prefix_resolves_against_home() {
        let resolved = expand_home("~/reports/standup.json");
        let home = dirs::home_dir().unwrap();
        assert_eq!(resolved, home.join("reports/standup.json"));
    }

    #[test]
    fn absolute_path_passes_through() {
        assert_eq!(
            expand_home("/tmp/standup.json"),
            PathBuf::from("/tmp/standup.json")
        );
    }

    #[test]
    fn write_creates_intermediate_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a/b/report.json");
        let written = FsSink
            .write("{}", path.to_str().unwrap())
            .unwrap();
        assert_eq!(written, path);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}");
    }

    #[test]
    fn write_overwrites_existing_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        FsSink.write("first", path.to_str().unwrap()).unwrap();
        FsSink.write("second", path.to_str().unwrap()).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second");
    }

    #[test]
    fn quotes_are_escaped_for_applescript() {
        assert_eq!(
            applescript_escape(r#"say "hi" \now"#),
            r#"say \"hi\" \\now"#
        );
    }
}
