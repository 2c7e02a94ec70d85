//! Named secrets backed by the OS keyring.
//!
//! Absence of a secret is an expected state, not a failure: `get` returns
//! `Ok(None)` when no entry exists and reserves `StoreError` for the store
//! mechanism itself breaking (locked keyring, no secret service, etc.).

use log::{error, trace};
use miette::Diagnostic;
use thiserror::Error;

/// Keyring service under which all of this tool's secrets live.
const SERVICE: &str = "standup";

/// Name of the issue-tracker bearer token.
pub(crate) const TRACKER_TOKEN: &str = "tracker-token";
/// Name of the code-host bearer token.
pub(crate) const HOST_TOKEN: &str = "host-token";

pub(crate) trait CredentialStore {
    /// Look up a named secret. `Ok(None)` means the store has no entry for
    /// `name`; `Err` means the lookup mechanism itself failed.
    fn get(&self, name: &str) -> Result<Option<String>, StoreError>;

    /// Persist a secret under `name`, overwriting any existing entry.
    /// Never raises: a failed write is reported as `false` so the caller can
    /// fall back instead of aborting.
    fn set(&self, name: &str, value: &str) -> bool;
}

#[derive(Debug, Diagnostic, Error)]
#[error("The credential store failed while reading {name}: {source}")]
#[diagnostic(
    code(credentials::store),
    help("Check that your OS keyring is unlocked and reachable.")
)]
pub(crate) struct StoreError {
    name: String,
    #[source]
    source: keyring::Error,
}

/// The real store, one keyring entry per credential name.
pub(crate) struct Keychain;

impl Keychain {
    fn entry(name: &str) -> Result<keyring::Entry, keyring::Error> {
        keyring::Entry::new(SERVICE, name)
    }
}

impl CredentialStore for Keychain {
    fn get(&self, name: &str) -> Result<Option<String>, StoreError> {
        let entry = Self::entry(name).map_err(|source| StoreError {
            name: name.to_string(),
            source,
        })?;
        match entry.get_password() {
            Ok(secret) => {
                trace!("Resolved credential {name} from the keyring");
                Ok(Some(secret))
            }
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(source) => Err(StoreError {
                name: name.to_string(),
                source,
            }),
        }
    }

    fn set(&self, name: &str, value: &str) -> bool {
        let result = Self::entry(name).and_then(|entry| entry.set_password(value));
        match result {
            Ok(()) => true,
            Err(err) => {
                error!("Could not save credential {name} to the keyring: {err}");
                false
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::collections::HashMap;

    use super::{CredentialStore, StoreError};

    /// In-memory store for tests. `get` counts lookups so tests can assert
    /// that each credential is resolved at most once per run.
    #[derive(Default)]
    pub(crate) struct InMemoryStore {
        secrets: HashMap<String, String>,
        lookups: std::sync::Mutex<Vec<String>>,
    }

    impl InMemoryStore {
        pub(crate) fn with(entries: &[(&str, &str)]) -> Self {
            Self {
                secrets: entries
                    .iter()
                    .map(|(name, value)| (String::from(*name), String::from(*value)))
                    .collect(),
                lookups: std::sync::Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn lookup_count(&self, name: &str) -> usize {
            self.lookups
                .lock()
                .unwrap()
                .iter()
                .filter(|looked_up| *looked_up == name)
                .count()
        }
    }

    impl CredentialStore for InMemoryStore {
        fn get(&self, name: &str) -> Result<Option<String>, StoreError> {
            self.lookups.lock().unwrap().push(name.to_string());
            Ok(self.secrets.get(name).cloned())
        }

        fn set(&self, _name: &str, _value: &str) -> bool {
            false
        }
    }
}
