use std::sync::RwLock;

use anyhow::{anyhow, Context, Result};
use keyring::Entry;
use tracing::debug;

use super::SessionCredential;

/// Keychain service name for stored sessions
const SERVICE_NAME: &str = "cukee";

/// Where the session credential lives between requests.
///
/// Implementations must never log the token itself.
pub trait CredentialStore: Send + Sync {
    /// Read the current credential, if any
    fn load(&self) -> Result<Option<SessionCredential>>;

    /// Replace the current credential
    fn store(&self, credential: SessionCredential) -> Result<()>;

    /// Remove the credential. Clearing an empty store is not an error.
    fn clear(&self) -> Result<()>;
}

/// In-process credential jar, lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    credential: RwLock<Option<SessionCredential>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            credential: RwLock::new(Some(SessionCredential::new(token))),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> Result<Option<SessionCredential>> {
        let guard = self
            .credential
            .read()
            .map_err(|_| anyhow!("Credential lock poisoned"))?;
        Ok(guard.clone())
    }

    fn store(&self, credential: SessionCredential) -> Result<()> {
        let mut guard = self
            .credential
            .write()
            .map_err(|_| anyhow!("Credential lock poisoned"))?;
        *guard = Some(credential);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let mut guard = self
            .credential
            .write()
            .map_err(|_| anyhow!("Credential lock poisoned"))?;
        *guard = None;
        Ok(())
    }
}

/// Session credential kept in the OS keychain, scoped to one backend domain
/// and one session cookie (user, console, or admin).
pub struct KeyringCredentialStore {
    domain: String,
    entry: Entry,
}

impl KeyringCredentialStore {
    /// Open the keychain entry for `cookie_name` on `domain`
    /// (e.g. "session" on "middle.cloudkakao.store")
    pub fn new(domain: &str, cookie_name: &str) -> Result<Self> {
        let user = format!("{}@{}", cookie_name, domain);
        let entry = Entry::new(SERVICE_NAME, &user).context("Failed to create keyring entry")?;
        Ok(Self::with_entry(domain, entry))
    }

    /// Use an already-built entry (a specific keychain target, or a mock)
    pub fn with_entry(domain: &str, entry: Entry) -> Self {
        Self {
            domain: domain.to_string(),
            entry,
        }
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }
}

impl CredentialStore for KeyringCredentialStore {
    fn load(&self) -> Result<Option<SessionCredential>> {
        match self.entry.get_password() {
            Ok(contents) => {
                let credential = serde_json::from_str(&contents)
                    .context("Failed to parse stored session credential")?;
                Ok(Some(credential))
            }
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e).context("Failed to read session from keychain"),
        }
    }

    fn store(&self, credential: SessionCredential) -> Result<()> {
        let contents = serde_json::to_string(&credential)?;
        self.entry
            .set_password(&contents)
            .context("Failed to store session in keychain")?;
        debug!(domain = %self.domain, "Stored session credential in keychain");
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match self.entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e).context("Failed to delete session from keychain"),
        }
    }
}
