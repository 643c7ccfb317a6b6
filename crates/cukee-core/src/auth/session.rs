use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::CredentialStore;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionCredential {
    pub token: String,
    pub issued_at: DateTime<Utc>,
    /// From the cookie's Max-Age; `None` means a session cookie
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl SessionCredential {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            issued_at: Utc::now(),
            expires_at: None,
        }
    }

    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.expires_at = Some(self.issued_at + max_age);
        self
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at.map(|at| Utc::now() >= at).unwrap_or(false)
    }

    /// Get minutes remaining until expiry (for display)
    pub fn minutes_until_expiry(&self) -> Option<i64> {
        self.expires_at
            .map(|at| (at - Utc::now()).num_minutes().max(0))
    }
}

/// Credential as seen by one dispatch, tagged with the session generation.
#[derive(Debug, Clone)]
pub struct CredentialSnapshot {
    pub token: Option<String>,
    pub generation: u64,
}

#[derive(Debug, Clone)]
struct RefreshRecord {
    generation: u64,
    outcome: std::result::Result<(), String>,
}

/// Shared session state: the credential store plus refresh bookkeeping.
///
/// Every credential change bumps the generation. Refreshes run one at a time.
/// A caller whose credential predates a newer stored credential replays with
/// that credential; otherwise, if a refresh finished after its credential was
/// read, it reuses that refresh's outcome instead of calling the endpoint again.
pub struct Session {
    store: Arc<dyn CredentialStore>,
    generation: AtomicU64,
    /// Generation of the most recent `store`
    last_stored: AtomicU64,
    last_refresh: Mutex<Option<RefreshRecord>>,
}

impl Session {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self {
            store,
            generation: AtomicU64::new(0),
            last_stored: AtomicU64::new(0),
            last_refresh: Mutex::new(None),
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    fn advance(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Current credential for an outgoing request. Expired credentials are
    /// not attached, like a browser dropping an expired cookie.
    pub fn snapshot(&self) -> CredentialSnapshot {
        let generation = self.generation();
        let token = match self.store.load() {
            Ok(Some(credential)) if !credential.is_expired() => Some(credential.token),
            Ok(_) => None,
            Err(e) => {
                warn!(error = %e, "Failed to read session credential");
                None
            }
        };
        CredentialSnapshot { token, generation }
    }

    pub fn credential(&self) -> Result<Option<SessionCredential>> {
        self.store.load()
    }

    pub fn is_authenticated(&self) -> bool {
        self.snapshot().token.is_some()
    }

    pub fn store(&self, credential: SessionCredential) -> Result<()> {
        self.store.store(credential)?;
        let generation = self.advance();
        self.last_stored.fetch_max(generation, Ordering::AcqRel);
        Ok(())
    }

    /// Drop the local credential. Never fails; store errors are logged.
    pub fn clear(&self) {
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "Failed to clear session credential");
        }
        self.advance();
    }

    /// Run `refresh` unless the credential seen at `seen_generation` has
    /// already been superseded by a stored credential or a finished refresh.
    pub async fn refresh_once<F, Fut>(
        &self,
        seen_generation: u64,
        refresh: F,
    ) -> std::result::Result<(), String>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<(), String>>,
    {
        let mut last = self.last_refresh.lock().await;

        // Login or a refresh stored a credential this request never sent
        if self.last_stored.load(Ordering::Acquire) > seen_generation {
            debug!("Newer credential already stored, replaying without refresh");
            return Ok(());
        }

        if let Some(record) = last.as_ref() {
            if record.generation > seen_generation {
                debug!(generation = record.generation, "Reusing concurrent refresh outcome");
                return record.outcome.clone();
            }
        }

        let outcome = refresh().await;
        let generation = self.advance();
        *last = Some(RefreshRecord {
            generation,
            outcome: outcome.clone(),
        });
        outcome
    }
}
