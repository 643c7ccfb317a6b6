//! Authentication module for managing the session credential.
//!
//! This module provides:
//! - `CredentialStore`: where the session token lives (in-memory jar or OS keychain)
//! - `Session`: shared credential state with refresh coalescing
//!
//! The token itself is opaque; it is issued by the backend in a `Set-Cookie`
//! header on login, signup, and refresh.

pub mod credentials;
pub mod session;

pub use credentials::{CredentialStore, KeyringCredentialStore, MemoryCredentialStore};
pub use session::{CredentialSnapshot, Session, SessionCredential};
