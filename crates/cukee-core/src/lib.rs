//! Core library for cukee: the session-authenticated API client.
//!
//! - `api`: `ApiClient`, request descriptors, error taxonomy
//! - `auth`: credential stores and shared session state
//! - `config`: client configuration from env and the config file
//! - `models`: request/response types
//! - `mock`: canned responses for mock mode

pub mod api;
pub mod auth;
pub mod config;
pub mod mock;
pub mod models;

pub use api::{ApiClient, ApiError, AuthFailureAction, Navigator, RequestOptions};
pub use auth::{CredentialStore, KeyringCredentialStore, MemoryCredentialStore, SessionCredential};
pub use config::{ClientConfig, Config, CredentialMode};
