//! REST API client module for the Cukee backend.
//!
//! This module provides the `ApiClient` for communicating with the Cukee
//! API to fetch users, tickets, exhibitions, and console keys.
//!
//! The API uses an HttpOnly session cookie issued at login. Expired sessions
//! are renewed through the refresh endpoint without involving the caller.

pub mod client;
pub mod error;
pub mod failure;
pub mod request;

pub use client::ApiClient;
pub use error::ApiError;
pub use failure::{AuthFailureAction, Navigator};
pub use request::{RequestAttempt, RequestDescriptor, RequestOptions};
