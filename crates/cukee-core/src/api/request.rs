//! Request descriptors and attempts.
//!
//! A `RequestDescriptor` is everything needed to (re)issue a call. It is never
//! mutated after construction, so a replay after a silent refresh sends exactly
//! what the first attempt sent. `RequestAttempt` pairs a descriptor with its
//! attempt number; only a first attempt can yield a retry.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, Url};
use serde_json::Value;

use super::ApiError;

/// Per-call options layered on top of the client's defaults
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub query: Vec<(String, String)>,
    pub headers: HeaderMap,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }
}

#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    method: Method,
    path: String,
    body: Option<Value>,
    options: RequestOptions,
}

impl RequestDescriptor {
    pub fn new(method: Method, path: &str, body: Option<Value>, options: RequestOptions) -> Self {
        Self {
            method,
            path: normalize_path(path),
            body,
            options,
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.options.headers
    }

    pub fn query(&self) -> &[(String, String)] {
        &self.options.query
    }

    /// Whether this descriptor targets `path`, ignoring a trailing slash
    pub fn targets(&self, path: &str) -> bool {
        self.path.trim_end_matches('/') == normalize_path(path).trim_end_matches('/')
    }

    /// Resolve the full URL against the configured base URL.
    pub fn url(&self, base_url: &str) -> Result<Url, ApiError> {
        let joined = format!("{}{}", base_url.trim_end_matches('/'), self.path);
        let mut url = Url::parse(&joined)
            .map_err(|e| ApiError::InvalidRequest(format!("{}: {}", joined, e)))?;
        if !self.options.query.is_empty() {
            url.query_pairs_mut().extend_pairs(self.options.query.iter());
        }
        Ok(url)
    }
}

/// One dispatch of a descriptor. The first attempt may be retried once.
#[derive(Debug, Clone, Copy)]
pub struct RequestAttempt<'a> {
    descriptor: &'a RequestDescriptor,
    attempt: u8,
}

impl<'a> RequestAttempt<'a> {
    pub fn first(descriptor: &'a RequestDescriptor) -> Self {
        Self {
            descriptor,
            attempt: 1,
        }
    }

    /// The replay of this attempt, or `None` if this already is the replay.
    pub fn retry(&self) -> Option<Self> {
        if self.attempt == 1 {
            Some(Self {
                descriptor: self.descriptor,
                attempt: 2,
            })
        } else {
            None
        }
    }

    pub fn descriptor(&self) -> &'a RequestDescriptor {
        self.descriptor
    }

    pub fn number(&self) -> u8 {
        self.attempt
    }

    pub fn is_retry(&self) -> bool {
        self.attempt > 1
    }
}

fn normalize_path(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    }
}
