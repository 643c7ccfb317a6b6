//! API client for communicating with the Cukee REST API.
//!
//! `ApiClient` attaches the session credential to every request and recovers
//! from an expired session with one silent refresh:
//!
//! 1. Issue the request with the current credential.
//! 2. On 401, call the refresh endpoint once, then replay the same request.
//! 3. If the refresh fails (or the refresh endpoint itself answered 401),
//!    clear the credential, run the configured `AuthFailureAction`, and
//!    return `ApiError::Auth`.
//!
//! Any other failure is returned as-is. Network errors never trigger a refresh.

use std::sync::Arc;

use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client, Method, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::auth::{CredentialStore, Session, SessionCredential};
use crate::config::{ClientConfig, CredentialMode};
use crate::mock;
use crate::models::{
    AdminApiKey, AdminConsoleToken, BillingSummary, ConsoleKey, CreateApiKeyRequest,
    CreateConsoleTokenRequest, CreatedApiKey, CreatedConsoleToken, ExhibitionListResponse,
    LoginRequest, LoginResponse, MessageResponse, SignupRequest, Ticket, TicketListResponse,
    TokenLoginRequest, UsageSummary, User,
};

use super::{ApiError, AuthFailureAction, RequestAttempt, RequestDescriptor, RequestOptions};

/// Default page size for exhibition listings
const DEFAULT_EXHIBITION_LIMIT: u32 = 20;

/// Authenticated API client.
/// Clone is cheap - the HTTP client, config, and session are shared.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    config: Arc<ClientConfig>,
    session: Arc<Session>,
    on_auth_failure: AuthFailureAction,
}

impl ApiClient {
    /// Create a new API client backed by `store`
    pub fn new(config: ClientConfig, store: Arc<dyn CredentialStore>) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            config: Arc::new(config),
            session: Arc::new(Session::new(store)),
            on_auth_failure: AuthFailureAction::default(),
        })
    }

    pub fn with_auth_failure_action(mut self, action: AuthFailureAction) -> Self {
        self.on_auth_failure = action;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn is_authenticated(&self) -> bool {
        self.config.mock_mode || self.session.is_authenticated()
    }

    // ===== Request Lifecycle =====

    /// Issue a request and decode the response body.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        options: RequestOptions,
    ) -> Result<T, ApiError> {
        let descriptor = RequestDescriptor::new(method, path, body, options);

        if self.config.mock_mode {
            let value = mock::respond(&descriptor)?;
            return serde_json::from_value(value).map_err(|e| {
                ApiError::InvalidResponse(format!("{}: {}", descriptor.path(), e))
            });
        }

        let text = self.execute(&descriptor).await?;
        Self::decode(&descriptor, &text)
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request(Method::GET, path, None, RequestOptions::new()).await
    }

    pub async fn get_with<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<T, ApiError> {
        self.request(Method::GET, path, None, options).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T, ApiError> {
        self.request(Method::POST, path, Some(Self::encode(body)?), RequestOptions::new())
            .await
    }

    pub async fn put<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T, ApiError> {
        self.request(Method::PUT, path, Some(Self::encode(body)?), RequestOptions::new())
            .await
    }

    pub async fn patch<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T, ApiError> {
        self.request(Method::PATCH, path, Some(Self::encode(body)?), RequestOptions::new())
            .await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request(Method::DELETE, path, None, RequestOptions::new()).await
    }

    fn encode<B: Serialize>(body: &B) -> Result<Value, ApiError> {
        serde_json::to_value(body).map_err(|e| ApiError::InvalidRequest(e.to_string()))
    }

    fn decode<T: DeserializeOwned>(descriptor: &RequestDescriptor, text: &str) -> Result<T, ApiError> {
        // Empty bodies decode as JSON null so `()` and `Option<T>` work
        let text = if text.trim().is_empty() { "null" } else { text };
        serde_json::from_str(text)
            .map_err(|e| ApiError::InvalidResponse(format!("{}: {}", descriptor.path(), e)))
    }

    /// Run the issue / refresh / replay cycle, returning the 2xx body text.
    async fn execute(&self, descriptor: &RequestDescriptor) -> Result<String, ApiError> {
        let mut attempt = RequestAttempt::first(descriptor);

        loop {
            let snapshot = self.session.snapshot();
            let response = self.dispatch(&attempt, snapshot.token.as_deref()).await?;
            let status = response.status();

            if status.is_success() {
                return Ok(response.text().await?);
            }

            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    debug!(error = %e, status = %status, "Failed to read error body");
                    String::new()
                }
            };
            if status != StatusCode::UNAUTHORIZED {
                return Err(ApiError::from_status(status, &body));
            }

            if descriptor.targets(&self.config.refresh_path) {
                return Err(self.fail_auth("refresh endpoint returned 401".to_string()));
            }

            let Some(retry) = attempt.retry() else {
                warn!(path = descriptor.path(), "Still unauthorized after refresh");
                return Err(ApiError::from_status(status, &body));
            };

            debug!(path = descriptor.path(), "Unauthorized, attempting silent refresh");
            match self
                .session
                .refresh_once(snapshot.generation, || self.call_refresh())
                .await
            {
                Ok(()) => attempt = retry,
                Err(reason) => return Err(self.fail_auth(reason)),
            }
        }
    }

    async fn dispatch(
        &self,
        attempt: &RequestAttempt<'_>,
        token: Option<&str>,
    ) -> Result<Response, ApiError> {
        let descriptor = attempt.descriptor();
        let url = descriptor.url(&self.config.base_url)?;

        let mut builder = self
            .client
            .request(descriptor.method().clone(), url)
            .headers(descriptor.headers().clone());

        if let Some(token) = token {
            builder = match self.config.credential_mode {
                CredentialMode::Cookie => {
                    builder.header(header::COOKIE, format!("{}={}", self.config.cookie_name, token))
                }
                CredentialMode::Bearer => builder.bearer_auth(token),
            };
        }

        if let Some(body) = descriptor.body() {
            builder = builder.json(body);
        }

        debug!(
            method = %descriptor.method(),
            path = descriptor.path(),
            attempt = attempt.number(),
            "Sending request"
        );

        let response = builder.send().await?;
        self.capture_credential(&response);
        Ok(response)
    }

    /// Call the refresh endpoint directly, outside the retry cycle
    async fn call_refresh(&self) -> Result<(), String> {
        let descriptor =
            RequestDescriptor::new(Method::POST, &self.config.refresh_path, None, RequestOptions::new());
        let token = self.session.snapshot().token;

        match self.dispatch(&RequestAttempt::first(&descriptor), token.as_deref()).await {
            Ok(response) if response.status().is_success() => {
                debug!("Silent refresh succeeded");
                Ok(())
            }
            Ok(response) => Err(format!("refresh returned {}", response.status())),
            Err(e) => Err(format!("refresh failed: {}", e)),
        }
    }

    /// Terminal auth failure: clear the session and notify the host.
    fn fail_auth(&self, reason: String) -> ApiError {
        warn!(reason = %reason, "Session could not be refreshed");
        self.session.clear();
        self.on_auth_failure.apply(&self.config.login_view);
        ApiError::Auth(reason)
    }

    /// Mirror the backend's session cookie into the credential store.
    fn capture_credential(&self, response: &Response) {
        for cookie in response.cookies() {
            if cookie.name() != self.config.cookie_name {
                continue;
            }

            let expired = cookie.value().is_empty()
                || cookie.max_age().map(|age| age.is_zero()).unwrap_or(false)
                || cookie
                    .expires()
                    .map(|at| at <= std::time::SystemTime::now())
                    .unwrap_or(false);

            if expired {
                debug!("Backend expired the session cookie");
                self.session.clear();
                continue;
            }

            let mut credential = SessionCredential::new(cookie.value());
            if let Some(age) = cookie.max_age().and_then(|age| chrono::Duration::from_std(age).ok()) {
                credential = credential.with_max_age(age);
            }
            match self.session.store(credential) {
                Ok(()) => debug!("Stored session credential from response"),
                Err(e) => warn!(error = %e, "Failed to store session credential"),
            }
        }
    }

    // ===== Auth Endpoints =====

    /// Log in with email and password; the backend sets the session cookie.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let body = Self::encode(&LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        })?;
        let response: LoginResponse = self
            .request(Method::POST, "/auth/login", Some(body), RequestOptions::new())
            .await?;

        if !self.is_authenticated() {
            warn!("Login succeeded but no session cookie was issued");
        }
        Ok(response)
    }

    pub async fn signup(&self, email: &str, password: &str, nickname: &str) -> Result<LoginResponse, ApiError> {
        let body = Self::encode(&SignupRequest {
            email: email.to_string(),
            password: password.to_string(),
            nickname: nickname.to_string(),
        })?;
        self.request(Method::POST, "/auth/signup", Some(body), RequestOptions::new())
            .await
    }

    /// Revoke the session. The local credential is cleared even if the call fails.
    pub async fn logout(&self) -> Result<MessageResponse, ApiError> {
        self.end_session("/auth/logout").await
    }

    /// Explicit silent refresh
    pub async fn refresh(&self) -> Result<MessageResponse, ApiError> {
        let path = self.config.refresh_path.clone();
        self.request(Method::POST, &path, None, RequestOptions::new()).await
    }

    async fn end_session(&self, path: &str) -> Result<MessageResponse, ApiError> {
        let result = self.request(Method::POST, path, None, RequestOptions::new()).await;
        self.session.clear();
        result
    }

    /// Sign in with a token-style credential (console and admin sessions)
    async fn token_login(&self, path: &str, token: &str) -> Result<MessageResponse, ApiError> {
        let body = Self::encode(&TokenLoginRequest {
            token: token.to_string(),
        })?;
        self.request(Method::POST, path, Some(body), RequestOptions::new()).await
    }

    /// Ask a `*/auth/me` route whether the session is live.
    async fn has_session(&self, path: &str) -> Result<bool, ApiError> {
        match self.get::<MessageResponse>(path).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_unauthorized() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Current user, or `None` if there is no usable session.
    pub async fn check_auth(&self) -> Result<Option<User>, ApiError> {
        match self.fetch_me().await {
            Ok(user) => Ok(Some(user)),
            Err(e) if e.is_unauthorized() => Ok(None),
            Err(e) => Err(e),
        }
    }

    // ===== Data Fetching Methods =====

    pub async fn fetch_me(&self) -> Result<User, ApiError> {
        self.get("/users/me").await
    }

    pub async fn fetch_tickets(&self) -> Result<TicketListResponse, ApiError> {
        self.get("/tickets").await
    }

    /// Fetch one ticket by its code (e.g. "shortform_mz")
    pub async fn fetch_ticket_detail(&self, ticket_code: &str) -> Result<Ticket, ApiError> {
        if ticket_code.is_empty() || ticket_code.contains('/') {
            return Err(ApiError::InvalidRequest(format!("Invalid ticket code: {:?}", ticket_code)));
        }
        self.get(&format!("/tickets/{}", ticket_code)).await
    }

    pub async fn fetch_exhibitions(
        &self,
        page: Option<u32>,
        limit: Option<u32>,
    ) -> Result<ExhibitionListResponse, ApiError> {
        let options = RequestOptions::new()
            .query("page", page.unwrap_or(1))
            .query("limit", limit.unwrap_or(DEFAULT_EXHIBITION_LIMIT));
        self.get_with("/exhibitions", options).await
    }

    // ===== Console Endpoints =====
    // Console routes authenticate with the `console_token` cookie; build the
    // client with `ClientConfig::for_console`.

    /// Sign in to the developer console with an issued console token
    pub async fn console_login(&self, token: &str) -> Result<MessageResponse, ApiError> {
        self.token_login("/console/auth/login", token).await
    }

    pub async fn console_logout(&self) -> Result<MessageResponse, ApiError> {
        self.end_session("/console/auth/logout").await
    }

    pub async fn check_console_auth(&self) -> Result<bool, ApiError> {
        self.has_session("/console/auth/me").await
    }

    pub async fn fetch_console_keys(&self) -> Result<Vec<ConsoleKey>, ApiError> {
        self.get("/console/keys").await
    }

    /// Request counts, latency, and top endpoints over the last 24 hours
    pub async fn fetch_usage_summary(&self) -> Result<UsageSummary, ApiError> {
        self.get("/console/usage/summary").await
    }

    pub async fn fetch_billing_summary(&self) -> Result<BillingSummary, ApiError> {
        self.get("/console/billing/summary").await
    }

    // ===== Admin Endpoints =====
    // Admin routes authenticate with the `admin_token` cookie; build the
    // client with `ClientConfig::for_admin`.

    pub async fn admin_login(&self, token: &str) -> Result<MessageResponse, ApiError> {
        self.token_login("/admin/auth/login", token).await
    }

    pub async fn admin_logout(&self) -> Result<MessageResponse, ApiError> {
        self.end_session("/admin/auth/logout").await
    }

    pub async fn check_admin_auth(&self) -> Result<bool, ApiError> {
        self.has_session("/admin/auth/me").await
    }

    pub async fn fetch_console_tokens(&self) -> Result<Vec<AdminConsoleToken>, ApiError> {
        self.get("/admin/console-tokens").await
    }

    /// Issue a console token. The raw token and its API key are only returned here.
    pub async fn create_console_token(
        &self,
        name: Option<&str>,
        expires_in_days: Option<u32>,
    ) -> Result<CreatedConsoleToken, ApiError> {
        let body = CreateConsoleTokenRequest {
            name: name.map(str::to_string),
            expires_in_days,
        };
        self.post("/admin/console-tokens", &body).await
    }

    pub async fn revoke_console_token(&self, token_id: i64) -> Result<MessageResponse, ApiError> {
        let path = format!("/admin/console-tokens/{}/revoke", token_id);
        self.request(Method::POST, &path, None, RequestOptions::new()).await
    }

    pub async fn fetch_api_keys(&self) -> Result<Vec<AdminApiKey>, ApiError> {
        self.get("/admin/api-keys").await
    }

    pub async fn create_api_key(
        &self,
        owner_token_id: i64,
        name: Option<&str>,
    ) -> Result<CreatedApiKey, ApiError> {
        let body = CreateApiKeyRequest {
            owner_token_id,
            name: name.map(str::to_string),
        };
        self.post("/admin/api-keys", &body).await
    }

    pub async fn revoke_api_key(&self, key_id: i64) -> Result<MessageResponse, ApiError> {
        let path = format!("/admin/api-keys/{}/revoke", key_id);
        self.request(Method::POST, &path, None, RequestOptions::new()).await
    }
}
