//! Client configuration management.
//!
//! `ClientConfig` is what an `ApiClient` is constructed with. It is built
//! from defaults, then an optional `Config` file, then environment variables.
//!
//! The config file is stored at `~/.config/cukee/config.json`.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Application name used for config directory paths
const APP_NAME: &str = "cukee";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Backend origin used when nothing overrides it
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api/v1";

/// Name of the session cookie set by the backend
pub const DEFAULT_COOKIE_NAME: &str = "session";

/// Cookie carrying a developer-console session
pub const CONSOLE_COOKIE_NAME: &str = "console_token";

/// Cookie carrying an admin session
pub const ADMIN_COOKIE_NAME: &str = "admin_token";

pub const DEFAULT_REFRESH_PATH: &str = "/auth/refresh";

/// Login view that auth failures redirect to
pub const DEFAULT_LOGIN_VIEW: &str = "/auth/login";

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

pub const ENV_BASE_URL: &str = "CUKEE_API_BASE_URL";
pub const ENV_USE_MOCK: &str = "CUKEE_USE_MOCK";
pub const ENV_CREDENTIAL_MODE: &str = "CUKEE_CREDENTIAL_MODE";

/// How the session credential travels with each request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialMode {
    /// `Cookie: session=<token>`, as a browser would send it
    #[default]
    Cookie,
    /// `Authorization: Bearer <token>`, read from the scoped store
    Bearer,
}

impl FromStr for CredentialMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cookie" => Ok(CredentialMode::Cookie),
            "bearer" => Ok(CredentialMode::Bearer),
            other => Err(anyhow::anyhow!("Unknown credential mode: {}", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub credential_mode: CredentialMode,
    pub cookie_name: String,
    pub refresh_path: String,
    pub login_view: String,
    pub mock_mode: bool,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            credential_mode: CredentialMode::default(),
            cookie_name: DEFAULT_COOKIE_NAME.to_string(),
            refresh_path: DEFAULT_REFRESH_PATH.to_string(),
            login_view: DEFAULT_LOGIN_VIEW.to_string(),
            mock_mode: false,
            timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Defaults overridden by `CUKEE_*` environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(url) = var(ENV_BASE_URL).filter(|v| !v.trim().is_empty()) {
            self.base_url = url.trim().to_string();
        }
        if let Some(flag) = var(ENV_USE_MOCK) {
            self.mock_mode = flag.trim().eq_ignore_ascii_case("true");
        }
        if let Some(mode) = var(ENV_CREDENTIAL_MODE) {
            self.credential_mode = mode.parse()?;
        }
        Ok(())
    }

    pub fn with_credential_mode(mut self, mode: CredentialMode) -> Self {
        self.credential_mode = mode;
        self
    }

    pub fn with_mock_mode(mut self, enabled: bool) -> Self {
        self.mock_mode = enabled;
        self
    }

    pub fn with_cookie_name(mut self, name: impl Into<String>) -> Self {
        self.cookie_name = name.into();
        self
    }

    /// Same backend, authenticated by the console session cookie
    pub fn for_console(self) -> Self {
        self.with_cookie_name(CONSOLE_COOKIE_NAME)
    }

    /// Same backend, authenticated by the admin session cookie
    pub fn for_admin(self) -> Self {
        self.with_cookie_name(ADMIN_COOKIE_NAME)
    }

    pub fn with_refresh_path(mut self, path: impl Into<String>) -> Self {
        self.refresh_path = path.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Host part of the base URL, used to scope stored credentials
    pub fn domain(&self) -> Option<String> {
        reqwest::Url::parse(&self.base_url)
            .ok()
            .and_then(|url| url.host_str().map(str::to_string))
    }
}

/// Persisted user settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub base_url: Option<String>,
    pub credential_mode: Option<CredentialMode>,
    pub last_email: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Client settings: environment over this file over defaults
    pub fn client_config(&self) -> Result<ClientConfig> {
        self.client_config_with(|key| std::env::var(key).ok())
    }

    fn client_config_with(&self, var: impl Fn(&str) -> Option<String>) -> Result<ClientConfig> {
        let mut config = ClientConfig::default();
        if let Some(ref url) = self.base_url {
            config.base_url = url.clone();
        }
        if let Some(mode) = self.credential_mode {
            config.credential_mode = mode;
        }
        config.apply_env(var)?;
        Ok(config)
    }
}
