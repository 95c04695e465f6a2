//! Configuration management
//!
//! The browser bundle cannot read the environment at runtime, so WASM builds
//! bake their settings in at compile time (`DashboardConfig::from_build_env`).
//! Native builds layer defaults, an optional `dashboard.toml` and `DASHBOARD_*`
//! environment variables (`load_config`).

use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("unknown auth mode {0:?} (expected \"hosted\" or \"self_hosted\")")]
    UnknownAuthMode(String),
    #[error("hosted auth mode requires hosted.frontend_api to be set")]
    MissingHostedFrontendApi,
    #[error("invalid api base url {url:?}: {reason}")]
    InvalidApiBaseUrl { url: String, reason: String },
    #[error("failed to load configuration: {0}")]
    Load(String),
}

/// Which authentication provider the dashboard signs users in with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum AuthMode {
    /// Hosted auth service (frontend API + session JWTs)
    #[default]
    Hosted,
    /// Self-hosted JWT login against the analytics API
    SelfHosted,
}

impl AuthMode {
    /// Resolve the configured value. Unset or blank selects `Hosted`; any other
    /// unrecognized value is a hard error so a typo never silently changes how
    /// users authenticate.
    pub fn resolve(raw: Option<&str>) -> Result<Self, ConfigError> {
        let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
            return Ok(AuthMode::Hosted);
        };
        match raw.to_ascii_lowercase().as_str() {
            "hosted" | "clerk" => Ok(AuthMode::Hosted),
            "self_hosted" | "self-hosted" | "selfhosted" | "jwt" => Ok(AuthMode::SelfHosted),
            _ => Err(ConfigError::UnknownAuthMode(raw.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AuthMode::Hosted => "hosted",
            AuthMode::SelfHosted => "self_hosted",
        }
    }
}

impl TryFrom<String> for AuthMode {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        AuthMode::resolve(Some(&value))
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct HostedConfig {
    pub publishable_key: Option<String>,
    /// Base URL of the hosted service's frontend API
    pub frontend_api: Option<String>,
    /// Hosted sign-in page; `/login` redirects here in hosted mode
    pub sign_in_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct QuerySettings {
    #[serde(default = "default_stale_secs")]
    pub stale_secs: u64,
    #[serde(default = "default_gc_secs")]
    pub gc_secs: u64,
    #[serde(default = "default_retry")]
    pub retry: u32,
}

fn default_stale_secs() -> u64 {
    5 * 60
}

fn default_gc_secs() -> u64 {
    10 * 60
}

fn default_retry() -> u32 {
    3
}

impl Default for QuerySettings {
    fn default() -> Self {
        Self {
            stale_secs: default_stale_secs(),
            gc_secs: default_gc_secs(),
            retry: default_retry(),
        }
    }
}

impl QuerySettings {
    pub fn stale_time(&self) -> Duration {
        Duration::from_secs(self.stale_secs)
    }

    pub fn gc_time(&self) -> Duration {
        Duration::from_secs(self.gc_secs)
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LiveSettings {
    #[serde(default = "default_reconnect_interval_ms")]
    pub reconnect_interval_ms: u64,
    #[serde(default = "default_max_reconnect_attempts")]
    pub max_reconnect_attempts: u32,
}

fn default_reconnect_interval_ms() -> u64 {
    3000
}

fn default_max_reconnect_attempts() -> u32 {
    10
}

impl Default for LiveSettings {
    fn default() -> Self {
        Self {
            reconnect_interval_ms: default_reconnect_interval_ms(),
            max_reconnect_attempts: default_max_reconnect_attempts(),
        }
    }
}

impl LiveSettings {
    pub fn reconnect_interval(&self) -> Duration {
        Duration::from_millis(self.reconnect_interval_ms)
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct DashboardConfig {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    #[serde(default)]
    pub auth_mode: AuthMode,

    #[serde(default)]
    pub hosted: HostedConfig,

    #[serde(default)]
    pub query: QuerySettings,

    #[serde(default)]
    pub live: LiveSettings,
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            auth_mode: AuthMode::default(),
            hosted: HostedConfig::default(),
            query: QuerySettings::default(),
            live: LiveSettings::default(),
        }
    }
}

impl DashboardConfig {
    /// Configuration compiled into the binary (the only source in the browser).
    pub fn from_build_env() -> Result<Self, ConfigError> {
        let config = Self {
            api_base_url: option_env!("DASHBOARD_API_BASE_URL")
                .unwrap_or(DEFAULT_API_BASE_URL)
                .to_string(),
            auth_mode: AuthMode::resolve(option_env!("DASHBOARD_AUTH_MODE"))?,
            hosted: HostedConfig {
                publishable_key: option_env!("DASHBOARD_HOSTED_PUBLISHABLE_KEY").map(String::from),
                frontend_api: option_env!("DASHBOARD_HOSTED_FRONTEND_API").map(String::from),
                sign_in_url: option_env!("DASHBOARD_HOSTED_SIGN_IN_URL").map(String::from),
            },
            query: QuerySettings::default(),
            live: LiveSettings::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject combinations that cannot work at runtime.
    pub fn validate(&self) -> Result<(), ConfigError> {
        url::Url::parse(&self.api_base_url).map_err(|e| ConfigError::InvalidApiBaseUrl {
            url: self.api_base_url.clone(),
            reason: e.to_string(),
        })?;
        if self.auth_mode == AuthMode::Hosted
            && self
                .hosted
                .frontend_api
                .as_deref()
                .map(str::trim)
                .unwrap_or_default()
                .is_empty()
        {
            return Err(ConfigError::MissingHostedFrontendApi);
        }
        Ok(())
    }

    /// API base without a trailing slash.
    pub fn api_base(&self) -> &str {
        self.api_base_url.trim_end_matches('/')
    }
}

/// Get config directory (XDG_CONFIG_HOME or platform default)
#[cfg(not(target_arch = "wasm32"))]
pub fn get_config_dir() -> std::path::PathBuf {
    if let Ok(dir) = std::env::var("DASHBOARD_CONFIG_DIR") {
        return std::path::PathBuf::from(dir);
    }

    #[cfg(target_os = "macos")]
    {
        if let Ok(home) = std::env::var("HOME") {
            return std::path::PathBuf::from(home)
                .join("Library/Application Support/analytics-dashboard");
        }
    }

    #[cfg(target_os = "linux")]
    {
        if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
            return std::path::PathBuf::from(xdg).join("analytics-dashboard");
        }
        if let Ok(home) = std::env::var("HOME") {
            return std::path::PathBuf::from(home).join(".config/analytics-dashboard");
        }
    }

    #[cfg(target_os = "windows")]
    {
        if let Ok(appdata) = std::env::var("APPDATA") {
            return std::path::PathBuf::from(appdata).join("analytics-dashboard");
        }
    }

    std::path::PathBuf::from(".")
}

/// Get data directory (XDG_DATA_HOME or platform default)
#[cfg(not(target_arch = "wasm32"))]
pub fn get_data_dir() -> std::path::PathBuf {
    if let Ok(dir) = std::env::var("DASHBOARD_DATA_DIR") {
        return std::path::PathBuf::from(dir);
    }

    #[cfg(target_os = "macos")]
    {
        if let Ok(home) = std::env::var("HOME") {
            return std::path::PathBuf::from(home)
                .join("Library/Application Support/analytics-dashboard");
        }
    }

    #[cfg(target_os = "linux")]
    {
        if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
            return std::path::PathBuf::from(xdg).join("analytics-dashboard");
        }
        if let Ok(home) = std::env::var("HOME") {
            return std::path::PathBuf::from(home).join(".local/share/analytics-dashboard");
        }
    }

    #[cfg(target_os = "windows")]
    {
        if let Ok(appdata) = std::env::var("LOCALAPPDATA") {
            return std::path::PathBuf::from(appdata).join("analytics-dashboard");
        }
    }

    std::path::PathBuf::from("./data")
}

/// Load native configuration: defaults < `dashboard.toml` < `DASHBOARD_*` env.
#[cfg(not(target_arch = "wasm32"))]
pub fn load_config() -> Result<DashboardConfig, ConfigError> {
    let config_dir = get_config_dir();

    let config = ::config::Config::builder()
        .set_default("api_base_url", DEFAULT_API_BASE_URL)
        .map_err(|e| ConfigError::Load(e.to_string()))?
        .add_source(
            ::config::File::with_name(&config_dir.join("dashboard").to_string_lossy())
                .required(false),
        )
        // DASHBOARD_AUTH_MODE, DASHBOARD_HOSTED__FRONTEND_API, DASHBOARD_QUERY__RETRY, ...
        .add_source(
            ::config::Environment::with_prefix("DASHBOARD")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    let config: DashboardConfig = config
        .try_deserialize()
        .map_err(|e| ConfigError::Load(e.to_string()))?;
    config.validate()?;
    Ok(config)
}

/// Configuration for the current platform.
pub fn platform_config() -> Result<DashboardConfig, ConfigError> {
    #[cfg(target_arch = "wasm32")]
    {
        DashboardConfig::from_build_env()
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        load_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_mode_accepts_known_spellings() {
        assert_eq!(AuthMode::resolve(None).unwrap(), AuthMode::Hosted);
        assert_eq!(AuthMode::resolve(Some("  ")).unwrap(), AuthMode::Hosted);
        assert_eq!(AuthMode::resolve(Some("clerk")).unwrap(), AuthMode::Hosted);
        assert_eq!(AuthMode::resolve(Some("JWT")).unwrap(), AuthMode::SelfHosted);
        assert_eq!(
            AuthMode::resolve(Some("self-hosted")).unwrap(),
            AuthMode::SelfHosted
        );
    }

    #[test]
    fn auth_mode_rejects_unknown_values() {
        let err = AuthMode::resolve(Some("ldap")).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownAuthMode(ref v) if v == "ldap"));
    }

    #[test]
    fn hosted_mode_requires_frontend_api() {
        let config = DashboardConfig::default();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingHostedFrontendApi)
        ));

        let self_hosted = DashboardConfig {
            auth_mode: AuthMode::SelfHosted,
            ..DashboardConfig::default()
        };
        assert!(self_hosted.validate().is_ok());
    }

    #[test]
    fn api_base_strips_trailing_slash() {
        let config = DashboardConfig {
            api_base_url: "https://api.example.com/".into(),
            ..DashboardConfig::default()
        };
        assert_eq!(config.api_base(), "https://api.example.com");
    }

    #[test]
    fn query_and_live_defaults() {
        let config = DashboardConfig::default();
        assert_eq!(config.query.stale_time(), Duration::from_secs(300));
        assert_eq!(config.query.gc_time(), Duration::from_secs(600));
        assert_eq!(config.query.retry, 3);
        assert_eq!(config.live.reconnect_interval(), Duration::from_secs(3));
        assert_eq!(config.live.max_reconnect_attempts, 10);
    }

    #[cfg(not(target_arch = "wasm32"))]
    mod env_loading {
        use super::super::*;
        use serial_test::serial;
        use std::env;

        fn clear_env() {
            for key in [
                "DASHBOARD_AUTH_MODE",
                "DASHBOARD_API_BASE_URL",
                "DASHBOARD_HOSTED__FRONTEND_API",
                "DASHBOARD_QUERY__RETRY",
            ] {
                env::remove_var(key);
            }
            env::set_var("DASHBOARD_CONFIG_DIR", "/tmp/dashboard-test-nonexistent");
        }

        #[test]
        #[serial]
        fn self_hosted_mode_from_env() {
            clear_env();
            env::set_var("DASHBOARD_AUTH_MODE", "jwt");
            env::set_var("DASHBOARD_API_BASE_URL", "https://api.example.com");

            let config = load_config();
            clear_env();

            let config = config.expect("config should load");
            assert_eq!(config.auth_mode, AuthMode::SelfHosted);
            assert_eq!(config.api_base_url, "https://api.example.com");
        }

        #[test]
        #[serial]
        fn nested_overrides_from_env() {
            clear_env();
            env::set_var("DASHBOARD_HOSTED__FRONTEND_API", "https://auth.example.com");
            env::set_var("DASHBOARD_QUERY__RETRY", "5");

            let config = load_config();
            clear_env();

            let config = config.expect("config should load");
            assert_eq!(config.auth_mode, AuthMode::Hosted);
            assert_eq!(
                config.hosted.frontend_api.as_deref(),
                Some("https://auth.example.com")
            );
            assert_eq!(config.query.retry, 5);
        }

        #[test]
        #[serial]
        fn unknown_auth_mode_fails_fast() {
            clear_env();
            env::set_var("DASHBOARD_AUTH_MODE", "ldap");

            let result = load_config();
            clear_env();

            let err = result.expect_err("unknown auth mode must not load");
            assert!(err.to_string().contains("ldap"), "got: {}", err);
        }
    }
}
