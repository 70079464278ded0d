//! Client configuration types and loading
//!
//! Precedence: CLI flags > env vars > config file > defaults. CLI flags are
//! applied by the binary on the loaded value.
//!
//! The developer token and OAuth client secret are loaded from env vars or
//! `developer_token_file`, never stored in the TOML directly.

use ads_auth::{AuthSettings, AuthType};
use common::Secret;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_BASE_URL: &str = "https://googleads.googleapis.com";
pub const DEFAULT_API_VERSION: &str = "v19";
const DEFAULT_CONFIG_FILE: &str = "google-ads.toml";

/// Environment variables read by [`ClientConfig`].
pub mod env {
    pub const CONFIG: &str = "GOOGLE_ADS_CONFIG";
    pub const CREDENTIALS_PATH: &str = "GOOGLE_ADS_CREDENTIALS_PATH";
    pub const DEVELOPER_TOKEN: &str = "GOOGLE_ADS_DEVELOPER_TOKEN";
    pub const LOGIN_CUSTOMER_ID: &str = "GOOGLE_ADS_LOGIN_CUSTOMER_ID";
    pub const AUTH_TYPE: &str = "GOOGLE_ADS_AUTH_TYPE";
    pub use ads_auth::constants::env::{CLIENT_ID, CLIENT_SECRET, IMPERSONATION_EMAIL};
}

/// TOML document layout
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    credentials_path: Option<PathBuf>,
    login_customer_id: Option<String>,
    auth_type: Option<String>,
    /// Path to a file containing the developer token (alternative to
    /// GOOGLE_ADS_DEVELOPER_TOKEN)
    developer_token_file: Option<PathBuf>,
    impersonation_email: Option<String>,
    client_id: Option<String>,
    #[serde(default)]
    api: ApiConfig,
}

/// API endpoint settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_version")]
    pub version: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            version: default_version(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_version() -> String {
    DEFAULT_API_VERSION.to_string()
}

/// Everything one client instance needs.
#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    pub credentials_path: Option<PathBuf>,
    pub developer_token: Option<Secret<String>>,
    /// Manager account the requests are made through.
    pub login_customer_id: Option<String>,
    pub auth_type: AuthType,
    pub client_id: Option<String>,
    pub client_secret: Option<Secret<String>>,
    pub impersonation_email: Option<String>,
    pub api: ApiConfig,
}

impl ClientConfig {
    /// Load configuration from a TOML file, then overlay environment variables.
    ///
    /// Developer token resolution order:
    /// 1. GOOGLE_ADS_DEVELOPER_TOKEN env var
    /// 2. developer_token_file path from config
    pub fn load(path: &Path) -> common::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let file: FileConfig = toml::from_str(&contents)?;

        let mut config = ClientConfig {
            credentials_path: file.credentials_path,
            developer_token: None,
            login_customer_id: file.login_customer_id,
            auth_type: parse_auth_type(file.auth_type.as_deref())?,
            client_id: file.client_id,
            client_secret: None,
            impersonation_email: file.impersonation_email,
            api: file.api,
        };

        if let Some(ref token_file) = file.developer_token_file {
            let token = std::fs::read_to_string(token_file).map_err(|e| {
                common::Error::Config(format!(
                    "failed to read developer_token_file {}: {e}",
                    token_file.display()
                ))
            })?;
            let token = token.trim().to_owned();
            if !token.is_empty() {
                config.developer_token = Some(Secret::new(token));
            }
        }

        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overlaid with environment variables, for runs without a
    /// config file.
    pub fn from_env() -> common::Result<Self> {
        let mut config = ClientConfig::default();
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Load from the resolved config file if there is one, else from the
    /// environment alone.
    pub fn discover(cli_path: Option<&str>) -> common::Result<Self> {
        match Self::resolve_path(cli_path) {
            Some(path) => Self::load(&path),
            None => Self::from_env(),
        }
    }

    /// Resolve the config file path from CLI arg, GOOGLE_ADS_CONFIG, or
    /// `google-ads.toml` in the working directory if it exists.
    pub fn resolve_path(cli_path: Option<&str>) -> Option<PathBuf> {
        if let Some(p) = cli_path {
            return Some(PathBuf::from(p));
        }
        if let Ok(p) = std::env::var(env::CONFIG) {
            return Some(PathBuf::from(p));
        }
        let default = PathBuf::from(DEFAULT_CONFIG_FILE);
        default.exists().then_some(default)
    }

    fn apply_env(&mut self) -> common::Result<()> {
        if let Some(path) = env_var(env::CREDENTIALS_PATH) {
            self.credentials_path = Some(PathBuf::from(path));
        }
        if let Some(token) = env_var(env::DEVELOPER_TOKEN) {
            self.developer_token = Some(Secret::new(token));
        }
        if let Some(id) = env_var(env::LOGIN_CUSTOMER_ID) {
            self.login_customer_id = Some(id);
        }
        if let Some(auth_type) = env_var(env::AUTH_TYPE) {
            self.auth_type = parse_auth_type(Some(&auth_type))?;
        }
        if let Some(id) = env_var(env::CLIENT_ID) {
            self.client_id = Some(id);
        }
        if let Some(secret) = env_var(env::CLIENT_SECRET) {
            self.client_secret = Some(Secret::new(secret));
        }
        if let Some(email) = env_var(env::IMPERSONATION_EMAIL) {
            self.impersonation_email = Some(email);
        }
        Ok(())
    }

    /// Check the values that would otherwise only fail at request time.
    pub fn validate(&self) -> common::Result<()> {
        if !self.api.base_url.starts_with("http://") && !self.api.base_url.starts_with("https://") {
            return Err(common::Error::Config(format!(
                "api.base_url must start with http:// or https://, got: {}",
                self.api.base_url
            )));
        }
        if self.api.version.trim().is_empty() {
            return Err(common::Error::Config("api.version must not be empty".into()));
        }
        Ok(())
    }

    /// Settings handed to the credential store.
    pub fn auth_settings(&self) -> AuthSettings {
        AuthSettings {
            credentials_path: self.credentials_path.clone(),
            auth_type: self.auth_type,
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            impersonation_email: self.impersonation_email.clone(),
            ..AuthSettings::default()
        }
    }
}

/// Environment variable, with empty values treated as unset.
fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_auth_type(raw: Option<&str>) -> common::Result<AuthType> {
    match raw {
        None => Ok(AuthType::default()),
        Some(raw) => raw.parse().map_err(|_| {
            common::Error::Config(format!(
                "auth_type must be \"oauth\" or \"service_account\", got: {raw}"
            ))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Mutex to serialize tests that mutate environment variables, preventing
    /// data races when tests run in parallel.
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const ALL_VARS: [&str; 8] = [
        env::CONFIG,
        env::CREDENTIALS_PATH,
        env::DEVELOPER_TOKEN,
        env::LOGIN_CUSTOMER_ID,
        env::AUTH_TYPE,
        env::CLIENT_ID,
        env::CLIENT_SECRET,
        env::IMPERSONATION_EMAIL,
    ];

    /// SAFETY: Callers must hold ENV_MUTEX to prevent concurrent env mutation.
    unsafe fn set_env(key: &str, val: &str) {
        unsafe { std::env::set_var(key, val) };
    }

    /// SAFETY: Callers must hold ENV_MUTEX.
    unsafe fn clear_env() {
        for key in ALL_VARS {
            unsafe { std::env::remove_var(key) };
        }
    }

    fn write_config(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("google-ads.toml");
        std::fs::write(&path, body).unwrap();
        path
    }

    fn valid_toml() -> &'static str {
        r#"
credentials_path = "/etc/google-ads/token.json"
login_customer_id = "123-456-7890"
auth_type = "oauth"

[api]
version = "v18"
"#
    }

    #[test]
    fn test_load_valid_config() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { clear_env() };
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), valid_toml());

        let config = ClientConfig::load(&path).unwrap();
        assert_eq!(
            config.credentials_path.as_deref(),
            Some(Path::new("/etc/google-ads/token.json"))
        );
        assert_eq!(config.login_customer_id.as_deref(), Some("123-456-7890"));
        assert_eq!(config.auth_type, AuthType::OAuth);
        assert_eq!(config.api.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.api.version, "v18");
        assert!(config.developer_token.is_none());
    }

    #[test]
    fn test_load_missing_file() {
        let result = ClientConfig::load(Path::new("/nonexistent/path/google-ads.toml"));
        assert!(matches!(result, Err(common::Error::Io(_))));
    }

    #[test]
    fn test_load_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), "not valid {{{{ toml");
        assert!(matches!(ClientConfig::load(&path), Err(common::Error::Toml(_))));
    }

    #[test]
    fn test_env_overrides_file() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { clear_env() };
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), valid_toml());

        unsafe {
            set_env(env::CREDENTIALS_PATH, "/env/sa.json");
            set_env(env::AUTH_TYPE, "SERVICE_ACCOUNT");
            set_env(env::LOGIN_CUSTOMER_ID, "9998887777");
            set_env(env::IMPERSONATION_EMAIL, "ops@example.com");
        }
        let config = ClientConfig::load(&path).unwrap();
        unsafe { clear_env() };

        assert_eq!(config.credentials_path.as_deref(), Some(Path::new("/env/sa.json")));
        assert_eq!(config.auth_type, AuthType::ServiceAccount);
        assert_eq!(config.login_customer_id.as_deref(), Some("9998887777"));
        assert_eq!(config.impersonation_email.as_deref(), Some("ops@example.com"));
    }

    #[test]
    fn test_developer_token_from_file() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { clear_env() };
        let dir = tempfile::tempdir().unwrap();
        let token_path = dir.path().join("developer_token");
        std::fs::write(&token_path, "dev-token-file\n").unwrap();
        let path = write_config(
            dir.path(),
            &format!("developer_token_file = \"{}\"\n", token_path.display()),
        );

        let config = ClientConfig::load(&path).unwrap();
        assert_eq!(config.developer_token.unwrap().as_str(), "dev-token-file");
    }

    #[test]
    fn test_developer_token_env_overrides_file() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { clear_env() };
        let dir = tempfile::tempdir().unwrap();
        let token_path = dir.path().join("developer_token");
        std::fs::write(&token_path, "dev-token-file").unwrap();
        let path = write_config(
            dir.path(),
            &format!("developer_token_file = \"{}\"\n", token_path.display()),
        );

        unsafe { set_env(env::DEVELOPER_TOKEN, "dev-token-env") };
        let config = ClientConfig::load(&path).unwrap();
        unsafe { clear_env() };

        assert_eq!(config.developer_token.unwrap().as_str(), "dev-token-env");
    }

    #[test]
    fn test_developer_token_file_whitespace_yields_none() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { clear_env() };
        let dir = tempfile::tempdir().unwrap();
        let token_path = dir.path().join("developer_token");
        std::fs::write(&token_path, "  \n  ").unwrap();
        let path = write_config(
            dir.path(),
            &format!("developer_token_file = \"{}\"\n", token_path.display()),
        );

        let config = ClientConfig::load(&path).unwrap();
        assert!(config.developer_token.is_none());
    }

    #[test]
    fn test_developer_token_file_missing_is_error() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { clear_env() };
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            dir.path(),
            "developer_token_file = \"/nonexistent/developer_token\"\n",
        );
        let err = ClientConfig::load(&path).unwrap_err();
        assert!(err.to_string().contains("developer_token_file"), "got: {err}");
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { clear_env() };
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), "[api]\nbase_url = \"googleads.googleapis.com\"\n");

        let err = ClientConfig::load(&path).unwrap_err();
        assert!(
            err.to_string().contains("api.base_url must start with http"),
            "error message should explain the issue, got: {err}"
        );
    }

    #[test]
    fn test_empty_version_rejected() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { clear_env() };
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), "[api]\nversion = \"  \"\n");
        assert!(ClientConfig::load(&path).is_err());
    }

    #[test]
    fn test_unknown_auth_type_rejected() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { clear_env() };
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), "auth_type = \"adc\"\n");
        let err = ClientConfig::load(&path).unwrap_err();
        assert!(err.to_string().contains("auth_type"), "got: {err}");
    }

    #[test]
    fn test_from_env_without_file() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { clear_env() };
        unsafe {
            set_env(env::CREDENTIALS_PATH, "/tmp/token.json");
            set_env(env::DEVELOPER_TOKEN, "dev");
            set_env(env::CLIENT_ID, "cid.apps.googleusercontent.com");
            set_env(env::CLIENT_SECRET, "csecret");
            set_env(env::LOGIN_CUSTOMER_ID, "");
        }
        let config = ClientConfig::from_env().unwrap();
        unsafe { clear_env() };

        assert_eq!(config.api, ApiConfig::default());
        assert_eq!(config.developer_token.unwrap().as_str(), "dev");
        assert!(config.login_customer_id.is_none(), "empty env var is unset");

        let settings = ClientConfig {
            client_id: config.client_id,
            client_secret: config.client_secret,
            ..ClientConfig::default()
        }
        .auth_settings();
        assert_eq!(settings.client_id.as_deref(), Some("cid.apps.googleusercontent.com"));
        assert_eq!(settings.client_secret.unwrap().as_str(), "csecret");
        assert_eq!(settings.token_endpoint, ads_auth::constants::TOKEN_ENDPOINT);
    }

    #[test]
    fn test_resolve_path_cli_arg() {
        let path = ClientConfig::resolve_path(Some("/custom/path.toml"));
        assert_eq!(path, Some(PathBuf::from("/custom/path.toml")));
    }

    #[test]
    fn test_resolve_path_env_var() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { set_env(env::CONFIG, "/env/path.toml") };
        let path = ClientConfig::resolve_path(None);
        unsafe { clear_env() };
        assert_eq!(path, Some(PathBuf::from("/env/path.toml")));
    }

    #[test]
    fn test_resolve_path_cli_overrides_env() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { set_env(env::CONFIG, "/env/should-lose.toml") };
        let path = ClientConfig::resolve_path(Some("/cli/wins.toml"));
        unsafe { clear_env() };
        assert_eq!(
            path,
            Some(PathBuf::from("/cli/wins.toml")),
            "CLI arg must take precedence over GOOGLE_ADS_CONFIG"
        );
    }
}
