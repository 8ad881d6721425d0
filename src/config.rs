//! Deployment configuration: endpoint base URLs, authentication and session storage.
//!
//! Configuration is read from a TOML file in which `${VAR}` and `${VAR:-default}`
//! are replaced with environment values before parsing, or assembled directly from
//! `ORDER_DESK_*` environment variables when no file is given.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Configuration error: {0}")]
    Parse(String),
    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::Parse(err.message().to_string())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub api: ApiConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

/// Base URLs of the order service, one per operation.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    pub list_url: String,
    pub detail_url: String,
    pub create_url: String,
    pub update_url: String,
    pub status_url: String,
    pub delete_url: String,
    #[serde(default)]
    pub status_method: StatusMethod,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

/// HTTP verb used by the status endpoint. Deployments have used both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
pub enum StatusMethod {
    #[serde(rename = "PATCH", alias = "patch")]
    Patch,
    #[default]
    #[serde(rename = "PUT", alias = "put")]
    Put,
}

impl FromStr for StatusMethod {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PATCH" => Ok(StatusMethod::Patch),
            "PUT" => Ok(StatusMethod::Put),
            other => Err(ConfigError::Validation(format!(
                "status_method must be PATCH or PUT, got '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    /// Attach `Authorization: Bearer <id token>` to every order request.
    #[serde(default = "default_true")]
    pub required: bool,
    pub login_url: Option<String>,
    pub register_url: Option<String>,
    /// Web API key of the identity provider project.
    pub api_key: Option<String>,
    pub identity_url: Option<String>,
    pub token_url: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            required: true,
            login_url: None,
            register_url: None,
            api_key: None,
            identity_url: None,
            token_url: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionConfig {
    #[serde(default = "default_session_file")]
    pub file: PathBuf,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            file: default_session_file(),
        }
    }
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

fn default_session_file() -> PathBuf {
    PathBuf::from(".order-desk/session.json")
}

impl Config {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        content.parse()
    }

    /// Builds the configuration from `ORDER_DESK_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |name: &str| {
            lookup(name).ok_or_else(|| {
                ConfigError::Validation(format!("Environment variable '{name}' not found"))
            })
        };

        let api = ApiConfig {
            list_url: required("ORDER_DESK_LIST_URL")?,
            detail_url: required("ORDER_DESK_DETAIL_URL")?,
            create_url: required("ORDER_DESK_CREATE_URL")?,
            update_url: required("ORDER_DESK_UPDATE_URL")?,
            status_url: required("ORDER_DESK_STATUS_URL")?,
            delete_url: required("ORDER_DESK_DELETE_URL")?,
            status_method: lookup("ORDER_DESK_STATUS_METHOD")
                .map(|m| m.parse::<StatusMethod>())
                .transpose()?
                .unwrap_or_default(),
            timeout_seconds: lookup("ORDER_DESK_TIMEOUT_SECONDS")
                .map(|t| {
                    t.parse::<u64>().map_err(|_| {
                        ConfigError::Validation(format!("Invalid ORDER_DESK_TIMEOUT_SECONDS: {t}"))
                    })
                })
                .transpose()?
                .unwrap_or_else(default_timeout_seconds),
        };

        let auth = AuthConfig {
            required: lookup("ORDER_DESK_AUTH_REQUIRED")
                .map(|v| !matches!(v.trim().to_ascii_lowercase().as_str(), "false" | "0" | "no"))
                .unwrap_or(true),
            login_url: lookup("ORDER_DESK_LOGIN_URL"),
            register_url: lookup("ORDER_DESK_REGISTER_URL"),
            api_key: lookup("ORDER_DESK_FIREBASE_API_KEY"),
            identity_url: lookup("ORDER_DESK_IDENTITY_URL"),
            token_url: lookup("ORDER_DESK_TOKEN_URL"),
        };

        let session = SessionConfig {
            file: lookup("ORDER_DESK_SESSION_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(default_session_file),
        };

        let config = Config { api, auth, session };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let endpoints = [
            ("api.list_url", &self.api.list_url),
            ("api.detail_url", &self.api.detail_url),
            ("api.create_url", &self.api.create_url),
            ("api.update_url", &self.api.update_url),
            ("api.status_url", &self.api.status_url),
            ("api.delete_url", &self.api.delete_url),
        ];
        for (name, url) in endpoints {
            validate_url(name, url)?;
        }
        for (name, url) in [
            ("auth.login_url", &self.auth.login_url),
            ("auth.register_url", &self.auth.register_url),
            ("auth.identity_url", &self.auth.identity_url),
            ("auth.token_url", &self.auth.token_url),
        ] {
            if let Some(url) = url {
                validate_url(name, url)?;
            }
        }

        if self.api.timeout_seconds == 0 {
            return Err(ConfigError::Validation(
                "api.timeout_seconds must be greater than 0".into(),
            ));
        }
        if self.auth.required && self.auth.api_key.as_deref().map_or(true, str::is_empty) {
            return Err(ConfigError::Validation(
                "auth.api_key is required when auth.required is true".into(),
            ));
        }
        Ok(())
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let resolved = resolve_env_vars(s, |name| std::env::var(name).ok())?;
        let config: Config = toml::from_str(&resolved)?;
        config.validate()?;
        Ok(config)
    }
}

fn validate_url(name: &str, url: &str) -> Result<(), ConfigError> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(ConfigError::Validation(format!(
            "{name} must be an http(s) URL, got '{url}'"
        )))
    }
}

/// Replaces `${VAR}` and `${VAR:-default}` with values from `lookup`.
pub(crate) fn resolve_env_vars(
    input: &str,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<String, ConfigError> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
        .map_err(|e| ConfigError::Parse(format!("Regex error: {e}")))?;

    let mut result = String::with_capacity(input.len());
    let mut last = 0;
    for cap in re.captures_iter(input) {
        let (Some(full_match), Some(var_name)) = (cap.get(0), cap.get(1)) else {
            continue;
        };
        let value = match lookup(var_name.as_str()) {
            Some(v) => v,
            None => match cap.get(2) {
                Some(default) => default.as_str().to_string(),
                None => {
                    return Err(ConfigError::Validation(format!(
                        "Environment variable '{}' not found",
                        var_name.as_str()
                    )))
                }
            },
        };
        result.push_str(&input[last..full_match.start()]);
        result.push_str(&value);
        last = full_match.end();
    }
    result.push_str(&input[last..]);
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const SAMPLE: &str = r#"
        [api]
        list_url = "https://orders.example.com/pedidos"
        detail_url = "https://orders.example.com/pedidos"
        create_url = "https://orders.example.com/pedidos"
        update_url = "https://orders.example.com"
        status_url = "https://orders.example.com/pedidos"
        delete_url = "https://orders.example.com/pedidos"

        [auth]
        api_key = "web-key"
        login_url = "https://auth.example.com/login"
    "#;

    #[test]
    fn parses_file_with_defaults() {
        let config: Config = SAMPLE.parse().unwrap();
        assert_eq!(config.api.status_method, StatusMethod::Put);
        assert_eq!(config.api.timeout_seconds, 30);
        assert!(config.auth.required);
        assert_eq!(config.auth.register_url, None);
        assert_eq!(config.session.file, PathBuf::from(".order-desk/session.json"));
    }

    #[test]
    fn reads_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("order-desk.toml");
        std::fs::write(&path, SAMPLE.replace("[auth]", "[auth]\nrequired = false")).unwrap();
        let config = Config::from_file(&path).unwrap();
        assert!(!config.auth.required);
    }

    #[test]
    fn env_var_substitution_with_defaults() {
        let vars: HashMap<&str, &str> = [("ORDERS_HOST", "orders.internal")].into();
        let lookup = |name: &str| vars.get(name).map(|v| v.to_string());

        let out = resolve_env_vars("url = \"https://${ORDERS_HOST}/x\"", lookup).unwrap();
        assert_eq!(out, "url = \"https://orders.internal/x\"");

        let out = resolve_env_vars("method = \"${STATUS_METHOD:-PATCH}\"", lookup).unwrap();
        assert_eq!(out, "method = \"PATCH\"");

        let err = resolve_env_vars("key = \"${MISSING_KEY}\"", lookup).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn rejects_non_http_urls() {
        let broken = SAMPLE.replace("https://orders.example.com/pedidos", "orders.example.com");
        let err = broken.parse::<Config>().unwrap_err();
        assert!(matches!(err, ConfigError::Validation(msg) if msg.contains("api.list_url")));
    }

    #[test]
    fn requires_api_key_when_auth_required() {
        let without_key = SAMPLE.replace("api_key = \"web-key\"", "");
        assert!(matches!(
            without_key.parse::<Config>(),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn builds_from_environment_lookup() {
        let vars: HashMap<&str, &str> = [
            ("ORDER_DESK_LIST_URL", "http://localhost:8080"),
            ("ORDER_DESK_DETAIL_URL", "http://localhost:8080/pedidos"),
            ("ORDER_DESK_CREATE_URL", "http://localhost:8080"),
            ("ORDER_DESK_UPDATE_URL", "http://localhost:8080"),
            ("ORDER_DESK_STATUS_URL", "http://localhost:8080/pedidos"),
            ("ORDER_DESK_DELETE_URL", "http://localhost:8080/pedidos"),
            ("ORDER_DESK_STATUS_METHOD", "patch"),
            ("ORDER_DESK_AUTH_REQUIRED", "false"),
        ]
        .into();
        let config = Config::from_lookup(|name| vars.get(name).map(|v| v.to_string())).unwrap();
        assert_eq!(config.api.status_method, StatusMethod::Patch);
        assert!(!config.auth.required);

        let err = Config::from_lookup(|_| None).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(msg) if msg.contains("ORDER_DESK_LIST_URL")));
    }
}
