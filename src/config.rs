use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info};
use validator::{Validate, ValidationError, ValidationErrors};

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_BACKEND: &str = "rest";
const DEFAULT_JWT_AUDIENCE: &str = "authenticated";
const CONFIG_DIR: &str = "config";

/// Errors raised while assembling the application configuration
#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] ConfigError),
    #[error("Invalid configuration: {0}")]
    Validation(#[from] ValidationErrors),
}

/// Application configuration structure with validation
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Table backend: "rest" (hosted PostgREST endpoint) or "memory"
    #[serde(default = "default_backend")]
    #[validate(custom = "validate_backend")]
    pub backend: String,

    /// Base URL of the hosted REST endpoint, e.g. `https://project.supabase.co/rest/v1`
    #[serde(default)]
    #[validate(url(message = "backend_url must be a valid URL"))]
    pub backend_url: Option<String>,

    /// API key sent as `apikey` and bearer token to the hosted backend
    #[serde(default)]
    pub backend_api_key: Option<String>,

    /// Per-request timeout for the REST backend; unset leaves the transport default
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,

    /// JSON file of table rows loaded into the memory backend at startup
    #[serde(default)]
    pub memory_seed_path: Option<String>,

    /// Secret used to verify session tokens issued by the hosted auth service
    #[validate(length(min = 32, message = "jwt_secret must be at least 32 characters"))]
    pub jwt_secret: String,

    /// Expected `aud` claim of session tokens
    #[serde(default = "default_jwt_audience")]
    pub jwt_audience: String,

    /// Server host address
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Application environment
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    #[validate(custom = "validate_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,
}

impl AppConfig {
    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    pub fn uses_memory_backend(&self) -> bool {
        self.backend.eq_ignore_ascii_case("memory")
    }

    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Checks that cross field rules hold: the REST backend needs both its URL and key.
    fn validate_additional_constraints(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if !self.uses_memory_backend() {
            if self.backend_url.as_deref().map_or(true, str::is_empty) {
                let mut err = ValidationError::new("backend_url");
                err.message = Some("backend_url is required for the rest backend".into());
                errors.add("backend_url", err);
            }
            if self.backend_api_key.as_deref().map_or(true, str::is_empty) {
                let mut err = ValidationError::new("backend_api_key");
                err.message = Some("backend_api_key is required for the rest backend".into());
                errors.add("backend_api_key", err);
            }
        } else if self.is_production() {
            let mut err = ValidationError::new("backend");
            err.message = Some("the memory backend cannot run in production".into());
            errors.add("backend", err);
        }

        if errors.errors().is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn default_backend() -> String {
    DEFAULT_BACKEND.to_string()
}

fn default_jwt_audience() -> String {
    DEFAULT_JWT_AUDIENCE.to_string()
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn validate_backend(value: &str) -> Result<(), ValidationError> {
    match value.to_ascii_lowercase().as_str() {
        "rest" | "memory" => Ok(()),
        _ => {
            let mut err = ValidationError::new("backend");
            err.message = Some("Must be one of: rest, memory".into());
            Err(err)
        }
    }
}

/// Validates log level values
fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if valid_levels.contains(&level.to_lowercase().as_str()) {
        Ok(())
    } else {
        let mut err = ValidationError::new("log_level");
        err.message = Some("Must be one of: trace, debug, info, warn, error".into());
        Err(err)
    }
}

/// Initializes tracing using the provided log level as the default filter
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_directive = format!("agritrace={},tower_http=debug", level);
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    if json {
        let _ = fmt()
            .with_env_filter(EnvFilter::new(filter_directive))
            .json()
            .try_init();
    } else {
        let _ = fmt()
            .with_env_filter(EnvFilter::new(filter_directive))
            .try_init();
    }
}

/// Loads application configuration from `./config` and the environment.
pub fn load_config() -> Result<AppConfig, AppConfigError> {
    load_config_from(Path::new(CONFIG_DIR))
}

/// Loads application configuration
///
/// Layers configuration sources in this order:
/// 1. Built-in defaults
/// 2. Default config (`{dir}/default.toml`)
/// 3. Environment-specific config (`{dir}/{env}.toml`)
/// 4. Environment variables (`APP__*`)
pub fn load_config_from(dir: &Path) -> Result<AppConfig, AppConfigError> {
    // Support both RUN_ENV and APP_ENV for selecting config profile
    let run_env = env::var("RUN_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| DEFAULT_ENV.to_string());
    info!("Loading configuration for environment: {}", run_env);

    if !dir.exists() {
        info!(
            "Config directory '{}' not found; relying on built-in defaults and environment variables",
            dir.display()
        );
    }

    let dir_str = dir.to_string_lossy();
    let config = Config::builder()
        .set_default("backend", DEFAULT_BACKEND)?
        .set_default("host", "0.0.0.0")?
        .set_default("port", i64::from(DEFAULT_PORT))?
        .set_default("environment", run_env.as_str())?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .set_default("log_json", false)?
        .add_source(File::with_name(&format!("{}/default", dir_str)).required(false))
        .add_source(File::with_name(&format!("{}/{}", dir_str, run_env)).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    if config.get_string("jwt_secret").is_err() {
        error!("Session token secret is not configured. Set APP__JWT_SECRET.");
        return Err(AppConfigError::Load(ConfigError::NotFound(
            "jwt_secret is required but not configured. Set APP__JWT_SECRET environment variable."
                .into(),
        )));
    }

    let app_config: AppConfig = config.try_deserialize()?;

    app_config.validate().map_err(|e| {
        error!("Configuration validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    app_config.validate_additional_constraints().map_err(|e| {
        error!("Configuration backend validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    info!(backend = %app_config.backend, "Configuration loaded successfully");
    Ok(app_config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn base_config() -> AppConfig {
        AppConfig {
            backend: "rest".into(),
            backend_url: Some("https://example.supabase.co/rest/v1".into()),
            backend_api_key: Some("anon-key".into()),
            request_timeout_secs: None,
            memory_seed_path: None,
            jwt_secret: "a_long_enough_session_secret_for_tests_0123456789".into(),
            jwt_audience: "authenticated".into(),
            host: "127.0.0.1".into(),
            port: 8080,
            environment: "production".into(),
            log_level: "info".into(),
            log_json: false,
        }
    }

    #[test]
    fn rest_backend_requires_url_and_key() {
        let mut cfg = base_config();
        cfg.backend_api_key = None;
        let errors = cfg.validate_additional_constraints().unwrap_err();
        assert!(errors.field_errors().contains_key("backend_api_key"));
        assert!(!errors.field_errors().contains_key("backend_url"));
    }

    #[test]
    fn memory_backend_is_rejected_in_production() {
        let mut cfg = base_config();
        cfg.backend = "memory".into();
        assert!(cfg.validate_additional_constraints().is_err());

        cfg.environment = "development".into();
        assert!(cfg.validate_additional_constraints().is_ok());
    }

    #[test]
    fn field_rules_catch_bad_values() {
        let mut cfg = base_config();
        cfg.backend = "sqlite".into();
        cfg.log_level = "loud".into();
        cfg.jwt_secret = "short".into();

        let errors = cfg.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("backend"));
        assert!(fields.contains_key("log_level"));
        assert!(fields.contains_key("jwt_secret"));
    }

    #[test]
    fn loads_layered_file() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("default.toml"),
            r#"
                backend = "memory"
                jwt_secret = "a_long_enough_session_secret_for_tests_0123456789"
                port = 9090
                log_json = true
            "#,
        )
        .unwrap();

        let cfg = load_config_from(dir.path()).unwrap();
        assert!(cfg.uses_memory_backend());
        assert_eq!(cfg.port, 9090);
        assert!(cfg.log_json);
        assert_eq!(cfg.jwt_audience, "authenticated");
        assert_eq!(cfg.bind_address(), "0.0.0.0:9090");
    }
}
