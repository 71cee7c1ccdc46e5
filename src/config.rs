use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::Path;
use thiserror::Error;
use tracing::info;

const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_PORT: u16 = 8080;
const CONFIG_DIR: &str = "config";
const DEFAULT_NOTIFICATION_TIMEOUT_SECS: u64 = 10;
const DEFAULT_PROOF_FOLDER: &str = "payment-proofs";

/// Application configuration, loaded from `config/{default,<env>}.toml` with
/// `APP__*` environment-variable overrides.
#[derive(Clone, Debug, Deserialize)]
pub struct AppConfig {
    /// Database connection URL
    pub database_url: String,

    /// Host address to bind to
    pub host: String,

    /// Port number for the HTTP server
    pub port: u16,

    /// Environment (development, production, test)
    pub environment: String,

    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Emit logs as JSON
    pub log_json: bool,

    /// Run migrations on startup
    pub auto_migrate: bool,

    /// Comma-separated list of allowed CORS origins; permissive when unset
    /// in development
    pub cors_allowed_origins: Option<String>,

    /// Mailbox receiving new-order alerts
    pub admin_email: String,

    /// Transactional mail API endpoint
    pub mail_api_url: String,

    /// Transactional mail API key
    pub mail_api_key: String,

    /// From address for outbound mail
    pub mail_from: String,

    /// Object storage upload API endpoint
    pub storage_api_url: String,

    /// Object storage API key
    pub storage_api_key: String,

    /// Logical folder payment proofs are uploaded under
    pub storage_proof_folder: String,

    /// Upper bound on each outbound notification, in seconds. A hung mail
    /// provider must not stall the checkout response.
    pub notification_timeout_secs: u64,
}

impl AppConfig {
    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    pub fn is_development(&self) -> bool {
        self.environment.eq_ignore_ascii_case("development")
    }
}

#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("Configuration error: {0}")]
    ConfigError(#[from] ConfigError),
}

/// Loads configuration for the current environment.
pub fn load_config() -> Result<AppConfig, AppConfigError> {
    let run_env = env::var("RUN_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| DEFAULT_ENV.to_string());
    info!("Loading configuration for environment: {}", run_env);

    if !Path::new(CONFIG_DIR).exists() {
        info!(
            "Config directory '{}' not found; relying on built-in defaults and environment variables",
            CONFIG_DIR
        );
    }

    let config = Config::builder()
        .set_default("database_url", "sqlite://storefront.db?mode=rwc")?
        .set_default("host", "0.0.0.0")?
        .set_default("port", DEFAULT_PORT as i64)?
        .set_default("environment", DEFAULT_ENV)?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .set_default("log_json", false)?
        .set_default("auto_migrate", true)?
        .set_default("admin_email", "orders@example.com")?
        .set_default("mail_api_url", "http://localhost:9925/send")?
        .set_default("mail_api_key", "")?
        .set_default("mail_from", "no-reply@example.com")?
        .set_default("storage_api_url", "http://localhost:9926/upload")?
        .set_default("storage_api_key", "")?
        .set_default("storage_proof_folder", DEFAULT_PROOF_FOLDER)?
        .set_default(
            "notification_timeout_secs",
            DEFAULT_NOTIFICATION_TIMEOUT_SECS as i64,
        )?
        .add_source(File::with_name(&format!("{}/default", CONFIG_DIR)).required(false))
        .add_source(File::with_name(&format!("{}/{}", CONFIG_DIR, run_env)).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    let app_config: AppConfig = config.try_deserialize()?;
    Ok(app_config)
}

/// Initializes the tracing subscriber. `RUST_LOG` wins over the configured
/// level when set.
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let default_directive = format!("storefront_api={},tower_http=debug", level);
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    let filter = EnvFilter::try_new(filter_directive)
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer())
            .init();
    }
}
