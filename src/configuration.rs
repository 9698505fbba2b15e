use std::time::Duration;

use crate::error::ConfigError;

/// Environment variable holding the token signing secret
pub const SECRET_KEY_VAR: &str = "SECRET_KEY";

#[derive(serde::Deserialize, Clone, Debug)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub database: DatabaseSettings,
    pub jwt: JwtSettings,
    pub store: StoreSettings,
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
}

#[derive(serde::Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Mongo,
    Memory,
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct DatabaseSettings {
    pub backend: StoreBackend,
    pub uri: String,
    pub database_name: String,
}

/// JWT signing settings
#[derive(serde::Deserialize, Clone)]
pub struct JwtSettings {
    pub secret: String,
    pub access_token_expiry: i64,  // seconds (86400 = 24 hours)
    pub refresh_token_expiry: i64, // seconds (604800 = 168 hours)
}

// The secret never reaches the logs.
impl std::fmt::Debug for JwtSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtSettings")
            .field("secret", &"<redacted>")
            .field("access_token_expiry", &self.access_token_expiry)
            .field("refresh_token_expiry", &self.refresh_token_expiry)
            .finish()
    }
}

/// Bounds applied to every document store call
#[derive(serde::Deserialize, Clone, Debug)]
pub struct StoreSettings {
    pub timeout_seconds: u64,
    pub max_retries: u32,
    pub retry_backoff_millis: u64,
}

impl StoreSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_millis)
    }
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            timeout_seconds: 100,
            max_retries: 2,
            retry_backoff_millis: 100,
        }
    }
}

impl Settings {
    pub fn address(&self) -> String {
        format!("{}:{}", self.application.host, self.application.port)
    }

    /// Rejects settings the service must not start with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt.secret.trim().is_empty() {
            return Err(ConfigError::MissingRequired(format!(
                "jwt.secret (set {})",
                SECRET_KEY_VAR
            )));
        }
        if self.jwt.access_token_expiry <= 0 || self.jwt.refresh_token_expiry <= 0 {
            return Err(ConfigError::InvalidValue(
                "token expiries must be positive".to_string(),
            ));
        }
        if self.store.timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue(
                "store.timeout_seconds must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Load settings from `configuration.*`, then `APP__*` variables, then `SECRET_KEY`.
///
/// The secret is read exactly once here; a missing or blank value is an error.
pub fn get_configuration() -> Result<Settings, ConfigError> {
    let secret = std::env::var(SECRET_KEY_VAR).ok();
    let defaults = StoreSettings::default();

    let settings = config::Config::builder()
        .set_default("application.host", "127.0.0.1")?
        .set_default("application.port", 8000)?
        .set_default("database.backend", "mongo")?
        .set_default("database.uri", "mongodb://localhost:27017")?
        .set_default("database.database_name", "user_auth")?
        .set_default("jwt.secret", "")?
        .set_default("jwt.access_token_expiry", 24 * 60 * 60)?
        .set_default("jwt.refresh_token_expiry", 168 * 60 * 60)?
        .set_default("store.timeout_seconds", defaults.timeout_seconds as i64)?
        .set_default("store.max_retries", i64::from(defaults.max_retries))?
        .set_default("store.retry_backoff_millis", defaults.retry_backoff_millis as i64)?
        .add_source(config::File::with_name("configuration").required(false))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("__")
                .separator("__"),
        )
        .set_override_option("jwt.secret", secret)?
        .build()?;

    let settings = settings.try_deserialize::<Settings>()?;
    settings.validate()?;
    Ok(settings)
}
