use anyhow::Result;
use config::Config;
use serde::Deserialize;

use crate::constants::{MAX_TOKEN_DURATION_SECS, SYMMETRIC_KEY_SIZE};
use crate::error::{CoreError, CoreResult};

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub token: TokenConfig,
    pub policy: PolicyConfig,
    #[serde(default)]
    pub users: Vec<SeedUserConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    /// ## Summary
    /// Returns the bind address in the format "host:port".
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

#[derive(Clone, Deserialize)]
pub struct TokenConfig {
    pub symmetric_key: String,
    pub access_token_duration_secs: i64,
    pub refresh_token_duration_secs: i64,
    pub issuer: String,
    pub audience: String,
}

// The key never reaches the logs.
impl std::fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenConfig")
            .field("symmetric_key", &"<redacted>")
            .field("access_token_duration_secs", &self.access_token_duration_secs)
            .field(
                "refresh_token_duration_secs",
                &self.refresh_token_duration_secs,
            )
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PolicyConfig {
    /// Policy file that overrides the embedded default rule set when present.
    pub policy_path: String,
    /// Casbin model file that overrides the embedded model when present.
    pub model_path: String,
}

/// A user loaded into the credential store at startup.
#[derive(Clone, Deserialize)]
pub struct SeedUserConfig {
    pub username: String,
    pub password_hash: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub roles: Vec<String>,
}

// Hashes stay out of the logs along with the token key.
impl std::fmt::Debug for SeedUserConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeedUserConfig")
            .field("username", &self.username)
            .field("password_hash", &"<redacted>")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("roles", &self.roles)
            .finish()
    }
}

impl Settings {
    /// ## Summary
    /// Loads configuration from `.env` file and environment variables into a `Settings`.
    /// Environment variables take precedence over `config.toml` values.
    ///
    /// ## Errors
    /// Returns an error if building the configuration or deserializing it fails.
    pub fn load() -> Result<Self> {
        let settings = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("logging.level", "debug")?
            .set_default("token.access_token_duration_secs", 15 * 60)?
            .set_default("token.refresh_token_duration_secs", 24 * 60 * 60)?
            .set_default("token.issuer", "scoreit-api")?
            .set_default("token.audience", "scoreit-app")?
            .set_default("policy.policy_path", "authz_policy.csv")?
            .set_default("policy.model_path", "authz_model.conf")?
            // TOML file
            .add_source(config::File::with_name("config.toml").required(false))
            // Env file
            .add_source(
                config::Environment::with_prefix("SCOREIT")
                    .prefix_separator("__")
                    .separator("__")
                    .ignore_empty(true)
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize::<Settings>()?;

        settings.validate()?;
        Ok(settings)
    }

    /// ## Summary
    /// Checks the values that cannot be expressed through deserialization alone.
    ///
    /// ## Errors
    /// Returns `ConfigError` if the symmetric key has the wrong length or a token
    /// duration is not in `1..=MAX_TOKEN_DURATION_SECS`.
    pub fn validate(&self) -> CoreResult<()> {
        if self.token.symmetric_key.len() != SYMMETRIC_KEY_SIZE {
            return Err(CoreError::ConfigError(format!(
                "token.symmetric_key must be exactly {SYMMETRIC_KEY_SIZE} bytes"
            )));
        }
        for (name, secs) in [
            (
                "token.access_token_duration_secs",
                self.token.access_token_duration_secs,
            ),
            (
                "token.refresh_token_duration_secs",
                self.token.refresh_token_duration_secs,
            ),
        ] {
            if !(1..=MAX_TOKEN_DURATION_SECS).contains(&secs) {
                return Err(CoreError::ConfigError(format!(
                    "{name} must be between 1 and {MAX_TOKEN_DURATION_SECS}"
                )));
            }
        }
        Ok(())
    }
}

/// ## Summary
/// Loads configuration from environment variables and `.env` file.
///
/// ## Errors
/// Returns an error if loading or deserializing the configuration fails.
pub fn load_config() -> Result<Settings> {
    if let Err(err) = dotenvy::dotenv() {
        tracing::debug!(error = %err, "No .env file loaded");
    }

    Settings::load()
}

#[cfg(test)]
mod tests;
