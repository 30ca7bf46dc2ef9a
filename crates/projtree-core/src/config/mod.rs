//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section, and every field carries a serde default so an empty file is a
//! valid configuration.

pub mod database;
pub mod deleter;
pub mod lock;
pub mod logging;
pub mod project;
pub mod realtime;

use serde::{Deserialize, Serialize};

pub use self::database::DatabaseConfig;
pub use self::deleter::DeleterConfig;
pub use self::lock::LockConfig;
pub use self::logging::LoggingConfig;
pub use self::project::ProjectLimitsConfig;
pub use self::realtime::RealtimeConfig;

use crate::error::AppError;

/// Root application configuration.
///
/// This struct is the top-level deserialization target for the merged
/// TOML configuration files (default.toml + environment overlay).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Per-project tree limits.
    #[serde(default)]
    pub project: ProjectLimitsConfig,
    /// Project lock settings.
    #[serde(default)]
    pub lock: LockConfig,
    /// Project document store settings.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Soft-deletion retention settings.
    #[serde(default)]
    pub deleter: DeleterConfig,
    /// In-process room broadcast settings.
    #[serde(default)]
    pub realtime: RealtimeConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges the default configuration with an environment-specific overlay
    /// and environment variables prefixed with `PROJTREE__`.
    pub fn load(env: &str) -> Result<Self, AppError> {
        Self::load_from("config", env)
    }

    /// Load configuration from an explicit directory.
    pub fn load_from(dir: &str, env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(&format!("{dir}/default")).required(false))
            .add_source(config::File::with_name(&format!("{dir}/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("PROJTREE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }
}
