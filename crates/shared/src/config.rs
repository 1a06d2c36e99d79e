//! Application configuration management.

use serde::Deserialize;
use std::collections::HashMap;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Per-domain UI permission flags, keyed by domain slug.
    #[serde(default)]
    pub permissions: HashMap<String, TabPermissions>,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Per-tab action visibility flags served to the UI.
///
/// These gate which buttons the caller renders. The lifecycle engine does
/// not consult them; it enforces only its own state-machine guards.
#[derive(Debug, Clone, Copy, Deserialize, serde::Serialize)]
pub struct TabPermissions {
    /// Whether the approve action is offered.
    #[serde(default = "default_flag")]
    pub approve: bool,
    /// Whether the reject action is offered.
    #[serde(default = "default_flag")]
    pub reject: bool,
    /// Whether the edit action is offered.
    #[serde(default = "default_flag")]
    pub edit: bool,
    /// Whether the delete action is offered.
    #[serde(default = "default_flag")]
    pub delete: bool,
}

fn default_flag() -> bool {
    true
}

impl Default for TabPermissions {
    fn default() -> Self {
        Self {
            approve: true,
            reject: true,
            edit: true,
            delete: true,
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("TRESOR").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
