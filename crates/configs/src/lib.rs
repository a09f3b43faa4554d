//! # configs
//!
//! Layered application configuration. Values resolve, lowest priority
//! first, from struct defaults, an optional `post-notes.toml`, then
//! `POST_NOTES__SECTION__KEY` environment variables (after `.env` is
//! loaded by `dotenvy`).

pub mod error;
pub mod telemetry;

use std::path::{Path, PathBuf};

use serde::Deserialize;

pub use error::ConfigError;

/// Default config file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "post-notes.toml";
/// Environment variable prefix.
pub const ENV_PREFIX: &str = "POST_NOTES";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub storage: StorageConfig,
    pub sidebar: SidebarConfig,
    pub viewport: ViewportConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Memory,
    File,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Location of the JSON file for the `file` backend
    pub path: Option<PathBuf>,
    /// Byte cap for the `memory` backend
    pub quota_bytes: Option<usize>,
}

/// Home page sidebar behaviour.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SidebarConfig {
    /// CSS width when open
    pub width: String,
    /// Pad the body by the sidebar width while open
    pub expand_body: bool,
    /// Show the overlay while open
    pub should_focus: bool,
    /// Viewports this narrow or narrower open the sidebar full screen
    pub min_width_to_full_screen: Option<u32>,
}

impl Default for SidebarConfig {
    fn default() -> Self {
        Self {
            width: "300px".to_string(),
            expand_body: false,
            should_focus: true,
            min_width_to_full_screen: Some(360),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    pub width: u32,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self { width: 1280 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Loads `.env`, then `post-notes.toml` if present, then the environment.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_sources(Some(Path::new(DEFAULT_CONFIG_FILE)))
    }

    /// Builds the configuration from an optional file plus the environment.
    /// A missing file is not an error.
    pub fn from_sources(file: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(config::File::from(path).required(false));
        }
        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        tracing::debug!(?config, "configuration loaded");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage.backend == StorageBackend::File && self.storage.path.is_none() {
            return Err(ConfigError::Invalid(
                "storage.path is required for the file backend".into(),
            ));
        }
        if self.sidebar.width.trim().is_empty() {
            return Err(ConfigError::Invalid("sidebar.width must not be empty".into()));
        }
        Ok(())
    }
}
