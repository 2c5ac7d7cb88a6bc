use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::logging::LogFormat;
use crate::models::OutputFormat;
use crate::tracker::ProjectFilter;
use crate::validation::{InputValidator, MAX_SKIP_ROWS};

/// Prefix for environment overrides, e.g. `VENDOR_COMPLIANCE__INGEST__SOON_TO_EXPIRE_DAYS`
pub const ENV_PREFIX: &str = "VENDOR_COMPLIANCE";

/// Application configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub ingest: IngestConfig,
    pub search: SearchConfig,
    pub export: ExportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub connection_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file_path: Option<String>,
    pub format: String, // "json" or "text"
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Warning window for upcoming expirations, in days
    pub soon_to_expire_days: i64,
    /// Preamble rows before the details-sheet header
    pub details_skip_rows: usize,
    /// Which certificate rows survive tracking
    pub project_filter: ProjectFilter,
    pub max_upload_mb: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Minimum Jaro-Winkler similarity for fuzzy matches
    pub fuzzy_threshold: f64,
    pub max_results: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    pub default_format: String,
    pub output_directory: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:data/vendors.db".to_string(),
            max_connections: 4,
            connection_timeout_secs: 30,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file_path: None,
            format: "text".to_string(),
        }
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            soon_to_expire_days: 30,
            details_skip_rows: 2,
            project_filter: ProjectFilter::default(),
            max_upload_mb: 25,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            fuzzy_threshold: crate::search::DEFAULT_FUZZY_THRESHOLD,
            max_results: 500,
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            default_format: "txt".to_string(),
            output_directory: "./output".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from multiple sources with precedence
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration, layering `extra` (if given) above the standard files
    pub fn load_from(extra: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder()
            .add_source(
                Config::try_from(&Self::default())
                    .map_err(|e| anyhow::anyhow!("Failed to build default configuration: {}", e))?,
            )
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(File::with_name("vendor-compliance").required(false));

        if let Some(path) = extra {
            builder = builder.add_source(File::from(path).required(true));
        }

        let config = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

        let app_config: Self = config
            .try_deserialize()
            .map_err(|e| anyhow::anyhow!("Failed to deserialize configuration: {}", e))?;

        app_config.validate()?;

        Ok(app_config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        InputValidator::validate_database_url(&self.database.url)?;
        if self.database.max_connections == 0 {
            return Err(anyhow::anyhow!("max_connections must be greater than 0"));
        }
        if self.database.connection_timeout_secs == 0 {
            return Err(anyhow::anyhow!("connection_timeout_secs must be greater than 0"));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid log level: {}. Must be one of: {:?}",
                self.logging.level,
                valid_levels
            ));
        }
        LogFormat::from_str(&self.logging.format)?;

        if self.ingest.soon_to_expire_days <= 0 {
            return Err(anyhow::anyhow!("soon_to_expire_days must be greater than 0"));
        }
        if self.ingest.details_skip_rows > MAX_SKIP_ROWS {
            return Err(anyhow::anyhow!("details_skip_rows must be at most {}", MAX_SKIP_ROWS));
        }
        if self.ingest.max_upload_mb == 0 {
            return Err(anyhow::anyhow!("max_upload_mb must be greater than 0"));
        }

        InputValidator::validate_threshold(self.search.fuzzy_threshold)?;
        if self.search.max_results == 0 {
            return Err(anyhow::anyhow!("max_results must be greater than 0"));
        }

        OutputFormat::from_str(&self.export.default_format)?;

        Ok(())
    }

    /// Get database URL from environment or config
    pub fn get_database_url(&self) -> String {
        std::env::var("DATABASE_URL").unwrap_or_else(|_| self.database.url.clone())
    }

    /// Get log level from environment or config
    pub fn get_log_level(&self) -> String {
        std::env::var("RUST_LOG").unwrap_or_else(|_| self.logging.level.clone())
    }

    /// Parsed log format; validated on load
    pub fn log_format(&self) -> LogFormat {
        LogFormat::from_str(&self.logging.format).unwrap_or_default()
    }

    pub fn log_file(&self) -> Option<PathBuf> {
        self.logging.file_path.as_deref().filter(|p| !p.is_empty()).map(PathBuf::from)
    }

    pub fn connection_timeout(&self) -> Duration {
        Duration::from_secs(self.database.connection_timeout_secs)
    }

    /// Parsed default export format; validated on load
    pub fn export_format(&self) -> OutputFormat {
        OutputFormat::from_str(&self.export.default_format).unwrap_or(OutputFormat::Txt)
    }
}
