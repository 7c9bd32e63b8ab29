use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure for Careform
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct CareformConfig {
    /// Submission transport settings
    pub submission: SubmissionConfig,
    /// Persistence settings
    pub persistence: PersistenceConfig,
    /// Observability settings
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SubmissionConfig {
    /// Success probability of the simulated transport (0.0..=1.0)
    pub success_rate: f64,
    /// Simulated transport latency in milliseconds
    pub latency_ms: u64,
    /// Referral reason whose callback date is surfaced on submission
    pub callback_reason: String,
}

impl Default for SubmissionConfig {
    fn default() -> Self {
        Self {
            success_rate: 0.8,
            latency_ms: 250,
            callback_reason: "FlexCare".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PersistenceConfig {
    /// Path to the saved form document
    pub state_file_path: String,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            state_file_path: ".careform/form-state.json".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level used when RUST_LOG is not set
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

impl CareformConfig {
    /// Load configuration with precedence:
    /// 1. Default values
    /// 2. Configuration file (careform.toml)
    /// 3. Environment variables (prefixed with CAREFORM_)
    pub fn load() -> Result<Self> {
        let mut builder = Config::builder();

        if Path::new("careform.toml").exists() {
            builder = builder.add_source(File::with_name("careform"));
        }

        builder = builder.add_source(
            Environment::with_prefix("CAREFORM")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        let careform_config: CareformConfig = config.try_deserialize()?;
        Ok(careform_config)
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::info!("Loaded environment variables from .env file");
        }
        Ok(())
    }
}

/// Global configuration instance
static CONFIG: std::sync::LazyLock<Result<CareformConfig, anyhow::Error>> =
    std::sync::LazyLock::new(|| {
        let _ = CareformConfig::load_env_file();
        CareformConfig::load()
    });

/// Get the global configuration
pub fn config() -> Result<&'static CareformConfig> {
    CONFIG
        .as_ref()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))
}

/// Initialize configuration (called at startup)
pub fn init_config() -> Result<()> {
    let _config = config()?;
    tracing::info!("Configuration loaded successfully");
    Ok(())
}
