//! Configuration management for fnkit
//!
//! Loads configuration with priority:
//! 1. Environment variable overrides (`FNKIT_*`)
//! 2. fnkit.toml (or a specified config file)
//! 3. Defaults

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "fnkit.toml";

/// fnkit configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FnkitConfig {
    #[serde(default)]
    pub registry: RegistryConfig,

    #[serde(default)]
    pub dispatch: DispatchConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// What the registry does when a name is registered twice
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// The later descriptor replaces the earlier one
    #[default]
    LastWriterWins,
    /// The later registration fails with `Error::DuplicateFunction`
    Reject,
}

impl std::str::FromStr for DuplicatePolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "last_writer_wins" | "overwrite" => Ok(DuplicatePolicy::LastWriterWins),
            "reject" | "error" => Ok(DuplicatePolicy::Reject),
            other => Err(anyhow!("unknown duplicate policy '{}'", other)),
        }
    }
}

/// Registry configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistryConfig {
    #[serde(default)]
    pub duplicate_policy: DuplicatePolicy,
}

/// Dispatcher configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Accept numeric/boolean strings for numeric/boolean parameters and
    /// stringify scalars passed to string parameters. Off by default, so a
    /// JSON type that does not match the schema is an argument type mismatch
    #[serde(default = "default_lenient_scalars")]
    pub lenient_scalars: bool,

    /// Upper bound on error text relayed back to the model
    #[serde(default = "default_max_error_message_len")]
    pub max_error_message_len: usize,

    /// Include raw arguments in debug logs
    #[serde(default)]
    pub log_arguments: bool,
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "compact" => Ok(LogFormat::Compact),
            "json" => Ok(LogFormat::Json),
            other => Err(anyhow!("unknown log format '{}'", other)),
        }
    }
}

/// Observability configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// `EnvFilter` directives, e.g. `info,fnkit_function=debug`
    #[serde(default = "default_log_filter")]
    pub log_filter: String,

    #[serde(default)]
    pub log_format: LogFormat,

    /// Install the OpenTelemetry tracing layer
    #[serde(default)]
    pub otel_enabled: bool,

    pub service_name: Option<String>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            lenient_scalars: default_lenient_scalars(),
            max_error_message_len: default_max_error_message_len(),
            log_arguments: false,
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter(),
            log_format: LogFormat::default(),
            otel_enabled: false,
            service_name: None,
        }
    }
}

impl FnkitConfig {
    /// Load configuration from fnkit.toml in the current directory or one of
    /// its parents
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Like [`FnkitConfig::load`], falling back to defaults (plus environment
    /// overrides) when no config file exists
    pub fn load_or_default() -> Result<Self> {
        match Self::find_config_file() {
            Some(path) => Self::load_from(Some(&path)),
            None => {
                let mut config = Self::default();
                config.apply_env_overrides()?;
                Ok(config)
            }
        }
    }

    /// Load configuration from a specific file
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::find_config_file().ok_or_else(|| {
                anyhow!(
                    "{} not found. Create one with: cp fnkit.toml.example {}",
                    CONFIG_FILE_NAME,
                    CONFIG_FILE_NAME
                )
            })?,
        };

        tracing::debug!("Loading configuration from: {:?}", config_path);

        let contents = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

        let mut config = Self::from_toml_str(&contents)
            .with_context(|| format!("Failed to parse config file: {:?}", config_path))?;

        config.apply_env_overrides()?;

        Ok(config)
    }

    /// Parse configuration from TOML text, resolving `${VAR}` references
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let mut config: FnkitConfig = toml::from_str(contents)?;
        config.resolve_env_vars();
        Ok(config)
    }

    /// Find fnkit.toml by searching current directory and parents
    fn find_config_file() -> Option<PathBuf> {
        let mut current = env::current_dir().ok()?;

        loop {
            let config_path = current.join(CONFIG_FILE_NAME);
            if config_path.exists() {
                return Some(config_path);
            }

            if !current.pop() {
                return None;
            }
        }
    }

    /// Resolve ${VAR_NAME} references to environment variables
    fn resolve_env_vars(&mut self) {
        self.observability.log_filter = Self::resolve_env_var(&self.observability.log_filter)
            .unwrap_or_else(default_log_filter);

        if let Some(ref name) = self.observability.service_name {
            self.observability.service_name = Self::resolve_env_var(name);
        }
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(policy) = env::var("FNKIT_DUPLICATE_POLICY") {
            self.registry.duplicate_policy = policy
                .parse()
                .context("Invalid FNKIT_DUPLICATE_POLICY")?;
        }

        if let Ok(filter) = env::var("FNKIT_LOG") {
            self.observability.log_filter = filter;
        }

        if let Ok(format) = env::var("FNKIT_LOG_FORMAT") {
            self.observability.log_format =
                format.parse().context("Invalid FNKIT_LOG_FORMAT")?;
        }

        Ok(())
    }

    /// Resolve a single ${VAR_NAME} reference
    fn resolve_env_var(value: &str) -> Option<String> {
        if value.starts_with("${") && value.ends_with('}') {
            let var_name = &value[2..value.len() - 1];
            env::var(var_name).ok()
        } else {
            Some(value.to_string())
        }
    }
}

fn default_lenient_scalars() -> bool {
    false
}

fn default_max_error_message_len() -> usize {
    512
}

fn default_log_filter() -> String {
    "info".to_string()
}
