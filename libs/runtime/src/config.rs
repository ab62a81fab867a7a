use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::paths::resolve_home_dir;

const DEFAULT_SUBDIR: &str = ".taskboard";

/// Main application configuration with strongly-typed global sections
/// and a flexible per-module configuration bag.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Core server configuration.
    pub server: ServerConfig,
    /// Database configuration (optional).
    pub database: Option<DatabaseConfig>,
    /// Logging configuration (optional, uses defaults if None).
    pub logging: Option<LoggingConfig>,
    /// Directory containing per-module YAML files (optional).
    #[serde(default)]
    pub modules_dir: Option<String>,
    /// Per-module configuration bag: module_name → arbitrary JSON/YAML value.
    #[serde(default)]
    pub modules: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    pub home_dir: String, // normalized to an absolute path on load
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub timeout_sec: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Connection URL, e.g. "sqlite://database/taskboard.db" or "sqlite::memory:".
    pub url: String,
    /// Maximum number of pooled connections (defaults to 10).
    pub max_conns: Option<u32>,
    /// SQLite busy timeout in milliseconds (defaults to 5000).
    pub busy_timeout_ms: Option<u32>,
}

/// Logging configuration - maps subsystem names to their logging settings.
/// Key "default" is the catch-all for logs that don't match explicit subsystems.
pub type LoggingConfig = HashMap<String, Section>;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Section {
    pub console_level: String, // "info", "debug", "error", "off"
    pub file: String,          // "logs/api.log"
    #[serde(default)]
    pub file_level: String,
    #[serde(default)]
    pub max_backups: Option<usize>,
    #[serde(default)]
    pub max_size_mb: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            // Empty => $HOME/.taskboard (%APPDATA%/.taskboard on Windows)
            home_dir: String::new(),
            host: "127.0.0.1".to_string(),
            port: 5000,
            timeout_sec: 0,
        }
    }
}

/// Create a default logging configuration.
pub fn default_logging_config() -> LoggingConfig {
    let mut logging = HashMap::new();
    logging.insert(
        "default".to_string(),
        Section {
            console_level: "info".to_string(),
            file: "logs/taskboard.log".to_string(),
            file_level: "debug".to_string(),
            max_backups: Some(3),
            max_size_mb: Some(100),
        },
    );
    logging
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            database: Some(DatabaseConfig {
                url: "sqlite://database/taskboard.db".to_string(),
                max_conns: Some(10),
                busy_timeout_ms: Some(5000),
            }),
            logging: Some(default_logging_config()),
            modules_dir: None,
            modules: HashMap::new(),
        }
    }
}

impl AppConfig {
    /// Layered loading: defaults → YAML file → environment variables.
    /// `server.home_dir` is normalized into an absolute path and created.
    pub fn load_layered<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        use figment::{
            providers::{Env, Format, Serialized, Yaml},
            Figment,
        };

        // Optional sections stay None unless YAML/ENV provide them.
        let base = AppConfig {
            server: ServerConfig::default(),
            database: None,
            logging: None,
            modules_dir: None,
            modules: HashMap::new(),
        };

        let config_path = config_path.as_ref();
        if !config_path.is_file() {
            anyhow::bail!("Config file not found: {}", config_path.display());
        }

        let figment = Figment::new()
            .merge(Serialized::defaults(base))
            .merge(Yaml::file(config_path))
            // APP__SERVER__PORT=5001 maps to server.port
            .merge(Env::prefixed("APP__").split("__"));

        let mut config: AppConfig = figment
            .extract()
            .context("Failed to extract config from figment")?;

        normalize_home_dir_inplace(&mut config.server)
            .context("Failed to resolve server.home_dir")?;

        if let Some(dir) = config.modules_dir.clone() {
            merge_module_files(&mut config.modules, dir)?;
        }

        Ok(config)
    }

    /// Load configuration from file or fall back to defaults.
    pub fn load_or_default<P: AsRef<Path>>(config_path: Option<P>) -> Result<Self> {
        match config_path {
            Some(path) => Self::load_layered(path),
            None => {
                let mut c = Self::default();
                normalize_home_dir_inplace(&mut c.server)
                    .context("Failed to resolve server.home_dir (defaults)")?;
                Ok(c)
            }
        }
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize config to YAML")
    }

    /// Apply overrides from command line arguments.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(port) = args.port {
            self.server.port = port;
        }

        let logging = self.logging.get_or_insert_with(default_logging_config);
        if let Some(default_section) = logging.get_mut("default") {
            match args.verbose {
                0 => {}
                1 => default_section.console_level = "debug".to_string(),
                _ => default_section.console_level = "trace".to_string(),
            }
        }
    }
}

/// Command line arguments relevant to configuration.
#[derive(Debug, Clone)]
pub struct CliArgs {
    pub config: Option<String>,
    pub port: Option<u16>,
    pub print_config: bool,
    pub verbose: u8,
    pub mock: bool,
}

/// Read-only view over the per-module configuration bag.
#[derive(Debug, Clone)]
pub struct AppConfigProvider {
    config: AppConfig,
}

impl AppConfigProvider {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn get_module_config(&self, module_name: &str) -> Option<&serde_json::Value> {
        self.config.modules.get(module_name)
    }

    pub fn app_config(&self) -> &AppConfig {
        &self.config
    }
}

fn normalize_home_dir_inplace(server: &mut ServerConfig) -> Result<()> {
    let configured = if server.home_dir.trim().is_empty() {
        None
    } else {
        Some(server.home_dir.clone())
    };

    let resolved: PathBuf = resolve_home_dir(configured, DEFAULT_SUBDIR, true)
        .context("home_dir normalization failed")?;

    server.home_dir = resolved.to_string_lossy().to_string();
    Ok(())
}

fn merge_module_files(
    bag: &mut HashMap<String, serde_json::Value>,
    dir: impl AsRef<Path>,
) -> Result<()> {
    let dir = dir.as_ref();
    if !dir.exists() {
        return Ok(());
    }
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let is_yaml = path
            .extension()
            .and_then(|s| s.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("yml") || ext.eq_ignore_ascii_case("yaml"))
            .unwrap_or(false);
        if !is_yaml {
            continue;
        }
        let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read module config {}", path.display()))?;
        let val: serde_yaml::Value = serde_yaml::from_str(&raw)
            .with_context(|| format!("Invalid YAML in {}", path.display()))?;
        bag.insert(name.to_string(), serde_json::to_value(val)?);
    }
    Ok(())
}
