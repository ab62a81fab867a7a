//! Process-level plumbing shared by the Taskboard binaries: layered
//! configuration, logging bootstrap and home directory resolution.

pub mod config;
pub mod logging;
pub mod paths;

pub use config::{
    default_logging_config, AppConfig, AppConfigProvider, CliArgs, DatabaseConfig, LoggingConfig,
    Section, ServerConfig,
};
