use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;
use modkit::{DbOptions, ModuleEntry, ModuleRegistry, RunOptions, ShutdownOptions};
use runtime::{AppConfig, AppConfigProvider, CliArgs, DatabaseConfig};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

const MEMORY_DSN: &str = "sqlite::memory:";

/// Expand a sqlite DSN into an absolute-path DSN using a base directory.
/// In-memory DSNs are returned as-is. Without a query string `mode=rwc` is
/// appended so a missing file is created.
fn absolutize_sqlite_dsn(dsn: &str, base_dir: &Path) -> Result<String> {
    if dsn.eq_ignore_ascii_case(MEMORY_DSN) || dsn.eq_ignore_ascii_case("sqlite://:memory:") {
        return Ok(MEMORY_DSN.to_string());
    }
    let db_path = dsn
        .strip_prefix("sqlite://")
        .ok_or_else(|| anyhow!("DSN must start with sqlite:// (got: {})", dsn))?;

    let (path_str, query) = match db_path.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (db_path, None),
    };

    let mut p = PathBuf::from(path_str);
    if p.as_os_str().is_empty() {
        return Err(anyhow!("Empty SQLite path in DSN"));
    }
    if p.is_relative() {
        p = base_dir.join(p);
    }
    if let Some(dir) = p.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create database directory {}", dir.display()))?;
    }

    let mut out = String::from("sqlite://");
    out.push_str(&p.to_string_lossy().replace('\\', "/"));
    out.push('?');
    out.push_str(query.unwrap_or("mode=rwc"));
    Ok(out)
}

/// Taskboard Server - projects, tasks and comments with role-based access
#[derive(Parser)]
#[command(name = "taskboard-server")]
#[command(about = "Taskboard Server - projects, tasks and comments with role-based access")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port for HTTP server (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Print current configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Use an in-memory database instead of the configured one
    #[arg(long)]
    mock: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Run,
    /// Check configuration
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let args = CliArgs {
        config: cli.config.as_ref().map(|p| p.to_string_lossy().to_string()),
        port: cli.port,
        print_config: cli.print_config,
        verbose: cli.verbose,
        mock: cli.mock,
    };

    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    config.apply_cli_overrides(&args);
    sync_bind_addr(&mut config, args.port.is_some())?;

    let logging_config = config.logging.as_ref().cloned().unwrap_or_default();
    runtime::logging::init_logging_from_config(&logging_config, Path::new(&config.server.home_dir));
    tracing::info!("Taskboard Server starting");

    if cli.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_server(config, args).await,
        Commands::Check => check_config(&config, &args),
    }
}

/// `modules.api_ingress.bind_addr` falls back to `server.host:server.port`;
/// an explicit `--port` always wins.
fn sync_bind_addr(config: &mut AppConfig, port_overridden: bool) -> Result<()> {
    let derived = format!("{}:{}", config.server.host, config.server.port);
    let section = config
        .modules
        .entry(api_ingress::MODULE_NAME.to_string())
        .or_insert_with(|| serde_json::json!({}));
    let obj = section
        .as_object_mut()
        .ok_or_else(|| anyhow!("modules.{} must be a mapping", api_ingress::MODULE_NAME))?;

    if port_overridden || !obj.contains_key("bind_addr") {
        obj.insert("bind_addr".to_string(), serde_json::Value::String(derived));
    }
    Ok(())
}

/// Only SQLite is wired in; other schemes are rejected up front.
fn detect_from_dsn(cfg: &DatabaseConfig) -> Result<&'static str> {
    let raw = cfg.url.trim();
    if raw.is_empty() {
        return Err(anyhow!("Database URL not configured"));
    }
    if raw.eq_ignore_ascii_case(MEMORY_DSN) {
        return Ok("sqlite");
    }

    let url = Url::parse(raw).map_err(|e| anyhow!("Invalid database DSN '{}': {}", raw, e))?;
    match url.scheme() {
        "sqlite" => Ok("sqlite"),
        other => Err(anyhow!("Unsupported database type: {}", other)),
    }
}

async fn connect_db(config: &AppConfig, args: &CliArgs) -> Result<DatabaseConnection> {
    let (dsn, max_conns, busy_timeout_ms) = if args.mock {
        // Every pooled connection would get its own empty in-memory database.
        (MEMORY_DSN.to_string(), 1, None)
    } else {
        let db_config = config
            .database
            .as_ref()
            .ok_or_else(|| anyhow!("No database configuration found (use --mock to run in memory)"))?;
        detect_from_dsn(db_config)?;
        let dsn = absolutize_sqlite_dsn(db_config.url.trim(), Path::new(&config.server.home_dir))?;
        (
            dsn,
            db_config.max_conns.unwrap_or(10),
            db_config.busy_timeout_ms,
        )
    };

    let mut opts = ConnectOptions::new(dsn.clone());
    opts.max_connections(max_conns)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(5))
        .sqlx_logging(false);
    if let Some(ms) = busy_timeout_ms {
        let busy = Duration::from_millis(u64::from(ms));
        opts.map_sqlx_sqlite_opts(move |o| o.busy_timeout(busy));
    }

    tracing::info!("Connecting to database: {}", dsn);
    Database::connect(opts)
        .await
        .with_context(|| format!("Failed to connect to database '{dsn}'"))
}

/// Init order follows the `depends_on` edges: the directory registers its
/// client before projects looks it up.
fn build_registry() -> Result<ModuleRegistry> {
    let dir = Arc::new(directory::Directory::default());
    let proj = Arc::new(projects::Projects::default());
    let ingress = Arc::new(api_ingress::ApiIngress::default());

    let registry = ModuleRegistry::builder()
        .module(
            ModuleEntry::new(directory::MODULE_NAME, dir.clone())
                .db(dir.clone())
                .rest(dir),
        )
        .module(
            ModuleEntry::new(projects::MODULE_NAME, proj.clone())
                .depends_on(&[directory::MODULE_NAME])
                .db(proj.clone())
                .rest(proj),
        )
        .module(
            ModuleEntry::new(api_ingress::MODULE_NAME, ingress.clone())
                .rest_host(ingress.clone())
                .stateful(ingress),
        )
        .build()?;
    Ok(registry)
}

async fn run_server(config: AppConfig, args: CliArgs) -> Result<()> {
    tracing::info!("Initializing modules...");

    let registry = build_registry()?;
    let db = connect_db(&config, &args).await?;

    let run_options = RunOptions {
        modules_cfg: Arc::new(AppConfigProvider::new(config)),
        db: DbOptions::Connection(db),
        registry,
        shutdown: ShutdownOptions::Signals,
    };

    modkit::run(run_options).await
}

fn check_config(config: &AppConfig, args: &CliArgs) -> Result<()> {
    tracing::info!("Checking configuration...");

    if !args.mock {
        match &config.database {
            Some(db) => {
                detect_from_dsn(db)?;
            }
            None => tracing::warn!("No database configuration found"),
        }
    }

    if let Some(addr) = config
        .modules
        .get(api_ingress::MODULE_NAME)
        .and_then(|m| m.get("bind_addr"))
        .and_then(|v| v.as_str())
    {
        addr.parse::<SocketAddr>()
            .with_context(|| format!("Invalid bind address '{addr}'"))?;
    }

    build_registry()?;

    tracing::info!("Configuration is valid");
    println!("Configuration check passed");
    println!("Server config:");
    println!("{}", config.to_yaml()?);
    Ok(())
}
