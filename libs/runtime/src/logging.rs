use crate::config::{LoggingConfig, Section};
use std::{
    collections::HashMap,
    io::{IsTerminal, Write},
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    filter::FilterFn,
    fmt,
    layer::SubscriberExt,
    util::SubscriberInitExt,
    Layer, Registry,
};

use file_rotate::{
    compression::Compression,
    suffix::{AppendTimestamp, FileLimit},
    ContentLimit, FileRotate,
};

const DEFAULT_SECTION: &str = "default";
const DEFAULT_MAX_SIZE_MB: u64 = 100;
const DEFAULT_MAX_BACKUPS: usize = 3;

/// Parse a level name. `None` means the sink is switched off;
/// unknown names fall back to INFO.
fn parse_level(s: &str) -> Option<LevelFilter> {
    match s.trim().to_ascii_lowercase().as_str() {
        "trace" => Some(LevelFilter::TRACE),
        "debug" => Some(LevelFilter::DEBUG),
        "info" => Some(LevelFilter::INFO),
        "warn" => Some(LevelFilter::WARN),
        "error" => Some(LevelFilter::ERROR),
        "off" | "none" | "" => None,
        _ => Some(LevelFilter::INFO),
    }
}

/// True if `target` is `prefix` itself or a path below it (`prefix::...`).
fn matches_prefix(target: &str, prefix: &str) -> bool {
    target
        .strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with("::"))
}

/// Resolve a log file path against `base_dir` (server.home_dir).
fn resolve_log_path(file: &str, base_dir: &Path) -> PathBuf {
    let p = Path::new(file);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base_dir.join(p)
    }
}

// -------- rotating file sinks --------

type SharedRotate = Arc<Mutex<FileRotate<AppendTimestamp>>>;

#[derive(Clone)]
struct RotatingFile(SharedRotate);

impl Write for RotatingFile {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match self.0.lock() {
            Ok(mut f) => f.write(buf),
            // A poisoned sink drops the record rather than taking the process down.
            Err(_) => Ok(buf.len()),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match self.0.lock() {
            Ok(mut f) => f.flush(),
            Err(_) => Ok(()),
        }
    }
}

fn open_rotating_file(path: &Path, section: &Section) -> std::io::Result<RotatingFile> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let max_bytes = section.max_size_mb.unwrap_or(DEFAULT_MAX_SIZE_MB) * 1024 * 1024;
    let backups = section.max_backups.unwrap_or(DEFAULT_MAX_BACKUPS);

    let rot = FileRotate::new(
        path,
        AppendTimestamp::default(FileLimit::MaxFiles(backups)),
        ContentLimit::BytesSurpassed(max_bytes as usize),
        Compression::None,
        #[cfg(unix)]
        None,
    );
    Ok(RotatingFile(Arc::new(Mutex::new(rot))))
}

/// Sends each record to the file of the subsystem its target belongs to,
/// falling back to the default file. Records with no destination are dropped.
#[derive(Clone, Default)]
struct FileRouter {
    default: Option<RotatingFile>,
    by_prefix: HashMap<String, RotatingFile>,
}

impl FileRouter {
    fn route(&self, target: &str) -> Option<RotatingFile> {
        self.by_prefix
            .iter()
            .find(|(prefix, _)| matches_prefix(target, prefix))
            .map(|(_, sink)| sink.clone())
            .or_else(|| self.default.clone())
    }

    fn is_empty(&self) -> bool {
        self.default.is_none() && self.by_prefix.is_empty()
    }
}

struct MaybeFile(Option<RotatingFile>);

impl Write for MaybeFile {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match &mut self.0 {
            Some(f) => f.write(buf),
            None => Ok(buf.len()),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match &mut self.0 {
            Some(f) => f.flush(),
            None => Ok(()),
        }
    }
}

impl<'a> fmt::MakeWriter<'a> for FileRouter {
    type Writer = MaybeFile;

    fn make_writer(&'a self) -> Self::Writer {
        MaybeFile(self.default.clone())
    }

    fn make_writer_for(&'a self, meta: &tracing::Metadata<'_>) -> Self::Writer {
        MaybeFile(self.route(meta.target()))
    }
}

// -------- filters --------

/// Per-subsystem levels plus a default level applied only to targets that
/// belong to none of the named subsystems.
#[derive(Debug, Clone, Default)]
struct LevelPlan {
    explicit: Vec<(String, LevelFilter)>,
    default: Option<LevelFilter>,
}

impl LevelPlan {
    fn console(cfg: &LoggingConfig) -> Self {
        Self::build(cfg, |s| parse_level(&s.console_level))
    }

    fn file(cfg: &LoggingConfig) -> Self {
        Self::build(cfg, |s| {
            if s.file.trim().is_empty() {
                None
            } else {
                parse_level(&s.file_level)
            }
        })
    }

    fn build(cfg: &LoggingConfig, level_of: impl Fn(&Section) -> Option<LevelFilter>) -> Self {
        let explicit = cfg
            .iter()
            .filter(|(name, _)| name.as_str() != DEFAULT_SECTION)
            .filter_map(|(name, section)| level_of(section).map(|lvl| (name.clone(), lvl)))
            .collect();
        let default = cfg.get(DEFAULT_SECTION).and_then(level_of);
        Self { explicit, default }
    }

    fn enabled(&self, meta: &tracing::Metadata<'_>) -> bool {
        let target = meta.target();
        for (prefix, level) in &self.explicit {
            if matches_prefix(target, prefix) {
                return meta.level() <= level;
            }
        }
        self.default.is_some_and(|level| meta.level() <= &level)
    }

    fn into_filter(self, all_named: Vec<String>) -> FilterFn<impl Fn(&tracing::Metadata<'_>) -> bool> {
        FilterFn::new(move |meta: &tracing::Metadata<'_>| {
            let target = meta.target();
            let named = all_named.iter().any(|n| matches_prefix(target, n));
            if named && !self.explicit.iter().any(|(p, _)| matches_prefix(target, p)) {
                // A named subsystem switched off for this sink.
                return false;
            }
            self.enabled(meta)
        })
    }
}

fn build_file_router(cfg: &LoggingConfig, base_dir: &Path) -> FileRouter {
    let mut router = FileRouter::default();
    for (name, section) in cfg {
        if section.file.trim().is_empty() {
            continue;
        }
        let path = resolve_log_path(&section.file, base_dir);
        match open_rotating_file(&path, section) {
            Ok(sink) if name == DEFAULT_SECTION => router.default = Some(sink),
            Ok(sink) => {
                router.by_prefix.insert(name.clone(), sink);
            }
            Err(e) => eprintln!(
                "Failed to open log file '{}' for '{}': {}",
                path.display(),
                name,
                e
            ),
        }
    }
    router
}

// -------- public init --------

/// Initialize logging from configuration.
/// - `cfg`: subsystem sections, `default` being the catch-all
/// - `base_dir`: used to resolve relative log file paths (usually server.home_dir)
pub fn init_logging_from_config(cfg: &LoggingConfig, base_dir: &Path) {
    // Bridge `log` → `tracing` before installing the subscriber
    let _ = tracing_log::LogTracer::init();

    if cfg.is_empty() {
        init_default_logging();
        return;
    }

    let named: Vec<String> = cfg
        .keys()
        .filter(|k| k.as_str() != DEFAULT_SECTION)
        .cloned()
        .collect();

    let console_layer = fmt::layer()
        .with_ansi(std::io::stdout().is_terminal())
        .with_target(true)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .with_filter(LevelPlan::console(cfg).into_filter(named.clone()));

    let router = build_file_router(cfg, base_dir);
    let file_layer = (!router.is_empty()).then(|| {
        fmt::layer()
            .json()
            .with_ansi(false)
            .with_target(true)
            .with_timer(fmt::time::UtcTime::rfc_3339())
            .with_writer(router)
            .with_filter(LevelPlan::file(cfg).into_filter(named))
    });

    let _ = Registry::default()
        .with(console_layer)
        .with(file_layer)
        .try_init();
}

fn init_default_logging() {
    let _ = fmt()
        .with_target(true)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_logging_config;
    use tempfile::tempdir;

    fn section(console: &str, file: &str, file_level: &str) -> Section {
        Section {
            console_level: console.into(),
            file: file.into(),
            file_level: file_level.into(),
            max_backups: Some(2),
            max_size_mb: Some(1),
        }
    }

    #[test]
    fn level_parsing() {
        assert_eq!(parse_level("trace"), Some(LevelFilter::TRACE));
        assert_eq!(parse_level("DEBUG"), Some(LevelFilter::DEBUG));
        assert_eq!(parse_level("Info"), Some(LevelFilter::INFO));
        assert_eq!(parse_level("warn"), Some(LevelFilter::WARN));
        assert_eq!(parse_level("ERROR"), Some(LevelFilter::ERROR));
        assert_eq!(parse_level("off"), None);
        assert_eq!(parse_level(""), None);
        assert_eq!(parse_level("bogus"), Some(LevelFilter::INFO));
    }

    #[test]
    fn prefix_matching_respects_path_boundaries() {
        assert!(matches_prefix("projects", "projects"));
        assert!(matches_prefix("projects::domain::service", "projects"));
        assert!(!matches_prefix("projects_extra", "projects"));
        assert!(!matches_prefix("api_ingress", "projects"));
    }

    #[test]
    fn file_plan_skips_sections_without_file() {
        let mut cfg = default_logging_config();
        cfg.insert("projects".into(), section("debug", "", "trace"));
        cfg.insert("api_ingress".into(), section("info", "logs/api.log", "warn"));

        let plan = LevelPlan::file(&cfg);
        assert_eq!(plan.default, Some(LevelFilter::DEBUG));
        assert_eq!(plan.explicit, vec![("api_ingress".to_string(), LevelFilter::WARN)]);
    }

    #[test]
    fn log_paths_resolve_against_home_dir() {
        let tmp = tempdir().unwrap();
        let resolved = resolve_log_path("logs/test.log", tmp.path());
        assert!(resolved.starts_with(tmp.path()));
        assert!(resolved.ends_with("logs/test.log"));

        let abs = tmp.path().join("abs.log");
        assert_eq!(resolve_log_path(&abs.to_string_lossy(), Path::new("/elsewhere")), abs);
    }

    #[test]
    fn router_creates_parent_dirs_and_routes_by_prefix() {
        let tmp = tempdir().unwrap();
        let mut cfg = LoggingConfig::new();
        cfg.insert("default".into(), section("info", "logs/all.log", "debug"));
        cfg.insert("projects".into(), section("info", "nested/dir/projects.log", "debug"));

        let router = build_file_router(&cfg, tmp.path());
        assert!(tmp.path().join("nested/dir").is_dir());
        assert!(router.route("projects::domain").is_some());
        assert!(router.route("directory").is_some());
        assert_eq!(router.by_prefix.len(), 1);
    }
}
