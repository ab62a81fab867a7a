use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum HomeDirError {
    #[error("cannot determine user home: {var} is not set")]
    MissingEnv { var: &'static str },

    #[error("failed to create home directory '{path}': {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(target_os = "windows")]
const HOME_VAR: &str = "APPDATA";
#[cfg(not(target_os = "windows"))]
const HOME_VAR: &str = "HOME";

fn user_home() -> Result<PathBuf, HomeDirError> {
    std::env::var_os(HOME_VAR)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .ok_or(HomeDirError::MissingEnv { var: HOME_VAR })
}

/// Resolve the server home directory into an absolute path.
///
/// - `None` resolves to `<user home>/<default_subdir>`.
/// - A leading `~` is expanded against the user home.
/// - Relative paths are resolved against the current working directory.
///
/// When `create` is set the directory is created if missing.
pub fn resolve_home_dir(
    configured: Option<String>,
    default_subdir: &str,
    create: bool,
) -> Result<PathBuf, HomeDirError> {
    let path = match configured.as_deref().map(str::trim) {
        None | Some("") => user_home()?.join(default_subdir),
        Some("~") => user_home()?,
        Some(raw) => match raw.strip_prefix("~/").or_else(|| raw.strip_prefix("~\\")) {
            Some(rest) => user_home()?.join(rest),
            None => absolutize(Path::new(raw)),
        },
    };

    if create {
        std::fs::create_dir_all(&path).map_err(|source| HomeDirError::Create {
            path: path.clone(),
            source,
        })?;
    }
    Ok(path)
}

fn absolutize(p: &Path) -> PathBuf {
    if p.is_absolute() {
        return p.to_path_buf();
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(p))
        .unwrap_or_else(|_| p.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn absolute_path_is_kept_and_created() {
        let tmp = tempdir().unwrap();
        let target = tmp.path().join("srv/home");
        let resolved =
            resolve_home_dir(Some(target.to_string_lossy().to_string()), ".taskboard", true)
                .unwrap();
        assert_eq!(resolved, target);
        assert!(resolved.is_dir());
    }

    #[test]
    fn relative_path_becomes_absolute() {
        let resolved = resolve_home_dir(Some("some/rel".into()), ".taskboard", false).unwrap();
        assert!(resolved.is_absolute());
        assert!(resolved.ends_with("some/rel"));
    }
}
