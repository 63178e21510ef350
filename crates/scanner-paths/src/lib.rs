//! Resolution of the daemon's externally-configured directories
//! (`INTERNAL_CONFIG_DIR`, `INTERNAL_DATA_DIR`) into validated,
//! canonicalized paths, available process-wide as [`PATHS`].

use std::path::PathBuf;

use scanner_core::ConfigError;
use tracing::{Level, info, instrument};

/// All filesystem locations the daemon needs, resolved once at startup.
#[derive(Debug, Clone)]
pub struct ScannerPaths {
    /// Contains `settings.json`.
    pub config_dir: PathBuf,
    pub settings_file: PathBuf,
    /// Libraries root; every [`scanner_core::Library::path`] is relative to this.
    pub data_dir: PathBuf,
}

impl ScannerPaths {
    #[instrument(name = "ScannerPaths::resolve", level = Level::INFO, err)]
    pub fn resolve() -> Result<Self, ConfigError> {
        let config_dir = required_dir("INTERNAL_CONFIG_DIR")?;
        let data_dir = required_dir("INTERNAL_DATA_DIR")?;
        let settings_file = config_dir.join("settings.json");

        info!(config_dir = %config_dir.display(), data_dir = %data_dir.display(), "resolved paths");

        Ok(ScannerPaths { config_dir, settings_file, data_dir })
    }

    /// Joins a [`scanner_core::Library::path`] (library-relative) onto `data_dir`.
    pub fn library_path(&self, relative: &str) -> PathBuf {
        self.data_dir.join(relative)
    }
}

fn required_dir(var: &'static str) -> Result<PathBuf, ConfigError> {
    let raw = std::env::var(var).map_err(|_| ConfigError::MissingEnv(var))?;
    if raw.trim().is_empty() {
        return Err(ConfigError::EmptyEnv(var));
    }
    let path = PathBuf::from(&raw);
    std::fs::create_dir_all(&path).map_err(|source| ConfigError::Io { path: raw.clone(), source })?;
    path.canonicalize().map_err(|source| ConfigError::Io { path: raw, source })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EnvVarGuard {
        key: &'static str,
        original: Option<String>,
    }

    impl EnvVarGuard {
        fn set(key: &'static str, value: &str) -> Self {
            let original = std::env::var(key).ok();
            unsafe { std::env::set_var(key, value) };
            EnvVarGuard { key, original }
        }
    }

    impl Drop for EnvVarGuard {
        fn drop(&mut self) {
            match &self.original {
                Some(v) => unsafe { std::env::set_var(self.key, v) },
                None => unsafe { std::env::remove_var(self.key) },
            }
        }
    }

    #[test]
    fn missing_config_dir_is_an_error() {
        let _g = EnvVarGuard::set("INTERNAL_CONFIG_DIR", "");
        unsafe { std::env::remove_var("INTERNAL_CONFIG_DIR") };
        let err = ScannerPaths::resolve().unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnv("INTERNAL_CONFIG_DIR")));
    }

    #[test]
    fn resolves_and_canonicalizes_existing_dirs() {
        let tmp = tempfile::tempdir().unwrap();
        let config = tmp.path().join("config");
        let data = tmp.path().join("data");
        let _c = EnvVarGuard::set("INTERNAL_CONFIG_DIR", config.to_str().unwrap());
        let _d = EnvVarGuard::set("INTERNAL_DATA_DIR", data.to_str().unwrap());

        let paths = ScannerPaths::resolve().unwrap();
        assert!(paths.config_dir.exists());
        assert!(paths.data_dir.exists());
        assert_eq!(paths.settings_file, paths.config_dir.join("settings.json"));
    }

    #[test]
    fn library_path_joins_onto_data_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let config = tmp.path().join("config");
        let data = tmp.path().join("data");
        let _c = EnvVarGuard::set("INTERNAL_CONFIG_DIR", config.to_str().unwrap());
        let _d = EnvVarGuard::set("INTERNAL_DATA_DIR", data.to_str().unwrap());

        let paths = ScannerPaths::resolve().unwrap();
        assert_eq!(paths.library_path("A"), paths.data_dir.join("A"));
    }
}
