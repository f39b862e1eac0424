//! Application state management

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use gymflow_core::{Database, Error, Result, SchedulingConfig};

const DB_FILE: &str = "gymflow.db";
const CONFIG_FILE: &str = "gymflow.toml";

/// Main application state
pub struct AppState {
    db: Database,
    data_dir: PathBuf,
}

impl AppState {
    /// Open state in `data_dir`, or the platform data directory when `None`
    pub fn new(data_dir: Option<PathBuf>) -> Result<Self> {
        let data_dir = match data_dir {
            Some(dir) => dir,
            None => Self::data_path()?,
        };
        Self::open(&data_dir)
    }

    pub fn open(data_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_dir)?;

        let config = SchedulingConfig::load_or_default(&data_dir.join(CONFIG_FILE))?;
        let db = Database::open(data_dir.join(DB_FILE))?.with_config(config);

        tracing::info!(
            data_dir = %data_dir.display(),
            schema_version = db.schema_version(),
            "Database ready"
        );

        Ok(Self {
            db,
            data_dir: data_dir.to_path_buf(),
        })
    }

    fn data_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "gymflow", "gymflow").ok_or_else(|| {
            Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "Could not determine data directory",
            ))
        })?;

        Ok(dirs.data_dir().to_path_buf())
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gymflow_core::OrphanPolicy;
    use tempfile::TempDir;

    #[test]
    fn test_open_creates_database() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("nested");
        let state = AppState::open(&dir).unwrap();

        assert!(dir.join(DB_FILE).exists());
        assert_eq!(state.data_dir(), dir.as_path());
        assert_eq!(state.db().config(), &SchedulingConfig::default());
    }

    #[test]
    fn test_open_reads_config_file() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join(CONFIG_FILE),
            "[propagation]\norphan_policy = \"deactivate\"\n",
        )
        .unwrap();

        let state = AppState::new(Some(temp.path().to_path_buf())).unwrap();
        assert_eq!(
            state.db().config().propagation.orphan_policy,
            OrphanPolicy::Deactivate
        );
    }

    #[test]
    fn test_bad_config_fails() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join(CONFIG_FILE), "generation = 3").unwrap();
        assert!(matches!(
            AppState::open(temp.path()),
            Err(Error::Config(_))
        ));
    }
}
