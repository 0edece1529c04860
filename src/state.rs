use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::db::{DbError, ReviewDb};
use crate::session::ReviewSession;
use crate::types::Config;

/// Process state shared by the console: one store handle, one reviewer session.
pub struct AppState {
    pub config: Config,
    pub db: Mutex<ReviewDb>,
    pub session: Mutex<ReviewSession>,
}

impl AppState {
    /// Open the store named by `db_override`, else by `config`.
    pub fn open(config: Config, db_override: Option<PathBuf>) -> Result<Self, DbError> {
        let db = match db_override {
            Some(path) => ReviewDb::open_at(path)?,
            None => ReviewDb::open(&config)?,
        };
        Ok(Self {
            config,
            db: Mutex::new(db),
            session: Mutex::new(ReviewSession::new()),
        })
    }
}

/// Load configuration from ~/.upreview/config.json
pub fn load_config() -> Result<Config, String> {
    let home = dirs::home_dir().ok_or("Could not find home directory")?;
    load_config_from(&home.join(".upreview").join("config.json"))
}

/// Load configuration from an explicit file. A missing file means defaults;
/// an unreadable or malformed one is an error.
pub fn load_config_from(config_path: &Path) -> Result<Config, String> {
    if !config_path.exists() {
        log::info!(
            "No config at {}; using defaults",
            config_path.display()
        );
        return Ok(Config::default());
    }

    let content =
        fs::read_to_string(config_path).map_err(|e| format!("Failed to read config: {}", e))?;

    serde_json::from_str(&content).map_err(|e| format!("Failed to parse config: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_config_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from(&dir.path().join("config.json")).unwrap();
        assert!(config.database_path.is_none());
        assert!(config.reviewer_display_name.is_none());
    }

    #[test]
    fn test_config_file_is_parsed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{ "databasePath": "/data/review.db", "reviewerDisplayName": "Alice R." }"#,
        )
        .unwrap();

        let config = load_config_from(&path).unwrap();
        assert_eq!(config.database_path.as_deref(), Some("/data/review.db"));
        assert_eq!(config.reviewer_display_name.as_deref(), Some("Alice R."));
    }

    #[test]
    fn test_malformed_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();

        let err = load_config_from(&path).unwrap_err();
        assert!(err.contains("Failed to parse config"));
    }

    #[test]
    fn test_app_state_uses_override_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("override.db");
        let state = AppState::open(Config::default(), Some(path.clone())).unwrap();
        assert!(path.exists());
        assert!(state.db.lock().get_all_tickets().unwrap().is_empty());
        assert_eq!(
            state.session.lock().view(),
            crate::session::View::Unauthenticated
        );
    }
}
