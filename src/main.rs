//! upreview console.
//!
//! Usage: `upreview [DB_PATH]`. Without a path the database comes from
//! `~/.upreview/config.json` (`databasePath`) or `~/.upreview/upreview.db`.

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use upreview_lib::state::{load_config, AppState};

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            log::error!("{e}");
            return ExitCode::FAILURE;
        }
    };
    let db_override = std::env::args().nth(1).map(PathBuf::from);

    let state = match AppState::open(config, db_override) {
        Ok(state) => state,
        Err(e) => {
            log::error!("Failed to open review database: {e}");
            return ExitCode::FAILURE;
        }
    };

    let stdin = io::stdin();
    match upreview_lib::run(&state, stdin.lock(), io::stdout(), |prompt| {
        rpassword::prompt_password(prompt)
    }) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("Console I/O failed: {e}");
            ExitCode::FAILURE
        }
    }
}
