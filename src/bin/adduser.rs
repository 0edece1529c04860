//! Provision a reviewer account.
//!
//! Usage: `upreview-adduser <username> [DB_PATH]`. The password is read from
//! the terminal twice without echo and stored as its SHA-256 hex digest.

use std::path::PathBuf;
use std::process::ExitCode;

use upreview_lib::auth::provision_reviewer;
use upreview_lib::db::ReviewDb;
use upreview_lib::state::load_config;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let Some(username) = args.next().filter(|u| !u.trim().is_empty()) else {
        eprintln!("usage: upreview-adduser <username> [DB_PATH]");
        return ExitCode::from(2);
    };

    let db = match args.next() {
        Some(path) => ReviewDb::open_at(PathBuf::from(path)),
        None => match load_config() {
            Ok(config) => ReviewDb::open(&config),
            Err(e) => {
                log::error!("{e}");
                return ExitCode::FAILURE;
            }
        },
    };
    let db = match db {
        Ok(db) => db,
        Err(e) => {
            log::error!("Failed to open review database: {e}");
            return ExitCode::FAILURE;
        }
    };

    let password = match rpassword::prompt_password("New password: ") {
        Ok(p) if !p.is_empty() => p,
        Ok(_) => {
            eprintln!("Password must not be empty");
            return ExitCode::FAILURE;
        }
        Err(e) => {
            log::error!("Failed to read password: {e}");
            return ExitCode::FAILURE;
        }
    };
    match rpassword::prompt_password("Repeat password: ") {
        Ok(again) if again == password => {}
        Ok(_) => {
            eprintln!("Passwords do not match");
            return ExitCode::FAILURE;
        }
        Err(e) => {
            log::error!("Failed to read password: {e}");
            return ExitCode::FAILURE;
        }
    }

    match provision_reviewer(&db, username.trim(), &password) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("Failed to save reviewer: {e}");
            ExitCode::FAILURE
        }
    }
}
