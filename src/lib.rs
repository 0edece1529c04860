//! Review queue for Ultimate Parent (Global Ultimate) hierarchy changes.
//!
//! Reviewers log in, walk a filtered queue of change tickets, compare the
//! current and future account snapshots for each, and approve or deny.

pub mod auth;
pub mod console;
pub mod db;
pub mod decision;
pub mod error;
pub mod gateway;
pub mod queue;
pub mod session;
pub mod state;
pub mod types;
pub mod view;

use std::io::{self, BufRead, Write};

use console::ConsoleInput;
use session::{Command, Effect, View};
use state::AppState;

/// Drive an interactive review session over `input`/`output` until `quit`
/// or end of input. `read_password` is asked for the password on `login`.
pub fn run<R, W, P>(state: &AppState, input: R, mut output: W, mut read_password: P) -> io::Result<()>
where
    R: BufRead,
    W: Write,
    P: FnMut(&str) -> io::Result<String>,
{
    writeln!(output, "Ultimate Parent review. Type 'help' for commands.")?;
    write!(output, "> ")?;
    output.flush()?;

    for line in input.lines() {
        let line = line?;
        let parsed = match console::parse_line(&line) {
            Ok(parsed) => parsed,
            Err(msg) => {
                writeln!(output, "{msg}")?;
                write!(output, "> ")?;
                output.flush()?;
                continue;
            }
        };

        let command = match parsed {
            ConsoleInput::Quit => break,
            ConsoleInput::Empty => None,
            ConsoleInput::Help => {
                writeln!(output, "{}", console::HELP)?;
                None
            }
            ConsoleInput::ShowTable | ConsoleInput::ShowReasons
                if state.session.lock().reviewer().is_none() =>
            {
                writeln!(output, "Login required (login <user>)")?;
                None
            }
            ConsoleInput::ShowTable => {
                let session = state.session.lock();
                write!(output, "{}", console::render_full_table(&view::full_table(&session)))?;
                None
            }
            ConsoleInput::ShowReasons => {
                write!(output, "{}", console::render_reasons(&state.session.lock()))?;
                None
            }
            ConsoleInput::Login(username) => {
                let password = read_password("Password: ")?;
                Some(Command::Login { username, password })
            }
            ConsoleInput::Session(command) => Some(command),
        };

        if let Some(command) = command {
            let db = state.db.lock();
            let mut session = state.session.lock();
            match session.handle(command, &*db, &*db) {
                Ok(effects) => {
                    write!(output, "{}", console::render_effects(&effects))?;
                    if let Some(reviewer) = session.reviewer() {
                        if effects.iter().any(|e| matches!(e, Effect::ViewChanged(_)))
                            || session.view() == View::SingleTicket
                        {
                            let name = state
                                .config
                                .reviewer_display_name
                                .as_deref()
                                .unwrap_or(reviewer.username.as_str());
                            writeln!(output, "-- {name} --")?;
                            write!(output, "{}", console::render_session(&session))?;
                        }
                    }
                }
                Err(e) => {
                    log::debug!("Command failed: {e}");
                    write!(output, "{}", console::render_error(&e))?;
                }
            }
        }

        write!(output, "> ")?;
        output.flush()?;
    }

    writeln!(output)?;
    Ok(())
}
