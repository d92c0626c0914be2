//! `depwatch auth` command handler

use std::io::Write;

use colored::Colorize;
use serde::Serialize;

use depwatch_core::error::TokenError;
use depwatch_core::token::TokenStore;

use crate::cli::{AuthAction, AuthArgs};
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `auth` command.
pub fn execute(args: AuthArgs, tokens: &TokenStore, writer: &OutputWriter) -> Result<(), CliError> {
    let outcome = apply(args.action, tokens)?;
    writer.render(&outcome)
}

/// Apply an auth action to the token store.
pub fn apply(action: AuthAction, tokens: &TokenStore) -> Result<AuthOutcome, CliError> {
    let path = tokens
        .path()
        .map(|p| p.display().to_string())
        .unwrap_or_default();

    match action {
        AuthAction::Login { token } => {
            if token.trim().is_empty() {
                return Err(CliError::Environment("token must not be empty".to_owned()));
            }
            tokens.store(&token)?;
            Ok(AuthOutcome {
                action: "login",
                changed: true,
                path,
            })
        }
        AuthAction::Logout => match tokens.remove() {
            Ok(()) => Ok(AuthOutcome {
                action: "logout",
                changed: true,
                path,
            }),
            Err(TokenError::TokenFileNotFound) => Ok(AuthOutcome {
                action: "logout",
                changed: false,
                path,
            }),
            Err(e) => Err(e.into()),
        },
    }
}

/// Result of an auth action.
#[derive(Debug, Serialize)]
pub struct AuthOutcome {
    pub action: &'static str,
    pub changed: bool,
    pub path: String,
}

impl Render for AuthOutcome {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        match (self.action, self.changed) {
            ("login", _) => writeln!(w, "{} token saved to {}", "✓".green(), self.path),
            (_, true) => writeln!(w, "{} token removed from {}", "✓".green(), self.path),
            (_, false) => writeln!(w, "no token stored at {}", self.path),
        }
    }
}
