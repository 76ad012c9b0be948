//! Session command handlers.

use std::io::{BufRead, IsTerminal};

use dialoguer::Input;
use secrecy::SecretString;

use conjure_core::{Dashboard, Session, User};

use crate::cli::{AuthArgs, AuthCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

/// Use the flag value, or prompt for it when attached to a terminal.
fn value_or_prompt(value: Option<String>, prompt: &str) -> Result<String, CliError> {
    let value = match value {
        Some(v) => v,
        None if std::io::stdin().is_terminal() => Input::new()
            .with_prompt(prompt)
            .interact_text()
            .map_err(prompt_err)?,
        None => {
            return Err(CliError::Validation {
                field: prompt.to_lowercase(),
                reason: format!(
                    "--{} is required when not running interactively",
                    prompt.to_lowercase()
                ),
            });
        }
    };
    if value.trim().is_empty() {
        return Err(CliError::Validation {
            field: prompt.to_lowercase(),
            reason: "cannot be empty".into(),
        });
    }
    Ok(value.trim().to_owned())
}

fn read_password(from_stdin: bool) -> Result<SecretString, CliError> {
    let password = if from_stdin {
        let mut line = String::new();
        std::io::stdin().lock().read_line(&mut line)?;
        line.trim_end_matches(['\r', '\n']).to_owned()
    } else {
        rpassword::prompt_password("Password: ").map_err(prompt_err)?
    };
    if password.is_empty() {
        return Err(CliError::Validation {
            field: "password".into(),
            reason: "password cannot be empty".into(),
        });
    }
    Ok(SecretString::from(password))
}

fn user_detail(u: &User) -> String {
    [
        format!("ID:       {}", u.id),
        format!("Username: {}", u.username),
        format!("Email:    {}", u.email),
    ]
    .join("\n")
}

fn session_summary(session: &Session, email: &str) -> String {
    let who = session
        .user
        .as_ref()
        .map_or_else(|| email.to_owned(), |u| u.username.clone());
    match session.expires_in {
        Some(secs) => format!("Logged in as {who} (session expires in {secs}s)"),
        None => format!("Logged in as {who}"),
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    dashboard: &Dashboard,
    args: AuthArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        AuthCommand::Login {
            email,
            password_stdin,
        } => {
            let email = value_or_prompt(email, "Email")?;
            let password = read_password(password_stdin)?;
            let session = dashboard.login(&email, &password).await?;
            output::print_output(&session_summary(&session, &email), global.quiet);
            Ok(())
        }

        AuthCommand::Register {
            email,
            username,
            password_stdin,
        } => {
            let email = value_or_prompt(email, "Email")?;
            let username = value_or_prompt(username, "Username")?;
            let password = read_password(password_stdin)?;
            dashboard.register(&email, &username, &password).await?;
            output::print_output(
                &format!("Account {username} created. Run `conjure auth login` to sign in."),
                global.quiet,
            );
            Ok(())
        }

        AuthCommand::Logout => {
            dashboard.logout().await?;
            output::print_output("Logged out", global.quiet);
            Ok(())
        }

        AuthCommand::Me => {
            let user = dashboard.me().await?;
            let out = output::render_single(&global.output, &user, user_detail, |u| {
                u.username.clone()
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }

        AuthCommand::Verify => {
            if !dashboard.is_logged_in() || !dashboard.verify_session().await {
                return Err(CliError::AuthRequired);
            }
            output::print_output("Session is valid", global.quiet);
            Ok(())
        }

        AuthCommand::ResetPassword { email } => {
            dashboard.request_password_reset(&email).await?;
            output::print_output(
                &format!("If {email} has an account, a reset link is on its way."),
                global.quiet,
            );
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_prefers_username() {
        let session = Session {
            token_type: "bearer".into(),
            expires_in: Some(3600),
            user: Some(User {
                id: "1".into(),
                email: "mage@example.com".into(),
                username: "mage".into(),
            }),
        };
        assert_eq!(
            session_summary(&session, "mage@example.com"),
            "Logged in as mage (session expires in 3600s)"
        );
    }

    #[test]
    fn summary_falls_back_to_email() {
        let session = Session {
            token_type: "bearer".into(),
            expires_in: None,
            user: None,
        };
        assert_eq!(session_summary(&session, "a@b.c"), "Logged in as a@b.c");
    }
}
