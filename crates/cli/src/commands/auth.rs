//! Auth Commands

use anyhow::{bail, Result};
use clap::Subcommand;
use serde::Serialize;

use biocloud_common::forms::Registration;
use biocloud_common::{Location, Route};

use super::{authorize, follow, report};
use crate::app::App;
use crate::auth::LoginOutcome;
use crate::guard::GuardState;
use crate::notify;
use crate::output::{print_item, print_list, OutputFormat, TableDisplay};

#[derive(Subcommand)]
pub enum AuthCommands {
    /// Log in and store the session
    Login {
        #[arg(short, long)]
        email: String,

        #[arg(short, long, env = "BIOCLOUD_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Forget the stored session
    Logout,

    /// Create a new account
    Register {
        #[arg(short, long)]
        email: String,

        #[arg(short, long, env = "BIOCLOUD_PASSWORD", hide_env_values = true)]
        password: String,

        #[arg(long)]
        name: String,

        #[arg(long)]
        surname: String,

        /// Location ID (see `biocloud auth locations`)
        #[arg(short, long, default_value = "1")]
        location: i64,
    },

    /// Show whether the stored session is valid
    Status,

    /// Change the password of the logged-in user
    ChangePassword {
        #[arg(long)]
        old: String,

        #[arg(long)]
        new: String,
    },

    /// Send a password recovery email
    ForgotPassword {
        #[arg(short, long)]
        email: String,
    },

    /// Set a new password using the token from a recovery email
    ResetPassword {
        /// Recovery token from the emailed link
        #[arg(short, long)]
        token: String,

        #[arg(long)]
        new: String,
    },

    /// List the available locations
    Locations,
}

#[derive(Serialize)]
struct LocationDisplay {
    id: i64,
    name: String,
}

impl From<Location> for LocationDisplay {
    fn from(location: Location) -> Self {
        Self {
            id: location.id,
            name: location.name,
        }
    }
}

impl TableDisplay for LocationDisplay {
    fn headers() -> Vec<&'static str> {
        vec!["ID", "Location"]
    }

    fn row(&self) -> Vec<String> {
        vec![self.id.to_string(), self.name.clone()]
    }
}

#[derive(Serialize)]
struct SessionStatus {
    logged_in: bool,
    email: String,
    name: String,
    credits: i64,
}

impl TableDisplay for SessionStatus {
    fn headers() -> Vec<&'static str> {
        vec!["Logged In", "Email", "Name", "Credits"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            if self.logged_in { "yes" } else { "no" }.to_string(),
            self.email.clone(),
            self.name.clone(),
            self.credits.to_string(),
        ]
    }
}

pub async fn execute(cmd: AuthCommands, app: &App, format: OutputFormat) -> Result<()> {
    match cmd {
        AuthCommands::Login { email, password } => {
            if app.auth.landing_route() == Route::Dashboard {
                notify::info("Already logged in.");
                follow(Route::Dashboard);
                return Ok(());
            }

            match app.auth.login(&email, &password).await? {
                LoginOutcome::Authenticated(session) => {
                    notify::success(&format!("Welcome, {}!", session.profile.display_name()));
                    follow(Route::Dashboard);
                }
                LoginOutcome::Rejected(message) | LoginOutcome::Errored(message) => {
                    bail!("{}", message)
                }
            }
        }

        AuthCommands::Logout => {
            app.auth.logout()?;
            notify::success("Logged out.");
        }

        AuthCommands::Register {
            email,
            password,
            name,
            surname,
            location,
        } => {
            let registration = Registration {
                email: email.trim().to_string(),
                password,
                name: name.trim().to_string(),
                surname: surname.trim().to_string(),
                location_id: location,
            };
            report(&app.auth.register(&registration).await?)?;
        }

        AuthCommands::Status => {
            let status = match app.guard.evaluate(Route::Dashboard).await {
                GuardState::Authorized { session: Some(session) } => SessionStatus {
                    logged_in: true,
                    email: session.profile.email.clone(),
                    name: session.profile.display_name(),
                    credits: session.profile.credits,
                },
                GuardState::Unauthorized { redirect: Route::Error } => {
                    bail!("Error validating token. Please try again later.")
                }
                _ => SessionStatus {
                    logged_in: false,
                    email: String::new(),
                    name: String::new(),
                    credits: 0,
                },
            };
            print_item(&status, format);
        }

        AuthCommands::ChangePassword { old, new } => {
            authorize(app, Route::ChangePassword).await?;
            report(&app.auth.change_password(&old, &new).await?)?;
        }

        AuthCommands::ForgotPassword { email } => {
            report(&app.auth.send_recover_email(&email).await?)?;
        }

        AuthCommands::ResetPassword { token, new } => {
            if !token.trim().is_empty() && !app.auth.validate_recovery_token(&token).await? {
                bail!("This recovery link is invalid or has expired. Please request a new one.");
            }
            report(&app.auth.recover_password(&new, &token).await?)?;
        }

        AuthCommands::Locations => {
            let locations: Vec<LocationDisplay> = app
                .auth
                .locations()
                .await?
                .into_iter()
                .map(LocationDisplay::from)
                .collect();
            print_list(&locations, format);
        }
    }

    Ok(())
}
