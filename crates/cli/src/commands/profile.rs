//! Profile Commands

use anyhow::Result;
use clap::Subcommand;
use serde::Serialize;

use biocloud_common::forms::ProfileUpdate;
use biocloud_common::{Route, UserProfile};

use super::{authorize, report};
use crate::app::App;
use crate::output::{print_item, OutputFormat, TableDisplay};

#[derive(Subcommand)]
pub enum ProfileCommands {
    /// Show the cached profile
    Show,

    /// Update profile fields; omitted fields keep their current value
    Update {
        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        surname: Option<String>,

        #[arg(short, long)]
        location: Option<i64>,

        /// New password; ends the session on success
        #[arg(long, env = "BIOCLOUD_NEW_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
}

#[derive(Serialize)]
pub struct ProfileDisplay {
    pub email: String,
    pub name: String,
    pub surname: String,
    pub credits: i64,
    pub location_id: i64,
    pub member_since: String,
}

impl From<UserProfile> for ProfileDisplay {
    fn from(profile: UserProfile) -> Self {
        Self {
            email: profile.email,
            name: profile.name,
            surname: profile.surname,
            credits: profile.credits,
            location_id: profile.location_id,
            member_since: profile.created_at.unwrap_or_else(|| "-".to_string()),
        }
    }
}

impl TableDisplay for ProfileDisplay {
    fn headers() -> Vec<&'static str> {
        vec!["Email", "Name", "Surname", "Credits", "Location", "Member Since"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.email.clone(),
            self.name.clone(),
            self.surname.clone(),
            self.credits.to_string(),
            self.location_id.to_string(),
            self.member_since.clone(),
        ]
    }
}

pub async fn execute(cmd: ProfileCommands, app: &App, format: OutputFormat) -> Result<()> {
    let session = authorize(app, Route::Profile).await?;

    match cmd {
        ProfileCommands::Show => {
            print_item(&ProfileDisplay::from(session.profile), format);
        }

        ProfileCommands::Update {
            name,
            surname,
            location,
            password,
        } => {
            let current = session.profile;
            let update = ProfileUpdate {
                name: name.unwrap_or(current.name),
                surname: surname.unwrap_or(current.surname),
                password: password.unwrap_or_default(),
                location_id: location.unwrap_or(current.location_id),
            };
            report(&app.auth.update_profile(&update).await?)?;
        }
    }

    Ok(())
}
