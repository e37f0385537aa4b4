//! CLI Commands

pub mod auth;
pub mod credits;
pub mod profile;
pub mod vm;

use std::time::Duration;

use anyhow::{bail, Result};
use indicatif::{ProgressBar, ProgressStyle};

use biocloud_common::{Error, Route, Session};

use crate::app::App;
use crate::auth::Submission;
use crate::guard::{GuardPolicy, GuardState};
use crate::notify;

/// Spinner shown while waiting on the backend
pub(crate) fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Run the route guard for a protected command and hand back the session
pub(crate) async fn authorize(app: &App, route: Route) -> Result<Session> {
    let pb = (app.guard.policy() == GuardPolicy::ServerValidation).then(|| spinner("Loading..."));
    let state = app.guard.evaluate(route).await;
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    match state {
        GuardState::Authorized { session: Some(session) } => Ok(session),
        GuardState::Unauthorized { redirect: Route::Error } => {
            bail!("Error validating token. Please try again later.")
        }
        GuardState::Authorized { session: None }
        | GuardState::Unauthorized { .. }
        | GuardState::Loading => Err(Error::NotAuthenticated.into()),
    }
}

/// Show the outcome of a form submission
pub(crate) fn report(submission: &Submission) -> Result<()> {
    match submission {
        Submission::Done { message, redirect } => {
            notify::success(message);
            if let Some(route) = redirect {
                follow(*route);
            }
            Ok(())
        }
        Submission::Failed { message } => bail!("{}", message),
    }
}

/// Tell the user which command continues the flow at `route`
pub(crate) fn follow(route: Route) {
    let hint = match route {
        Route::Login => "biocloud auth login",
        Route::Dashboard => "biocloud vm history",
        Route::Blast => "biocloud vm create",
        Route::Profile => "biocloud profile show",
        Route::Credits => "biocloud credits offers",
        _ => return,
    };
    notify::info(&format!("Next: {}", hint));
}
