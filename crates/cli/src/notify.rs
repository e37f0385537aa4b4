//! Transient user notifications
//!
//! Fire-and-forget: nothing is stored, each notice is printed once and
//! mirrored to the log.

use colored::Colorize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Success,
    Warning,
    Error,
}

pub fn notify(level: Level, message: &str) {
    match level {
        Level::Info => {
            tracing::info!(notice = message);
            println!("{} {}", "ℹ".blue(), message);
        }
        Level::Success => {
            tracing::info!(notice = message);
            println!("{} {}", "✔".green(), message);
        }
        Level::Warning => {
            tracing::warn!(notice = message);
            println!("{} {}", "⚠".yellow(), message.yellow());
        }
        Level::Error => {
            tracing::error!(notice = message);
            eprintln!("{} {}", "✘".red(), message.red());
        }
    }
}

pub fn success(message: &str) {
    notify(Level::Success, message);
}

pub fn error(message: &str) {
    notify(Level::Error, message);
}

pub fn warning(message: &str) {
    notify(Level::Warning, message);
}

pub fn info(message: &str) {
    notify(Level::Info, message);
}

/// One error line per reason
pub fn error_bullets(reasons: &[String]) {
    for reason in reasons {
        tracing::error!(notice = %reason);
        eprintln!("  {} {}", "•".red(), reason);
    }
}
