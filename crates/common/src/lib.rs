//! BioCloudLabs Common Library
//!
//! Data model, error taxonomy and input validation shared by the
//! BioCloudLabs client crates.

pub mod display;
pub mod error;
pub mod forms;
pub mod route;
pub mod types;
pub mod validation;

// Re-export commonly used types
pub use display::TimeDisplay;
pub use error::{Error, Result};
pub use route::Route;
pub use types::*;
pub use validation::{validate_password, ValidationErrors};

/// Client version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default store path
pub fn default_store_path() -> std::path::PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join(".biocloud")
}

/// Home directory helper
mod dirs {
    pub fn home_dir() -> Option<std::path::PathBuf> {
        std::env::var_os("HOME").map(std::path::PathBuf::from)
    }
}
