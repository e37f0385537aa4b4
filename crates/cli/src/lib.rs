//! BioCloudLabs client
//!
//! Session handling, authenticated API access and the VM lifecycle
//! behind the `biocloud` command-line tool.

pub mod app;
pub mod auth;
pub mod client;
pub mod commands;
pub mod config;
pub mod credits;
pub mod guard;
pub mod notify;
pub mod output;
pub mod pending;
pub mod session;
pub mod transport;
pub mod vm;

#[cfg(test)]
mod testing;

pub use app::App;
pub use client::ApiClient;
pub use config::{CliConfig, StorePaths};
pub use session::{FileSessionStore, MemorySessionStore, SessionContext, SessionStore};
pub use transport::{ApiRequest, ApiResponse, HttpMethod, Transport, TransportError};
