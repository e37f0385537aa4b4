//! Wiring of the client services

use std::sync::Arc;

use anyhow::Context;

use crate::auth::AuthController;
use crate::client::ApiClient;
use crate::config::{CliConfig, StorePaths};
use crate::credits::CreditsService;
use crate::guard::RouteGuard;
use crate::session::{FileSessionStore, SessionContext};
use crate::transport::{HttpTransport, Transport};
use crate::vm::VmLifecycle;

/// Everything a command needs, built once at startup
pub struct App {
    pub config: CliConfig,
    pub session: SessionContext,
    pub api: ApiClient,
    pub auth: AuthController,
    pub guard: RouteGuard,
    pub vms: VmLifecycle,
    pub credits: CreditsService,
}

impl App {
    pub fn new(config: CliConfig, paths: &StorePaths) -> anyhow::Result<Self> {
        let transport = HttpTransport::new(&config.api_base_url, config.request_timeout())
            .context("failed to build HTTP client")?;
        let session: SessionContext = Arc::new(FileSessionStore::new(paths.session()));
        Self::with_parts(config, Arc::new(transport), session)
    }

    pub fn with_parts(
        config: CliConfig,
        transport: Arc<dyn Transport>,
        session: SessionContext,
    ) -> anyhow::Result<Self> {
        let display = config.time_display()?;
        let api = ApiClient::new(transport, session.clone());

        Ok(Self {
            auth: AuthController::new(api.clone()),
            guard: RouteGuard::new(api.clone(), config.guard_policy, config.validation_path.clone()),
            vms: VmLifecycle::new(api.clone(), display, config.poll_settings()),
            credits: CreditsService::new(api.clone()),
            api,
            session,
            config,
        })
    }
}
