//! VM lifecycle: launch, wait, history and power-off

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, warn};

use biocloud_common::display::TimeDisplay;
use biocloud_common::{Error, ProvisionedVm, Result, VirtualMachineRecord, VmTier};

use crate::client::ApiClient;
use crate::pending::InFlight;
use crate::transport::HttpMethod;

/// Rows per history page
pub const HISTORY_PAGE_SIZE: usize = 6;

/// Which records the history shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum HistoryFilter {
    #[default]
    All,
    Running,
    Stopped,
}

impl HistoryFilter {
    fn matches(&self, entry: &VmHistoryEntry) -> bool {
        match self {
            HistoryFilter::All => true,
            HistoryFilter::Running => entry.running,
            HistoryFilter::Stopped => !entry.running,
        }
    }
}

/// A history row with its timestamps already rendered
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VmHistoryEntry {
    pub id: i64,
    pub name: String,
    pub created_at: String,
    pub powered_off_at: String,
    pub running: bool,
    pub cost: f64,
}

impl VmHistoryEntry {
    pub fn from_record(record: &VirtualMachineRecord, display: &TimeDisplay) -> Self {
        Self {
            id: record.id,
            name: record.name.clone(),
            created_at: display.format(&record.created_at),
            powered_off_at: display.format_powered_off(record.powered_off_at.as_ref()),
            running: record.is_running(),
            cost: record.cost,
        }
    }
}

/// Newest-first VM history with client-side filtering and paging
#[derive(Debug, Clone, PartialEq)]
pub struct VmHistory {
    entries: Vec<VmHistoryEntry>,
    filter: HistoryFilter,
    page: usize,
}

impl VmHistory {
    /// `records` in server order (oldest first)
    pub fn new(records: &[VirtualMachineRecord], display: &TimeDisplay) -> Self {
        let entries = records
            .iter()
            .rev()
            .map(|r| VmHistoryEntry::from_record(r, display))
            .collect();
        Self {
            entries,
            filter: HistoryFilter::All,
            page: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[VmHistoryEntry] {
        &self.entries
    }

    pub fn find(&self, id: i64) -> Option<&VmHistoryEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn filter(&self) -> HistoryFilter {
        self.filter
    }

    /// Switch filter and go back to the first page
    pub fn set_filter(&mut self, filter: HistoryFilter) {
        self.filter = filter;
        self.page = 0;
    }

    fn filtered(&self) -> Vec<&VmHistoryEntry> {
        self.entries.iter().filter(|e| self.filter.matches(e)).collect()
    }

    pub fn filtered_len(&self) -> usize {
        self.filtered().len()
    }

    pub fn page(&self) -> usize {
        self.page
    }

    /// At least one, even when nothing matches
    pub fn total_pages(&self) -> usize {
        self.filtered_len().div_ceil(HISTORY_PAGE_SIZE).max(1)
    }

    pub fn page_items(&self) -> Vec<VmHistoryEntry> {
        self.filtered()
            .into_iter()
            .skip(self.page * HISTORY_PAGE_SIZE)
            .take(HISTORY_PAGE_SIZE)
            .cloned()
            .collect()
    }

    pub fn has_prev(&self) -> bool {
        self.page > 0
    }

    pub fn has_next(&self) -> bool {
        self.page + 1 < self.total_pages()
    }

    pub fn next_page(&mut self) -> bool {
        if self.has_next() {
            self.page += 1;
            true
        } else {
            false
        }
    }

    pub fn prev_page(&mut self) -> bool {
        if self.has_prev() {
            self.page -= 1;
            true
        } else {
            false
        }
    }

    /// Jump to `page`, clamped to the last page
    pub fn go_to(&mut self, page: usize) {
        self.page = page.min(self.total_pages() - 1);
    }
}

#[derive(Deserialize)]
struct HistoryResponse {
    #[serde(default)]
    vm_list: Vec<VirtualMachineRecord>,
}

#[derive(Deserialize)]
struct MessageResponse {
    #[serde(default)]
    message: String,
}

/// Polling limits for [`VmLifecycle::wait_until_listed`]
#[derive(Debug, Clone, Copy)]
pub struct PollSettings {
    pub interval: Duration,
    pub attempts: u32,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            attempts: 24,
        }
    }
}

pub struct VmLifecycle {
    api: ApiClient,
    display: TimeDisplay,
    poll: PollSettings,
    creating: InFlight,
    powering_off: InFlight,
}

impl VmLifecycle {
    pub fn new(api: ApiClient, display: TimeDisplay, poll: PollSettings) -> Self {
        Self {
            api,
            display,
            poll,
            creating: InFlight::new("VM launch"),
            powering_off: InFlight::new("power-off"),
        }
    }

    pub fn tiers() -> &'static [VmTier] {
        &VmTier::ALL
    }

    /// Launch a VM. Nothing is sent when the cached balance cannot cover the tier.
    pub async fn create(&self, tier: VmTier) -> Result<ProvisionedVm> {
        let session = self.api.current_session().ok_or(Error::NotAuthenticated)?;
        let balance = session.profile.credits;
        if balance < tier.credits() {
            info!(balance, cost = tier.credits(), %tier, "Not enough credits to launch");
            return Err(Error::InsufficientCredits {
                balance,
                cost: tier.credits(),
            });
        }

        let _flight = self.creating.begin()?;
        let vm: ProvisionedVm = self.api.get("/api/azurevm/setup", true).await?;
        info!(dns = %vm.dns, ip = %vm.ip, %tier, "VM provisioned");
        Ok(vm)
    }

    pub async fn list_history(&self) -> Result<VmHistory> {
        let records = match self.api.get::<HistoryResponse>("/api/azurevm/history", true).await {
            Ok(resp) => resp.vm_list,
            // The backend answers 404 when the user never launched anything
            Err(Error::RequestFailed { status: 404, .. }) => Vec::new(),
            Err(e) => return Err(e),
        };

        for record in records.iter().filter(|r| !r.is_consistent()) {
            warn!(id = record.id, "VM powered off before it was created");
        }
        debug!(count = records.len(), "Fetched VM history");
        Ok(VmHistory::new(&records, &self.display))
    }

    /// Poll history until a running VM named `dns` shows up
    pub async fn wait_until_listed(&self, dns: &str) -> Result<VmHistoryEntry> {
        for attempt in 1..=self.poll.attempts {
            let history = self.list_history().await?;
            if let Some(entry) = history.entries().iter().find(|e| e.name == dns && e.running) {
                return Ok(entry.clone());
            }
            debug!(attempt, dns, "VM not listed yet");
            if attempt < self.poll.attempts {
                tokio::time::sleep(self.poll.interval).await;
            }
        }
        Err(Error::Timeout {
            seconds: self.poll.interval.as_secs() * u64::from(self.poll.attempts),
        })
    }

    /// Stop a VM, then show history as the server now reports it. The
    /// history is `None` when the stop was confirmed but the re-fetch failed.
    pub async fn power_off(&self, id: i64) -> Result<(String, Option<VmHistory>)> {
        let _flight = self.powering_off.begin()?;
        let resp: MessageResponse = self
            .api
            .send_json(HttpMethod::Delete, "/api/azurevm/poweroff", &json!({ "id": id }), true)
            .await?;
        info!(id, "VM powered off");

        match self.list_history().await {
            Ok(history) => Ok((resp.message, Some(history))),
            Err(e) => {
                warn!(id, error = %e, "VM history refresh failed after power-off");
                Ok((resp.message, None))
            }
        }
    }
}
