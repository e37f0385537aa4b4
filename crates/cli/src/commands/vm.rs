//! VM Commands

use anyhow::Result;
use clap::Subcommand;
use serde::Serialize;

use biocloud_common::{ProvisionedVm, Route, VmTier};

use super::{authorize, spinner};
use crate::app::App;
use crate::notify;
use crate::output::{print_item, print_list, print_list_or, OutputFormat, TableDisplay};
use crate::vm::{HistoryFilter, VmHistory, VmHistoryEntry, VmLifecycle};

#[derive(Subcommand)]
pub enum VmCommands {
    /// List the VM tiers
    Tiers,

    /// Launch a VM for a BLAST job
    Create {
        /// Tier (small/vm1, medium/vm2, large/vm3)
        #[arg(short, long, default_value = "small")]
        tier: VmTier,

        /// Return once the request is accepted instead of waiting for the VM
        #[arg(long)]
        no_wait: bool,
    },

    /// Show launched VMs, newest first
    History {
        /// Only running or only stopped VMs
        #[arg(short, long, value_enum, default_value = "all")]
        filter: HistoryFilter,

        /// Page number, starting at 1
        #[arg(short, long, default_value = "1")]
        page: usize,
    },

    /// Power off a running VM
    PowerOff {
        /// VM ID
        id: i64,
    },
}

/// Tier display wrapper for serialization
#[derive(Serialize)]
pub struct TierDisplay {
    pub tier: VmTier,
    pub label: &'static str,
    pub cpus: u32,
    pub memory_gb: u32,
    pub credits: i64,
    pub description: &'static str,
}

impl From<VmTier> for TierDisplay {
    fn from(tier: VmTier) -> Self {
        Self {
            tier,
            label: tier.label(),
            cpus: tier.cpus(),
            memory_gb: tier.memory_gb(),
            credits: tier.credits(),
            description: tier.description(),
        }
    }
}

impl TableDisplay for TierDisplay {
    fn headers() -> Vec<&'static str> {
        vec!["Tier", "CPUs", "Memory", "Credits", "Description"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.label.to_string(),
            format!("{} vCPUs", self.cpus),
            format!("{} GB", self.memory_gb),
            self.credits.to_string(),
            self.description.to_string(),
        ]
    }
}

impl TableDisplay for ProvisionedVm {
    fn headers() -> Vec<&'static str> {
        vec!["DNS", "IP", "Price"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.dns.clone(),
            self.ip.clone(),
            self.price.map(|p| format!("{:.4}", p)).unwrap_or_else(|| "-".to_string()),
        ]
    }
}

impl TableDisplay for VmHistoryEntry {
    fn headers() -> Vec<&'static str> {
        vec!["ID", "VM Name", "Created At", "Powered Off At", "Cost"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.name.clone(),
            self.created_at.clone(),
            self.powered_off_at.clone(),
            format!("{}", self.cost),
        ]
    }
}

fn print_history(history: &VmHistory, format: OutputFormat) {
    print_list_or(
        &history.page_items(),
        format,
        "No virtual machines have been launched yet.",
    );
    if matches!(format, OutputFormat::Table | OutputFormat::Plain) && !history.is_empty() {
        println!(
            "Page {}/{}  [{}] [{}]",
            history.page() + 1,
            history.total_pages(),
            if history.has_prev() { "Prev" } else { "    " },
            if history.has_next() { "Next" } else { "    " },
        );
    }
}

pub async fn execute(cmd: VmCommands, app: &App, format: OutputFormat) -> Result<()> {
    match cmd {
        VmCommands::Tiers => {
            let tiers: Vec<TierDisplay> = VmLifecycle::tiers()
                .iter()
                .copied()
                .map(TierDisplay::from)
                .collect();
            print_list(&tiers, format);
        }

        VmCommands::Create { tier, no_wait } => {
            authorize(app, Route::Blast).await?;

            let pb = spinner(&format!("Launching {} virtual machine...", tier));
            let vm = app.vms.create(tier).await;
            pb.finish_and_clear();
            let vm = vm?;
            print_item(&vm, format);

            if !no_wait {
                let pb = spinner("Waiting for the virtual machine to come up...");
                let listed = app.vms.wait_until_listed(&vm.dns).await;
                pb.finish_and_clear();
                match listed {
                    Ok(entry) => {
                        notify::success("Virtual machine is ready!");
                        print_item(&entry, format);
                    }
                    Err(e) => {
                        notify::error("Failed to fetch VM status.");
                        return Err(e.into());
                    }
                }
            }
        }

        VmCommands::History { filter, page } => {
            authorize(app, Route::Dashboard).await?;

            let mut history = app.vms.list_history().await?;
            history.set_filter(filter);
            history.go_to(page.saturating_sub(1));
            print_history(&history, format);
        }

        VmCommands::PowerOff { id } => {
            authorize(app, Route::Dashboard).await?;

            let pb = spinner("Powering off...");
            let result = app.vms.power_off(id).await;
            pb.finish_and_clear();
            let (message, history) = result?;

            notify::success(if message.is_empty() { "VM powered off" } else { &message });
            match history {
                Some(history) => {
                    if let Some(entry) = history.find(id) {
                        print_item(entry, format);
                    }
                }
                None => notify::warning("Could not refresh the VM list. Run `biocloud vm history` to check."),
            }
        }
    }

    Ok(())
}
