use std::collections::BTreeSet;
use std::path::PathBuf;

use clap::Parser;

use crate::deploy::DeploymentRequest;

/// Automate switch and security-appliance deployment into a cloud-managed
/// network.
#[derive(Parser, Debug)]
#[command(name = "netclaim", version, about)]
pub struct Cli {
    /// Name of the network to create or reuse
    #[arg(long)]
    pub network_name: String,

    /// Reuse the network if one with this name already exists
    #[arg(long)]
    pub ignore_existing: bool,

    /// Comma-separated tags to apply when creating the network
    #[arg(long, value_delimiter = ',')]
    pub tags: Vec<String>,

    /// Configuration template to bind the network to
    #[arg(long)]
    pub template: Option<String>,

    /// Street address assigned to deployed devices (moves the map marker)
    #[arg(long)]
    pub address: Option<String>,

    /// Serial of the switch to deploy (skips inventory auto-detection)
    #[arg(long)]
    pub switch_serial: Option<String>,

    /// Serial of the appliance to deploy (skips inventory auto-detection)
    #[arg(long)]
    pub appliance_serial: Option<String>,

    /// Validate and report without issuing any state-changing call
    #[arg(long)]
    pub dry_run: bool,

    /// Path to the JSON settings file
    #[arg(long, default_value = "config.json")]
    pub config: PathBuf,

    /// Abort the run after this many seconds (checked between steps)
    #[arg(long)]
    pub timeout: Option<u64>,
}

impl Cli {
    pub fn to_request(&self) -> DeploymentRequest {
        DeploymentRequest {
            network_name: self.network_name.clone(),
            ignore_existing: self.ignore_existing,
            tags: self.tags.iter().cloned().collect::<BTreeSet<_>>(),
            template_name: self.template.clone(),
            address: self.address.clone(),
            switch_serial: self.switch_serial.clone(),
            appliance_serial: self.appliance_serial.clone(),
            dry_run: self.dry_run,
        }
    }
}
