use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::dashboard::Network;

/// Closed set of device roles this tool deploys. Behavior differs only in a
/// couple of attributes, so an enum-keyed table beats a type per model line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceRole {
    Switch,
    Appliance,
}

impl DeviceRole {
    pub const ALL: [DeviceRole; 2] = [DeviceRole::Switch, DeviceRole::Appliance];

    /// Product type string for network creation.
    pub fn product_type(&self) -> &'static str {
        match self {
            DeviceRole::Switch => "switch",
            DeviceRole::Appliance => "appliance",
        }
    }

    /// Whether an inventory model string belongs to this role. Accepts both
    /// the generic category name and the vendor model-line prefix.
    pub fn matches_model(&self, model: &str) -> bool {
        match self {
            DeviceRole::Switch => model.eq_ignore_ascii_case("switch") || model.starts_with("MS"),
            DeviceRole::Appliance => {
                model.eq_ignore_ascii_case("appliance") || model.starts_with("MX")
            }
        }
    }
}

impl fmt::Display for DeviceRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.product_type())
    }
}

/// One deployment run's input. Constructed once from the CLI and read-only
/// thereafter.
#[derive(Debug, Clone)]
pub struct DeploymentRequest {
    pub network_name: String,
    pub ignore_existing: bool,
    pub tags: BTreeSet<String>,
    pub template_name: Option<String>,
    pub address: Option<String>,
    pub switch_serial: Option<String>,
    pub appliance_serial: Option<String>,
    pub dry_run: bool,
}

impl DeploymentRequest {
    pub fn serial_override(&self, role: DeviceRole) -> Option<&str> {
        match role {
            DeviceRole::Switch => self.switch_serial.as_deref(),
            DeviceRole::Appliance => self.appliance_serial.as_deref(),
        }
    }
}

/// A device as the run left it (or, in dry-run, as it would leave it).
#[derive(Debug, Clone, Serialize)]
pub struct DeployedDevice {
    pub serial: String,
    pub role: DeviceRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub claimed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Linear run states. `Failed` is reachable from any of them; there are no
/// cycles outside the per-step retry wrapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Start,
    NetworkResolved,
    TemplateBound,
    SerialsResolved,
    DevicesClaimed,
    DevicesConfigured,
    Verified,
    Done,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// The step issued its write and it took effect.
    Applied,
    /// Nothing to do; the desired state already held.
    NoOp,
    /// Dry-run: the write was validated but suppressed.
    WouldApply,
    /// The step completed but found something worth flagging.
    Warning,
    Failed,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Outcome::Applied => "applied",
            Outcome::NoOp => "no-op",
            Outcome::WouldApply => "would-apply",
            Outcome::Warning => "warning",
            Outcome::Failed => "failed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StepOutcome {
    pub step: &'static str,
    pub outcome: Outcome,
    pub detail: String,
}

/// The sole return value of a run. Built incrementally; a failed run still
/// enumerates every attempted step so it is diagnosable from the result
/// alone.
#[derive(Debug, Serialize)]
pub struct DeploymentResult {
    pub state: RunState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network: Option<Network>,
    pub devices: Vec<DeployedDevice>,
    pub verified: bool,
    pub steps: Vec<StepOutcome>,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl DeploymentResult {
    pub fn new() -> Self {
        Self {
            state: RunState::Start,
            network: None,
            devices: Vec::new(),
            verified: false,
            steps: Vec::new(),
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.state == RunState::Done
    }

    /// True when the run reached `Done` but verification found mismatches.
    pub fn has_warnings(&self) -> bool {
        self.is_success() && !self.verified
    }
}

impl Default for DeploymentResult {
    fn default() -> Self {
        Self::new()
    }
}
