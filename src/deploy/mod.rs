pub mod devices;
pub mod network;
pub mod request;
pub mod retry;
pub mod verify;

#[cfg(test)]
pub(crate) mod testing;

pub use request::{DeploymentRequest, DeploymentResult, DeviceRole, Outcome, RunState, StepOutcome};

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use crate::config::Settings;
use crate::dashboard::DashboardClient;
use crate::error::DeployError;

use request::DeployedDevice;

/// Step names as they appear in the result and the log, in execution order.
mod step {
    pub const RESOLVE_NETWORK: &str = "resolve_network";
    pub const BIND_TEMPLATE: &str = "bind_template";
    pub const RESOLVE_SERIALS: &str = "resolve_serials";
    pub const CLAIM_DEVICES: &str = "claim_devices";
    pub const CONFIGURE_DEVICES: &str = "configure_devices";
    pub const VERIFY: &str = "verify";
}

/// Sequences one deployment run: network -> template -> serials -> claim ->
/// configure -> verify. Strictly sequential, forward-only; a failing step
/// halts the machine and earlier side effects are never rolled back, so
/// re-running after a partial failure converges instead of duplicating work.
pub struct Orchestrator<'a> {
    client: &'a dyn DashboardClient,
    settings: &'a Settings,
    cancel: CancellationToken,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        client: &'a dyn DashboardClient,
        settings: &'a Settings,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            client,
            settings,
            cancel,
        }
    }

    /// Execute a full run. Never returns an error: failures are folded into
    /// the result with the failing step annotated.
    pub async fn run(&self, request: &DeploymentRequest) -> DeploymentResult {
        let mut result = DeploymentResult::new();
        tracing::info!(
            network = %request.network_name,
            dry_run = request.dry_run,
            "starting deployment"
        );

        // Resolve or create the network. Referenced by id from here on,
        // never re-resolved by name.
        if self.cancel.is_cancelled() {
            return self.fail(result, step::RESOLVE_NETWORK, DeployError::Cancelled);
        }
        let network = match network::resolve(self.client, self.settings, request).await {
            Ok((network, outcome)) => {
                let detail = match outcome {
                    Outcome::Applied => format!("created network {}", network.id),
                    Outcome::NoOp => format!("using existing network {}", network.id),
                    _ => format!("would create network '{}'", network.name),
                };
                record(&mut result, step::RESOLVE_NETWORK, outcome, detail);
                result.network = Some(network.clone());
                result.state = RunState::NetworkResolved;
                network
            }
            Err(e) => return self.fail(result, step::RESOLVE_NETWORK, e),
        };

        // Template binding, when requested.
        if self.cancel.is_cancelled() {
            return self.fail(result, step::BIND_TEMPLATE, DeployError::Cancelled);
        }
        let network = match &request.template_name {
            None => {
                record(
                    &mut result,
                    step::BIND_TEMPLATE,
                    Outcome::NoOp,
                    "no template requested".to_string(),
                );
                network
            }
            Some(name) => {
                match network::bind(self.client, self.settings, &network, name, request.dry_run)
                    .await
                {
                    Ok((bound, outcome)) => {
                        let detail = match outcome {
                            Outcome::Applied => format!("bound to template '{}'", name),
                            Outcome::NoOp => format!("already bound to template '{}'", name),
                            _ => format!("would bind to template '{}'", name),
                        };
                        record(&mut result, step::BIND_TEMPLATE, outcome, detail);
                        result.network = Some(bound.clone());
                        bound
                    }
                    Err(e) => return self.fail(result, step::BIND_TEMPLATE, e),
                }
            }
        };
        result.state = RunState::TemplateBound;

        // Pick a serial per role.
        if self.cancel.is_cancelled() {
            return self.fail(result, step::RESOLVE_SERIALS, DeployError::Cancelled);
        }
        let serials = match devices::resolve_serials(self.client, self.settings, request).await {
            Ok(serials) => {
                record(
                    &mut result,
                    step::RESOLVE_SERIALS,
                    Outcome::Applied,
                    format!("switch={}, appliance={}", serials.switch, serials.appliance),
                );
                result.state = RunState::SerialsResolved;
                serials
            }
            Err(e) => return self.fail(result, step::RESOLVE_SERIALS, e),
        };

        // Claim both devices in one batched call.
        if self.cancel.is_cancelled() {
            return self.fail(result, step::CLAIM_DEVICES, DeployError::Cancelled);
        }
        if request.dry_run {
            for role in DeviceRole::ALL {
                result.devices.push(DeployedDevice {
                    serial: serials.for_role(role).to_string(),
                    role,
                    model: None,
                    claimed: false,
                    name: None,
                    address: None,
                    note: Some("would-claim".to_string()),
                });
            }
            record(
                &mut result,
                step::CLAIM_DEVICES,
                Outcome::WouldApply,
                format!(
                    "would claim {} into '{}'",
                    serials.all().join(", "),
                    network.name
                ),
            );
        } else {
            match devices::claim(self.client, self.settings, &network, &serials.all()).await {
                Ok(summary) => {
                    for role in DeviceRole::ALL {
                        let serial = serials.for_role(role);
                        let model = summary
                            .devices
                            .iter()
                            .find(|d| d.serial == serial)
                            .map(|d| d.model.clone())
                            .filter(|m| !m.is_empty());
                        result.devices.push(DeployedDevice {
                            serial: serial.to_string(),
                            role,
                            model,
                            claimed: true,
                            name: None,
                            address: None,
                            note: None,
                        });
                    }
                    let (outcome, detail) = if summary.newly_claimed.is_empty() {
                        (
                            Outcome::NoOp,
                            "all devices already members of the target network".to_string(),
                        )
                    } else {
                        (
                            Outcome::Applied,
                            format!("claimed {}", summary.newly_claimed.join(", ")),
                        )
                    };
                    record(&mut result, step::CLAIM_DEVICES, outcome, detail);
                }
                Err(e) => return self.fail(result, step::CLAIM_DEVICES, e),
            }
        }
        result.state = RunState::DevicesClaimed;

        // Assign name and address. Only runs against claimed devices.
        if self.cancel.is_cancelled() {
            return self.fail(result, step::CONFIGURE_DEVICES, DeployError::Cancelled);
        }
        if request.dry_run {
            let detail = match &request.address {
                Some(address) => format!("would set device names and address '{}'", address),
                None => "would set device names".to_string(),
            };
            record(&mut result, step::CONFIGURE_DEVICES, Outcome::WouldApply, detail);
        } else {
            let mut details = Vec::new();
            let mut any_applied = false;
            for i in 0..result.devices.len() {
                let serial = result.devices[i].serial.clone();
                let model = result.devices[i].model.clone();
                match devices::configure(
                    self.client,
                    &serial,
                    model.as_deref(),
                    request.address.as_deref(),
                )
                .await
                {
                    Ok(Some(_)) => {
                        let name = model.as_deref().map(|m| format!("{}_{}", m, serial));
                        result.devices[i].name = name.clone();
                        result.devices[i].address = request.address.clone();
                        details.push(format!(
                            "{}: name={}",
                            serial,
                            name.as_deref().unwrap_or("unchanged")
                        ));
                        any_applied = true;
                    }
                    Ok(None) => details.push(format!("{}: nothing to set", serial)),
                    Err(e) => return self.fail(result, step::CONFIGURE_DEVICES, e),
                }
            }
            let outcome = if any_applied { Outcome::Applied } else { Outcome::NoOp };
            record(&mut result, step::CONFIGURE_DEVICES, outcome, details.join("; "));
        }
        result.state = RunState::DevicesConfigured;

        // Read back and reconcile. Always runs; in dry-run the report is
        // informational and never flips the run to warnings.
        if self.cancel.is_cancelled() {
            return self.fail(result, step::VERIFY, DeployError::Cancelled);
        }
        if network.id.is_empty() {
            // Dry-run against a network that does not exist yet.
            record(
                &mut result,
                step::VERIFY,
                Outcome::NoOp,
                "network not created yet; nothing to verify".to_string(),
            );
            result.verified = true;
        } else {
            match verify::verify(self.client, &network, &result.devices).await {
                Ok(report) if report.ok => {
                    result.verified = true;
                    let detail = format!("{} device(s) verified in network", result.devices.len());
                    record(&mut result, step::VERIFY, Outcome::Applied, detail);
                }
                Ok(report) => {
                    if request.dry_run {
                        result.verified = true;
                        record(
                            &mut result,
                            step::VERIFY,
                            Outcome::NoOp,
                            format!(
                                "informational: {} difference(s) from desired state",
                                report.mismatches.len()
                            ),
                        );
                    } else {
                        result.verified = false;
                        let detail = report
                            .mismatches
                            .iter()
                            .map(|m| {
                                format!(
                                    "{} {}: expected '{}', got '{}'",
                                    m.serial, m.field, m.expected, m.actual
                                )
                            })
                            .collect::<Vec<_>>()
                            .join("; ");
                        record(&mut result, step::VERIFY, Outcome::Warning, detail);
                    }
                }
                Err(e) => return self.fail(result, step::VERIFY, e),
            }
        }
        result.state = RunState::Verified;

        result.state = RunState::Done;
        result.finished_at = Some(Utc::now());
        tracing::info!(
            state = ?result.state,
            verified = result.verified,
            warnings = result.has_warnings(),
            steps = result.steps.len(),
            "deployment finished"
        );
        result
    }

    fn fail(
        &self,
        mut result: DeploymentResult,
        step: &'static str,
        err: DeployError,
    ) -> DeploymentResult {
        tracing::error!(step, error = %err, "deployment failed");
        result.steps.push(StepOutcome {
            step,
            outcome: Outcome::Failed,
            detail: err.to_string(),
        });
        result.state = RunState::Failed;
        result.finished_at = Some(Utc::now());
        result
    }
}

fn record(result: &mut DeploymentResult, step: &'static str, outcome: Outcome, detail: String) {
    tracing::info!(step, outcome = %outcome, detail = %detail, "step outcome");
    result.steps.push(StepOutcome {
        step,
        outcome,
        detail,
    });
}
