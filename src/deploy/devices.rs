use crate::config::Settings;
use crate::dashboard::{DashboardClient, Device, DeviceUpdate, Network};
use crate::error::{DeployError, DeployResult};

use super::request::{DeploymentRequest, DeviceRole};
use super::retry::with_retry;

/// The serial chosen for each role, in claim order.
#[derive(Debug, Clone)]
pub struct ResolvedSerials {
    pub switch: String,
    pub appliance: String,
}

impl ResolvedSerials {
    pub fn for_role(&self, role: DeviceRole) -> &str {
        match role {
            DeviceRole::Switch => &self.switch,
            DeviceRole::Appliance => &self.appliance,
        }
    }

    pub fn all(&self) -> Vec<String> {
        vec![self.switch.clone(), self.appliance.clone()]
    }
}

/// Decide which serial fills each role. An explicit override is used
/// verbatim with no inventory lookup; otherwise the organization inventory
/// must hold exactly one unclaimed device of the matching model category.
/// Zero candidates is a not-found error, more than one is ambiguous — the
/// tool never guesses. Read-only.
pub async fn resolve_serials(
    client: &dyn DashboardClient,
    settings: &Settings,
    request: &DeploymentRequest,
) -> DeployResult<ResolvedSerials> {
    // One scan shared by both roles, issued only when some role lacks an
    // override.
    let needs_scan = DeviceRole::ALL
        .iter()
        .any(|role| request.serial_override(*role).is_none());
    let inventory: Vec<Device> = if needs_scan {
        with_retry("inventory scan", || {
            client.list_inventory_devices(&settings.organization_id, None)
        })
        .await?
    } else {
        Vec::new()
    };

    let mut chosen: Vec<String> = Vec::with_capacity(2);

    for role in DeviceRole::ALL {
        if let Some(serial) = request.serial_override(role) {
            tracing::info!(%role, serial, "using serial override");
            chosen.push(serial.to_string());
            continue;
        }

        let candidates: Vec<&Device> = inventory
            .iter()
            .filter(|d| !d.is_claimed() && role.matches_model(&d.model))
            .collect();

        match candidates.as_slice() {
            [] => {
                return Err(DeployError::not_found(format!(
                    "no unclaimed {} in organization inventory",
                    role
                )))
            }
            [only] => {
                tracing::info!(%role, serial = %only.serial, model = %only.model, "resolved from inventory");
                chosen.push(only.serial.clone());
            }
            many => {
                let serials: Vec<&str> = many.iter().map(|d| d.serial.as_str()).collect();
                return Err(DeployError::ambiguous(format!(
                    "{} unclaimed {} candidates ({}); pass --{}-serial to pick one",
                    many.len(),
                    role,
                    serials.join(", "),
                    role
                )));
            }
        }
    }

    let mut chosen = chosen.into_iter();
    Ok(ResolvedSerials {
        switch: chosen.next().unwrap_or_default(),
        appliance: chosen.next().unwrap_or_default(),
    })
}

/// Result of the claim step: the inventory records seen for the requested
/// serials, plus which serials actually needed a claim call.
#[derive(Debug)]
pub struct ClaimSummary {
    pub devices: Vec<Device>,
    pub newly_claimed: Vec<String>,
    pub already_members: Vec<String>,
}

/// Claim both serials into the network with a single batched call. A serial
/// already a member of the target network is success, not failure; a serial
/// owned by a different network is a conflict — claiming never reassigns.
pub async fn claim(
    client: &dyn DashboardClient,
    settings: &Settings,
    network: &Network,
    serials: &[String],
) -> DeployResult<ClaimSummary> {
    let inventory = with_retry("inventory scan", || {
        client.list_inventory_devices(&settings.organization_id, None)
    })
    .await?;

    let mut summary = ClaimSummary {
        devices: Vec::new(),
        newly_claimed: Vec::new(),
        already_members: Vec::new(),
    };

    for serial in serials {
        match inventory.iter().find(|d| &d.serial == serial) {
            Some(device) => {
                match device.network_id.as_deref() {
                    Some(owner) if owner == network.id => {
                        tracing::info!(serial = %serial, "already a member of the target network");
                        summary.already_members.push(serial.clone());
                    }
                    Some(owner) => {
                        return Err(DeployError::conflict(format!(
                            "device {} is already claimed into network {}",
                            serial, owner
                        )));
                    }
                    None => summary.newly_claimed.push(serial.clone()),
                }
                summary.devices.push(device.clone());
            }
            // Not visible in inventory; let the remote decide whether the
            // serial is claimable.
            None => summary.newly_claimed.push(serial.clone()),
        }
    }

    if summary.newly_claimed.is_empty() {
        return Ok(summary);
    }

    let to_claim = summary.newly_claimed.clone();
    with_retry("device claim", || {
        client.claim_devices(&network.id, &to_claim)
    })
    .await?;
    tracing::info!(network_id = %network.id, serials = ?to_claim, "claimed devices");
    Ok(summary)
}

/// Assign identity attributes to a claimed device. The name follows the
/// `<model>_<serial>` convention when the model is known; the address, when
/// given, also moves the map marker. Absent fields leave the remote
/// attribute untouched.
pub async fn configure(
    client: &dyn DashboardClient,
    serial: &str,
    model: Option<&str>,
    address: Option<&str>,
) -> DeployResult<Option<Device>> {
    let update = DeviceUpdate {
        name: model.map(|m| format!("{}_{}", m, serial)),
        address: address.map(|a| a.to_string()),
        move_map_marker: address.map(|_| true),
    };

    if update.is_empty() {
        return Ok(None);
    }

    let device = with_retry("device update", || client.update_device(serial, &update)).await?;
    tracing::info!(serial, name = ?device.name, address = ?device.address, "configured device");
    Ok(Some(device))
}
