use serde::Serialize;

use crate::dashboard::{DashboardClient, Network};
use crate::error::DeployResult;

use super::request::DeployedDevice;
use super::retry::with_retry;

#[derive(Debug, Clone, Serialize)]
pub struct Mismatch {
    pub serial: String,
    pub field: &'static str,
    pub expected: String,
    pub actual: String,
}

#[derive(Debug, Serialize)]
pub struct VerifyReport {
    pub ok: bool,
    pub mismatches: Vec<Mismatch>,
}

/// Re-read the network's live device list and reconcile it against what the
/// run expected: serial membership always, name/address only where the run
/// assigned them. Read-only; external modification during the run surfaces
/// here as a mismatch rather than an error.
pub async fn verify(
    client: &dyn DashboardClient,
    network: &Network,
    expected: &[DeployedDevice],
) -> DeployResult<VerifyReport> {
    let live = with_retry("network device list", || {
        client.list_network_devices(&network.id)
    })
    .await?;

    let mut mismatches = Vec::new();

    for want in expected {
        let Some(actual) = live.iter().find(|d| d.serial == want.serial) else {
            mismatches.push(Mismatch {
                serial: want.serial.clone(),
                field: "membership",
                expected: "member".to_string(),
                actual: "absent".to_string(),
            });
            continue;
        };

        if let Some(expected_name) = &want.name {
            if actual.name.as_deref() != Some(expected_name.as_str()) {
                mismatches.push(Mismatch {
                    serial: want.serial.clone(),
                    field: "name",
                    expected: expected_name.clone(),
                    actual: actual.name.clone().unwrap_or_default(),
                });
            }
        }

        if let Some(expected_address) = &want.address {
            if actual.address.as_deref() != Some(expected_address.as_str()) {
                mismatches.push(Mismatch {
                    serial: want.serial.clone(),
                    field: "address",
                    expected: expected_address.clone(),
                    actual: actual.address.clone().unwrap_or_default(),
                });
            }
        }
    }

    Ok(VerifyReport {
        ok: mismatches.is_empty(),
        mismatches,
    })
}
