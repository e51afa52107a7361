use crate::config::Settings;
use crate::dashboard::{DashboardClient, Network, NetworkCreate};
use crate::error::{DeployError, DeployResult};

use super::request::{DeploymentRequest, DeviceRole, Outcome};
use super::retry::with_retry;

/// Find an existing network by exact name or create one. At most one
/// creating call per run. A same-named network is a conflict unless the
/// request opted into reuse; in dry-run a missing network is synthesized
/// with an empty id and no write is issued.
pub async fn resolve(
    client: &dyn DashboardClient,
    settings: &Settings,
    request: &DeploymentRequest,
) -> DeployResult<(Network, Outcome)> {
    let name = request.network_name.as_str();
    let networks = with_retry("network lookup", || {
        client.list_networks(&settings.organization_id, Some(name))
    })
    .await?;

    if let Some(existing) = networks.into_iter().find(|n| n.name == name) {
        if !request.ignore_existing {
            return Err(DeployError::conflict(format!(
                "network '{}' already exists ({}); pass --ignore-existing to reuse it",
                name, existing.id
            )));
        }
        tracing::info!(network_id = %existing.id, name, "using existing network");
        return Ok((existing, Outcome::NoOp));
    }

    let tags: Vec<String> = request.tags.iter().cloned().collect();

    if request.dry_run {
        let pending = Network {
            id: String::new(),
            name: name.to_string(),
            tags,
            config_template_id: None,
        };
        return Ok((pending, Outcome::WouldApply));
    }

    let create = NetworkCreate {
        name: name.to_string(),
        product_types: DeviceRole::ALL.iter().map(|r| r.product_type().to_string()).collect(),
        time_zone: settings.default_timezone.clone(),
        tags,
    };
    let network = with_retry("network create", || {
        client.create_network(&settings.organization_id, &create)
    })
    .await?;
    tracing::info!(network_id = %network.id, name, "created network");
    Ok((network, Outcome::Applied))
}

/// Bind the network to a named configuration template. Looking up the
/// template is a read and always happens; the bind itself is suppressed in
/// dry-run. Binding to the already-bound template is a no-op, binding to a
/// different one overwrites (last write wins).
pub async fn bind(
    client: &dyn DashboardClient,
    settings: &Settings,
    network: &Network,
    template_name: &str,
    dry_run: bool,
) -> DeployResult<(Network, Outcome)> {
    let templates = with_retry("template lookup", || {
        client.list_templates(&settings.organization_id)
    })
    .await?;

    let template = templates
        .into_iter()
        .find(|t| t.name == template_name)
        .ok_or_else(|| DeployError::not_found(format!("template '{}'", template_name)))?;

    if network.config_template_id.as_deref() == Some(template.id.as_str()) {
        return Ok((network.clone(), Outcome::NoOp));
    }

    if dry_run {
        return Ok((network.clone(), Outcome::WouldApply));
    }

    with_retry("template bind", || {
        client.bind_template(&network.id, &template.id)
    })
    .await?;
    tracing::info!(network_id = %network.id, template_id = %template.id, "bound network to template");

    let mut bound = network.clone();
    bound.config_template_id = Some(template.id);
    Ok((bound, Outcome::Applied))
}
