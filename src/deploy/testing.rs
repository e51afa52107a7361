//! In-memory dashboard used by the orchestrator tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::dashboard::{
    ConfigTemplate, DashboardClient, Device, DeviceUpdate, Network, NetworkCreate,
};
use crate::error::{DeployError, DeployResult};

#[derive(Default)]
pub struct FakeState {
    pub networks: Vec<Network>,
    pub templates: Vec<ConfigTemplate>,
    pub inventory: Vec<Device>,
    next_id: u32,
}

/// Trait-level fake with per-operation call counters, so tests can assert
/// which remote calls a run did (or did not) issue.
#[derive(Default)]
pub struct FakeDashboard {
    pub state: Mutex<FakeState>,
    pub create_network_calls: AtomicUsize,
    pub bind_calls: AtomicUsize,
    pub claim_calls: AtomicUsize,
    pub update_calls: AtomicUsize,
    pub inventory_scans: AtomicUsize,
    /// When set, name writes are silently dropped by the "remote".
    pub drop_name_updates: bool,
    /// Remaining transient failures to inject, per operation name.
    pub transient_failures: Mutex<HashMap<&'static str, u32>>,
}

impl FakeDashboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_inventory(devices: Vec<Device>) -> Self {
        let fake = Self::new();
        fake.state.lock().unwrap().inventory = devices;
        fake
    }

    pub fn device(serial: &str, model: &str) -> Device {
        Device {
            serial: serial.to_string(),
            model: model.to_string(),
            name: None,
            address: None,
            network_id: None,
        }
    }

    pub fn claimed_device(serial: &str, model: &str, network_id: &str) -> Device {
        Device {
            network_id: Some(network_id.to_string()),
            ..Self::device(serial, model)
        }
    }

    pub fn add_network(&self, name: &str) -> String {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = format!("N_{}", state.next_id);
        state.networks.push(Network {
            id: id.clone(),
            name: name.to_string(),
            tags: Vec::new(),
            config_template_id: None,
        });
        id
    }

    pub fn add_template(&self, id: &str, name: &str) {
        self.state.lock().unwrap().templates.push(ConfigTemplate {
            id: id.to_string(),
            name: name.to_string(),
        });
    }

    pub fn fail_transiently(&self, op: &'static str, times: u32) {
        self.transient_failures.lock().unwrap().insert(op, times);
    }

    /// Total writes issued (dry-run purity asserts this stays zero).
    pub fn mutation_calls(&self) -> usize {
        self.create_network_calls.load(Ordering::SeqCst)
            + self.bind_calls.load(Ordering::SeqCst)
            + self.claim_calls.load(Ordering::SeqCst)
            + self.update_calls.load(Ordering::SeqCst)
    }

    fn maybe_fail(&self, op: &'static str) -> DeployResult<()> {
        let mut failures = self.transient_failures.lock().unwrap();
        if let Some(remaining) = failures.get_mut(op) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(DeployError::transient(Some(503), format!("{} unavailable", op)));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl DashboardClient for FakeDashboard {
    async fn list_networks(
        &self,
        _org_id: &str,
        name_filter: Option<&str>,
    ) -> DeployResult<Vec<Network>> {
        self.maybe_fail("list_networks")?;
        let state = self.state.lock().unwrap();
        Ok(state
            .networks
            .iter()
            .filter(|n| name_filter.map_or(true, |f| n.name == f))
            .cloned()
            .collect())
    }

    async fn create_network(&self, _org_id: &str, create: &NetworkCreate) -> DeployResult<Network> {
        self.create_network_calls.fetch_add(1, Ordering::SeqCst);
        self.maybe_fail("create_network")?;
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let network = Network {
            id: format!("N_{}", state.next_id),
            name: create.name.clone(),
            tags: create.tags.clone(),
            config_template_id: None,
        };
        state.networks.push(network.clone());
        Ok(network)
    }

    async fn list_templates(&self, _org_id: &str) -> DeployResult<Vec<ConfigTemplate>> {
        self.maybe_fail("list_templates")?;
        Ok(self.state.lock().unwrap().templates.clone())
    }

    async fn bind_template(&self, network_id: &str, template_id: &str) -> DeployResult<()> {
        self.bind_calls.fetch_add(1, Ordering::SeqCst);
        self.maybe_fail("bind_template")?;
        let mut state = self.state.lock().unwrap();
        let network = state
            .networks
            .iter_mut()
            .find(|n| n.id == network_id)
            .ok_or_else(|| DeployError::not_found(format!("network {}", network_id)))?;
        network.config_template_id = Some(template_id.to_string());
        Ok(())
    }

    async fn list_inventory_devices(
        &self,
        _org_id: &str,
        model_filter: Option<&str>,
    ) -> DeployResult<Vec<Device>> {
        self.inventory_scans.fetch_add(1, Ordering::SeqCst);
        self.maybe_fail("list_inventory_devices")?;
        let state = self.state.lock().unwrap();
        Ok(state
            .inventory
            .iter()
            .filter(|d| model_filter.map_or(true, |f| d.model.starts_with(f)))
            .cloned()
            .collect())
    }

    async fn claim_devices(&self, network_id: &str, serials: &[String]) -> DeployResult<()> {
        self.claim_calls.fetch_add(1, Ordering::SeqCst);
        self.maybe_fail("claim_devices")?;
        let mut state = self.state.lock().unwrap();
        for serial in serials {
            let device = state
                .inventory
                .iter_mut()
                .find(|d| &d.serial == serial)
                .ok_or_else(|| DeployError::conflict(format!("unknown serial {}", serial)))?;
            match device.network_id.as_deref() {
                Some(owner) if owner != network_id => {
                    return Err(DeployError::conflict(format!(
                        "{} already claimed into {}",
                        serial, owner
                    )));
                }
                _ => device.network_id = Some(network_id.to_string()),
            }
        }
        Ok(())
    }

    async fn update_device(&self, serial: &str, update: &DeviceUpdate) -> DeployResult<Device> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        self.maybe_fail("update_device")?;
        let mut state = self.state.lock().unwrap();
        let device = state
            .inventory
            .iter_mut()
            .find(|d| d.serial == serial)
            .ok_or_else(|| DeployError::not_found(format!("device {}", serial)))?;
        if !self.drop_name_updates {
            if let Some(name) = &update.name {
                device.name = Some(name.clone());
            }
        }
        if let Some(address) = &update.address {
            device.address = Some(address.clone());
        }
        Ok(device.clone())
    }

    async fn list_network_devices(&self, network_id: &str) -> DeployResult<Vec<Device>> {
        self.maybe_fail("list_network_devices")?;
        let state = self.state.lock().unwrap();
        Ok(state
            .inventory
            .iter()
            .filter(|d| d.network_id.as_deref() == Some(network_id))
            .cloned()
            .collect())
    }
}
