use serde::{Deserialize, Serialize};

// --- Dashboard API types ---

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Network {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub config_template_id: Option<String>,
}

/// An inventory device. `network_id` is its current owner, if any; a device
/// exists in organization inventory before it is ever claimed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub serial: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub network_id: Option<String>,
}

impl Device {
    pub fn is_claimed(&self) -> bool {
        self.network_id.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigTemplate {
    pub id: String,
    pub name: String,
}

// --- Write payloads ---

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkCreate {
    pub name: String,
    pub product_types: Vec<String>,
    pub time_zone: String,
    pub tags: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ClaimRequest {
    pub serials: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BindRequest {
    pub config_template_id: String,
}

/// Partial device update. Absent fields are not serialized, so the remote
/// attribute is left untouched rather than overwritten with an empty value.
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub move_map_marker: Option<bool>,
}

impl DeviceUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.address.is_none()
    }
}
