use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{DeployError, DeployResult};

use super::types::*;

/// Capability contract for the remote management API. The orchestrator and
/// its steps depend only on this trait; tests substitute an in-memory fake.
#[async_trait]
pub trait DashboardClient: Send + Sync {
    async fn list_networks(
        &self,
        org_id: &str,
        name_filter: Option<&str>,
    ) -> DeployResult<Vec<Network>>;

    async fn create_network(&self, org_id: &str, create: &NetworkCreate) -> DeployResult<Network>;

    async fn list_templates(&self, org_id: &str) -> DeployResult<Vec<ConfigTemplate>>;

    async fn bind_template(&self, network_id: &str, template_id: &str) -> DeployResult<()>;

    async fn list_inventory_devices(
        &self,
        org_id: &str,
        model_filter: Option<&str>,
    ) -> DeployResult<Vec<Device>>;

    async fn claim_devices(&self, network_id: &str, serials: &[String]) -> DeployResult<()>;

    async fn update_device(&self, serial: &str, update: &DeviceUpdate) -> DeployResult<Device>;

    async fn list_network_devices(&self, network_id: &str) -> DeployResult<Vec<Device>>;
}

/// Dashboard API client over HTTPS.
pub struct HttpDashboardClient {
    base_url: String,
    api_key: String,
    client: Client,
}

impl HttpDashboardClient {
    pub fn new(base_url: String, api_key: String) -> DeployResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| DeployError::config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Map a non-success response to the error taxonomy. 429 and 5xx are
    /// retryable; everything else is permanent.
    async fn error_for(what: &str, resp: reqwest::Response) -> DeployError {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                DeployError::auth(format!("{}: {}", what, body))
            }
            StatusCode::NOT_FOUND => DeployError::not_found(format!("{}: {}", what, body)),
            // The dashboard reports claim/validation rejections as 400.
            StatusCode::BAD_REQUEST | StatusCode::CONFLICT => {
                DeployError::conflict(format!("{}: {}", what, body))
            }
            s if s == StatusCode::TOO_MANY_REQUESTS || s.is_server_error() => {
                DeployError::transient(Some(s.as_u16()), format!("{}: {}", what, body))
            }
            s => DeployError::conflict(format!("{}: unexpected status {}: {}", what, s, body)),
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        what: &str,
        path: &str,
        query: &[(&str, &str)],
    ) -> DeployResult<T> {
        let resp = self
            .client
            .get(self.url(path))
            .query(query)
            .bearer_auth(&self.api_key)
            .header("Accept", "application/json")
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(Self::error_for(what, resp).await);
        }
        Ok(resp.json().await?)
    }

    async fn post_json<B: Serialize>(
        &self,
        what: &str,
        path: &str,
        body: &B,
    ) -> DeployResult<reqwest::Response> {
        let resp = self
            .client
            .post(self.url(path))
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(Self::error_for(what, resp).await);
        }
        Ok(resp)
    }
}

#[async_trait]
impl DashboardClient for HttpDashboardClient {
    async fn list_networks(
        &self,
        org_id: &str,
        name_filter: Option<&str>,
    ) -> DeployResult<Vec<Network>> {
        let path = format!("/organizations/{}/networks", org_id);
        let mut query = Vec::new();
        if let Some(name) = name_filter {
            query.push(("name", name));
        }
        self.get_json("list networks", &path, &query).await
    }

    async fn create_network(&self, org_id: &str, create: &NetworkCreate) -> DeployResult<Network> {
        let path = format!("/organizations/{}/networks", org_id);
        let resp = self.post_json("create network", &path, create).await?;
        Ok(resp.json().await?)
    }

    async fn list_templates(&self, org_id: &str) -> DeployResult<Vec<ConfigTemplate>> {
        let path = format!("/organizations/{}/configTemplates", org_id);
        self.get_json("list templates", &path, &[]).await
    }

    async fn bind_template(&self, network_id: &str, template_id: &str) -> DeployResult<()> {
        let path = format!("/networks/{}/bind", network_id);
        let body = BindRequest {
            config_template_id: template_id.to_string(),
        };
        self.post_json("bind template", &path, &body).await?;
        Ok(())
    }

    async fn list_inventory_devices(
        &self,
        org_id: &str,
        model_filter: Option<&str>,
    ) -> DeployResult<Vec<Device>> {
        let path = format!("/organizations/{}/inventory/devices", org_id);
        let mut query = Vec::new();
        if let Some(model) = model_filter {
            query.push(("model", model));
        }
        self.get_json("list inventory", &path, &query).await
    }

    async fn claim_devices(&self, network_id: &str, serials: &[String]) -> DeployResult<()> {
        let path = format!("/networks/{}/devices/claim", network_id);
        let body = ClaimRequest {
            serials: serials.to_vec(),
        };
        self.post_json("claim devices", &path, &body).await?;
        Ok(())
    }

    async fn update_device(&self, serial: &str, update: &DeviceUpdate) -> DeployResult<Device> {
        let resp = self
            .client
            .put(self.url(&format!("/devices/{}", serial)))
            .bearer_auth(&self.api_key)
            .json(update)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(Self::error_for("update device", resp).await);
        }
        Ok(resp.json().await?)
    }

    async fn list_network_devices(&self, network_id: &str) -> DeployResult<Vec<Device>> {
        let path = format!("/networks/{}/devices", network_id);
        self.get_json("list network devices", &path, &[]).await
    }
}
