//! DigitalOcean v2 API client
//!
//! Thin typed wrapper over the REST endpoints the deployment flow uses.
//! Responses come wrapped in per-resource envelopes (`{"droplet": {...}}`,
//! `{"volumes": [...]}`); error bodies carry `{"id", "message"}`.

use crate::error::{DigitalOceanError, Result};
use async_trait::async_trait;
use rigup_cloud::{
    CloudApi, CreateDropletRequest, CreateVolumeRequest, Droplet, FloatingIp, Region, Volume,
};
use serde::Deserialize;
use serde::de::DeserializeOwned;

const API_BASE: &str = "https://api.digitalocean.com/v2";

/// Listing endpoints are paginated; one page of this size covers every
/// account the tool is realistically pointed at.
const PER_PAGE: u32 = 200;

pub struct DigitalOceanApi {
    client: reqwest::Client,
    token: String,
    base_url: String,
}

impl DigitalOceanApi {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            token: token.into(),
            base_url: API_BASE.to_string(),
        }
    }

    /// Point the client at a different endpoint (local API stub in tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        tracing::debug!(path, "GET");
        let response = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .bearer_auth(&self.token)
            .send()
            .await?;
        Self::decode(path, response).await
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<T> {
        tracing::debug!(path, "POST");
        let response = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await?;
        Self::decode(path, response).await
    }

    /// POST for action endpoints whose response body we do not consume.
    async fn post_action(&self, path: &str, body: &serde_json::Value) -> Result<()> {
        tracing::debug!(path, "POST");
        let response = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await?;
        Self::check_status(path, &response)?;
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<()> {
        tracing::debug!(path, "DELETE");
        let response = self
            .client
            .delete(format!("{}{}", self.base_url, path))
            .bearer_auth(&self.token)
            .send()
            .await?;
        Self::check_status(path, &response)?;
        Ok(())
    }

    async fn decode<T: DeserializeOwned>(path: &str, response: reqwest::Response) -> Result<T> {
        Self::check_status(path, &response)?;
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    fn check_status(path: &str, response: &reqwest::Response) -> Result<()> {
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        match status.as_u16() {
            401 => Err(DigitalOceanError::AuthenticationFailed(
                "the DigitalOcean token was rejected".to_string(),
            )),
            404 => Err(DigitalOceanError::NotFound(path.to_string())),
            code => Err(DigitalOceanError::Api {
                status: code,
                message: format!("{path} returned {status}"),
            }),
        }
    }
}

// ============ Response envelopes ============

#[derive(Deserialize)]
struct RegionsEnvelope {
    regions: Vec<Region>,
}

#[derive(Deserialize)]
struct DropletEnvelope {
    droplet: Droplet,
}

#[derive(Deserialize)]
struct VolumeEnvelope {
    volume: ApiVolume,
}

#[derive(Deserialize)]
struct VolumesEnvelope {
    volumes: Vec<ApiVolume>,
}

#[derive(Deserialize)]
struct FloatingIpEnvelope {
    floating_ip: ApiFloatingIp,
}

#[derive(Deserialize)]
struct FloatingIpsEnvelope {
    floating_ips: Vec<ApiFloatingIp>,
}

/// Volumes and floating IPs embed a full region object; the rest of the
/// system only cares about its slug.
#[derive(Deserialize)]
struct ApiRegion {
    slug: String,
}

#[derive(Deserialize)]
struct ApiVolume {
    id: String,
    name: String,
    region: ApiRegion,
    size_gigabytes: u32,
    #[serde(default)]
    droplet_ids: Vec<u64>,
}

impl From<ApiVolume> for Volume {
    fn from(v: ApiVolume) -> Self {
        Volume {
            id: v.id,
            name: v.name,
            region: v.region.slug,
            size_gigabytes: v.size_gigabytes,
            droplet_ids: v.droplet_ids,
        }
    }
}

#[derive(Deserialize)]
struct ApiFloatingIp {
    ip: String,
    region: ApiRegion,
    #[serde(default)]
    droplet: Option<ApiAttachedDroplet>,
}

#[derive(Deserialize)]
struct ApiAttachedDroplet {
    id: u64,
    name: String,
}

impl From<ApiFloatingIp> for FloatingIp {
    fn from(f: ApiFloatingIp) -> Self {
        FloatingIp {
            ip: f.ip,
            region: f.region.slug,
            droplet: f.droplet.map(|d| rigup_cloud::AttachedDroplet {
                id: d.id,
                name: d.name,
            }),
        }
    }
}

#[async_trait]
impl CloudApi for DigitalOceanApi {
    async fn list_regions(&self) -> rigup_cloud::Result<Vec<Region>> {
        let envelope: RegionsEnvelope = self
            .get_json(&format!("/regions?per_page={PER_PAGE}"))
            .await?;
        Ok(envelope.regions)
    }

    async fn create_droplet(
        &self,
        request: &CreateDropletRequest,
    ) -> rigup_cloud::Result<Droplet> {
        let body = serde_json::to_value(request)
            .map_err(|e| rigup_cloud::CloudError::InvalidResponse(e.to_string()))?;
        let envelope: DropletEnvelope = self.post_json("/droplets", &body).await?;
        Ok(envelope.droplet)
    }

    async fn get_droplet(&self, id: u64) -> rigup_cloud::Result<Droplet> {
        let envelope: DropletEnvelope = self.get_json(&format!("/droplets/{id}")).await?;
        Ok(envelope.droplet)
    }

    async fn delete_droplet(&self, id: u64) -> rigup_cloud::Result<()> {
        self.delete(&format!("/droplets/{id}")).await?;
        Ok(())
    }

    async fn shutdown_droplet(&self, id: u64) -> rigup_cloud::Result<()> {
        self.post_action(
            &format!("/droplets/{id}/actions"),
            &serde_json::json!({ "type": "shutdown" }),
        )
        .await?;
        Ok(())
    }

    async fn create_volume(&self, request: &CreateVolumeRequest) -> rigup_cloud::Result<Volume> {
        let body = serde_json::to_value(request)
            .map_err(|e| rigup_cloud::CloudError::InvalidResponse(e.to_string()))?;
        let envelope: VolumeEnvelope = self.post_json("/volumes", &body).await?;
        Ok(envelope.volume.into())
    }

    async fn list_volumes(&self, region: &str) -> rigup_cloud::Result<Vec<Volume>> {
        let envelope: VolumesEnvelope = self
            .get_json(&format!("/volumes?region={region}&per_page={PER_PAGE}"))
            .await?;
        Ok(envelope.volumes.into_iter().map(Into::into).collect())
    }

    async fn get_volume(&self, id: &str) -> rigup_cloud::Result<Volume> {
        let envelope: VolumeEnvelope = self.get_json(&format!("/volumes/{id}")).await?;
        Ok(envelope.volume.into())
    }

    async fn detach_volume(
        &self,
        volume_id: &str,
        droplet_id: u64,
        region: &str,
    ) -> rigup_cloud::Result<()> {
        self.post_action(
            &format!("/volumes/{volume_id}/actions"),
            &serde_json::json!({
                "type": "detach",
                "droplet_id": droplet_id,
                "region": region,
            }),
        )
        .await?;
        Ok(())
    }

    async fn create_floating_ip(&self, region: &str) -> rigup_cloud::Result<FloatingIp> {
        let envelope: FloatingIpEnvelope = self
            .post_json(
                "/floating_ips",
                &serde_json::json!({ "region": region }),
            )
            .await?;
        Ok(envelope.floating_ip.into())
    }

    async fn list_floating_ips(&self) -> rigup_cloud::Result<Vec<FloatingIp>> {
        let envelope: FloatingIpsEnvelope = self
            .get_json(&format!("/floating_ips?per_page={PER_PAGE}"))
            .await?;
        Ok(envelope.floating_ips.into_iter().map(Into::into).collect())
    }

    async fn get_floating_ip(&self, ip: &str) -> rigup_cloud::Result<FloatingIp> {
        let envelope: FloatingIpEnvelope = self.get_json(&format!("/floating_ips/{ip}")).await?;
        Ok(envelope.floating_ip.into())
    }

    async fn assign_floating_ip(&self, ip: &str, droplet_id: u64) -> rigup_cloud::Result<()> {
        self.post_action(
            &format!("/floating_ips/{ip}/actions"),
            &serde_json::json!({ "type": "assign", "droplet_id": droplet_id }),
        )
        .await?;
        Ok(())
    }

    async fn unassign_floating_ip(&self, ip: &str) -> rigup_cloud::Result<()> {
        self.post_action(
            &format!("/floating_ips/{ip}/actions"),
            &serde_json::json!({ "type": "unassign" }),
        )
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn volume_envelope_decodes() {
        let body = r#"{
            "volume": {
                "id": "506f78a4-e098-11e5-ad9f-000f53306ae1",
                "name": "showkit-data",
                "region": { "slug": "nyc1", "name": "New York 1" },
                "size_gigabytes": 40,
                "droplet_ids": [123]
            }
        }"#;
        let envelope: VolumeEnvelope = serde_json::from_str(body).unwrap();
        let volume: Volume = envelope.volume.into();
        assert_eq!(volume.region, "nyc1");
        assert_eq!(volume.droplet_ids, vec![123]);
    }

    #[test]
    fn floating_ip_envelope_decodes_attachment() {
        let body = r#"{
            "floating_ip": {
                "ip": "45.55.96.47",
                "region": { "slug": "sfo3" },
                "droplet": { "id": 8, "name": "old-rig", "status": "active" }
            }
        }"#;
        let envelope: FloatingIpEnvelope = serde_json::from_str(body).unwrap();
        let ip: FloatingIp = envelope.floating_ip.into();
        assert_eq!(ip.droplet.as_ref().unwrap().name, "old-rig");
    }

    #[test]
    fn create_droplet_request_serializes_user_data() {
        let request = CreateDropletRequest {
            name: "showkit".into(),
            region: "nyc1".into(),
            size: "s-1vcpu-2gb".into(),
            image: "ubuntu-24-04-x64".into(),
            ssh_keys: vec!["aa:bb".into()],
            volumes: vec![],
            user_data: Some("#cloud-config\n".into()),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["user_data"], "#cloud-config\n");
        // Empty volume list is omitted entirely rather than sent as [].
        assert!(value.get("volumes").is_none());
    }
}
