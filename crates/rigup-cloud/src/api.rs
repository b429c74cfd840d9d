//! Cloud provider trait definition

use crate::error::Result;
use crate::types::{
    CreateDropletRequest, CreateVolumeRequest, Droplet, FloatingIp, Region, Volume,
};
use async_trait::async_trait;

/// Operations the deployment flow needs from a cloud provider.
///
/// Object-safe so resolution and orchestration code can be exercised against
/// an in-memory fake. All listing calls are scoped to a region where the
/// provider supports it; region slugs are passed through verbatim.
#[async_trait]
pub trait CloudApi: Send + Sync {
    async fn list_regions(&self) -> Result<Vec<Region>>;

    async fn create_droplet(&self, request: &CreateDropletRequest) -> Result<Droplet>;
    async fn get_droplet(&self, id: u64) -> Result<Droplet>;
    async fn delete_droplet(&self, id: u64) -> Result<()>;
    /// Graceful shutdown; the droplet continues to exist.
    async fn shutdown_droplet(&self, id: u64) -> Result<()>;

    async fn create_volume(&self, request: &CreateVolumeRequest) -> Result<Volume>;
    async fn list_volumes(&self, region: &str) -> Result<Vec<Volume>>;
    async fn get_volume(&self, id: &str) -> Result<Volume>;
    async fn detach_volume(&self, volume_id: &str, droplet_id: u64, region: &str) -> Result<()>;

    async fn create_floating_ip(&self, region: &str) -> Result<FloatingIp>;
    async fn list_floating_ips(&self) -> Result<Vec<FloatingIp>>;
    async fn get_floating_ip(&self, ip: &str) -> Result<FloatingIp>;
    async fn assign_floating_ip(&self, ip: &str, droplet_id: u64) -> Result<()>;
    async fn unassign_floating_ip(&self, ip: &str) -> Result<()>;
}
