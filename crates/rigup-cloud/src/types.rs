//! Provider resource types
//!
//! Region fields on resources are carried as region slugs (`nyc1`, `sfo3`).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Region {
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub available: bool,
}

impl Region {
    pub fn supports_block_storage(&self) -> bool {
        self.features.iter().any(|f| f == "storage")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Droplet {
    pub id: u64,
    pub name: String,
    pub region: String,
    /// Provider lifecycle status: `new`, `active`, `off`, `archive`.
    pub status: String,
    #[serde(default)]
    pub networks: DropletNetworks,
}

impl Droplet {
    pub fn is_active(&self) -> bool {
        self.status == "active"
    }

    /// First public IPv4 address, once the droplet has finished booting.
    pub fn public_ipv4(&self) -> Option<&str> {
        self.networks
            .v4
            .iter()
            .find(|n| n.kind == "public")
            .map(|n| n.ip_address.as_str())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DropletNetworks {
    #[serde(default)]
    pub v4: Vec<NetworkV4>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkV4 {
    pub ip_address: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Volume {
    pub id: String,
    pub name: String,
    pub region: String,
    pub size_gigabytes: u32,
    /// Droplets this volume is currently attached to. The provider supports
    /// at most one attachment; anything more is surfaced as a hard error by
    /// the resolution layer.
    #[serde(default)]
    pub droplet_ids: Vec<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FloatingIp {
    pub ip: String,
    pub region: String,
    /// The droplet the IP is currently assigned to, if any.
    #[serde(default)]
    pub droplet: Option<AttachedDroplet>,
}

/// Minimal view of a droplet embedded in another resource's attachment state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttachedDroplet {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateDropletRequest {
    pub name: String,
    pub region: String,
    pub size: String,
    pub image: String,
    /// Fingerprints of keys authorized for first login.
    pub ssh_keys: Vec<String>,
    /// Volume ids to attach at creation time.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<String>,
    /// Rendered boot-configuration document, consumed by the image's
    /// first-boot agent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_data: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateVolumeRequest {
    pub name: String,
    pub region: String,
    pub size_gigabytes: u32,
}
