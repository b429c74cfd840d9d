//! Cloud provider abstraction for rigup
//!
//! Defines the resource model (regions, droplets, volumes, floating IPs) and
//! the [`CloudApi`] trait the deployment flow is written against. The concrete
//! DigitalOcean client lives in `rigup-cloud-digitalocean`; tests drive the
//! deployment flow with an in-memory implementation.
//!
//! Droplets, volumes, and floating IPs are provider-global state: they may
//! pre-exist from earlier runs and be attached to machines this deployment
//! knows nothing about. The resolution layer above this crate is responsible
//! for surfacing those conflicts before any mutating call is issued.

pub mod api;
pub mod error;
pub mod types;

pub use api::CloudApi;
pub use error::{CloudError, Result};
pub use types::{
    AttachedDroplet, CreateDropletRequest, CreateVolumeRequest, Droplet, DropletNetworks,
    FloatingIp, NetworkV4, Region, Volume,
};
