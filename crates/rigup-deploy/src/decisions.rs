//! Deployment decision accumulator

use rigup_cloud::{Droplet, Volume};
use rigup_core::DeploymentDefinition;

/// Concrete choices accumulated while resolving a deployment definition
/// against live provider state.
///
/// Single-writer contract: each field is written by exactly one resolution
/// stage. `chosen_region` is set only during region resolution and is
/// immutable afterwards; floating-IP and volume resolution read it to scope
/// their candidate lists.
#[derive(Debug, Clone)]
pub struct Decisions {
    pub use_block_storage: bool,
    pub use_floating_ip: bool,
    pub chosen_region: String,
    pub chosen_floating_ip: Option<String>,
    pub chosen_volume: Option<Volume>,
    /// The machine created by orchestration, filled in last.
    pub droplet: Option<Droplet>,
}

impl Decisions {
    /// Seed the accumulator from the definition's requested values.
    pub fn from_definition(definition: &DeploymentDefinition) -> Self {
        Self {
            use_block_storage: true,
            use_floating_ip: false,
            chosen_region: definition.droplet.region.clone(),
            chosen_floating_ip: definition.droplet.floating_ip.clone(),
            chosen_volume: None,
            droplet: None,
        }
    }
}
