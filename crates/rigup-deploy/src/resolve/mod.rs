//! Decision resolution against live provider state
//!
//! Turns the definition's requested region, floating IP, and volume into
//! concrete, conflict-free choices. Region goes first because it gates which
//! volumes and IPs are even eligible. Floating IP is resolved before the
//! volume only because IP adoption can later require waiting on DNS
//! convergence, which should not hold up volume work; there is no data
//! dependency between the two.
//!
//! Pre-existing attachments are never overridden silently: every conflict is
//! put to the operator, and declining always leaves provider state untouched.

mod floating_ip;
mod region;
mod volume;

pub use floating_ip::resolve_floating_ip;
pub use region::resolve_region;
pub use volume::resolve_volume;

use crate::decisions::Decisions;
use crate::error::Result;
use crate::interact::Interaction;
use rigup_cloud::CloudApi;
use rigup_core::DeploymentDefinition;

/// Run every resolution stage in order. Volume resolution is skipped
/// entirely when region resolution opted out of block storage.
pub async fn resolve_decisions(
    definition: &DeploymentDefinition,
    api: &dyn CloudApi,
    interact: &mut dyn Interaction,
) -> Result<Decisions> {
    let mut decisions = Decisions::from_definition(definition);

    resolve_region(definition, api, interact, &mut decisions).await?;
    resolve_floating_ip(api, interact, &mut decisions).await?;
    if decisions.use_block_storage {
        resolve_volume(definition, api, interact, &mut decisions).await?;
    }

    Ok(decisions)
}
