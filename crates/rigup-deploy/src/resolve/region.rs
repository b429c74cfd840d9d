//! Region resolution

use crate::decisions::Decisions;
use crate::error::Result;
use crate::interact::Interaction;
use rigup_cloud::CloudApi;
use rigup_core::DeploymentDefinition;

/// Check the requested region for block-storage support. When it has none,
/// the operator either switches to a region that does or the deployment
/// proceeds without block storage.
///
/// This is the only stage allowed to write `chosen_region`; every later
/// stage treats it as fixed.
pub async fn resolve_region(
    definition: &DeploymentDefinition,
    api: &dyn CloudApi,
    interact: &mut dyn Interaction,
    decisions: &mut Decisions,
) -> Result<()> {
    let regions = api.list_regions().await?;

    let supports_storage = regions
        .iter()
        .any(|r| r.slug == decisions.chosen_region && r.supports_block_storage());
    if supports_storage {
        return Ok(());
    }

    let change_region = interact.confirm(&format!(
        "Region \"{}\" does not support block storage volumes. \
         Would you like to change to a region that does?",
        definition.droplet.region
    ))?;

    if !change_region {
        decisions.use_block_storage = false;
        tracing::debug!(region = %decisions.chosen_region, "continuing without block storage");
        return Ok(());
    }

    let candidates: Vec<&rigup_cloud::Region> = regions
        .iter()
        .filter(|r| r.available && r.supports_block_storage())
        .collect();
    let labels: Vec<String> = candidates
        .iter()
        .map(|r| format!("{} ({})", r.name, r.slug))
        .collect();

    let index = interact.select(
        "Please select from the regions that support block storage",
        &labels,
    )?;
    decisions.chosen_region = candidates[index].slug.clone();
    tracing::debug!(region = %decisions.chosen_region, "switched region for block storage");

    Ok(())
}
