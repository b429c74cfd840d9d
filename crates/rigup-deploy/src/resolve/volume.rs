//! Block-storage volume resolution
//!
//! Runs only when block storage is in use. A volume identified by id must
//! exist and sit in the chosen region; one identified by name must match
//! exactly one in-region volume (two or more matches is surfaced as an
//! error, never guessed). With nothing specified the operator creates a new
//! volume or picks an existing one.
//!
//! A volume attached to exactly one other droplet triggers conflict
//! resolution; attachment to two or more droplets is outside the provider
//! model this tool was built for and is a hard error.

use crate::decisions::Decisions;
use crate::error::{DeployError, Result};
use crate::interact::Interaction;
use rigup_cloud::{CloudApi, CloudError, CreateVolumeRequest, Volume};
use rigup_core::DeploymentDefinition;

pub async fn resolve_volume(
    definition: &DeploymentDefinition,
    api: &dyn CloudApi,
    interact: &mut dyn Interaction,
    decisions: &mut Decisions,
) -> Result<()> {
    let volume = if let Some(id) = &definition.volume.id {
        resolve_by_id(id, definition, api, interact, decisions).await?
    } else if let Some(name) = &definition.volume.name {
        resolve_by_name(name, definition, api, interact, decisions).await?
    } else {
        select_volume_action(None, definition, api, interact, decisions).await?
    };

    let volume = ensure_unattached(&volume, api, interact).await?;
    decisions.chosen_volume = Some(volume);
    Ok(())
}

async fn resolve_by_id(
    id: &str,
    definition: &DeploymentDefinition,
    api: &dyn CloudApi,
    interact: &mut dyn Interaction,
    decisions: &mut Decisions,
) -> Result<Volume> {
    match api.get_volume(id).await {
        Ok(volume) if volume.region == decisions.chosen_region => Ok(volume),
        Ok(volume) => {
            let message = format!(
                "The defined volume ({}) is in region {}, but this deployment is for {}.",
                id, volume.region, decisions.chosen_region
            );
            select_volume_action(Some(message), definition, api, interact, decisions).await
        }
        Err(CloudError::ResourceNotFound(_)) => {
            let message = format!("The defined volume ({id}) does not exist.");
            select_volume_action(Some(message), definition, api, interact, decisions).await
        }
        Err(e) => Err(e.into()),
    }
}

async fn resolve_by_name(
    name: &str,
    definition: &DeploymentDefinition,
    api: &dyn CloudApi,
    interact: &mut dyn Interaction,
    decisions: &mut Decisions,
) -> Result<Volume> {
    let mut matches: Vec<Volume> = api
        .list_volumes(&decisions.chosen_region)
        .await?
        .into_iter()
        .filter(|v| v.name == name)
        .collect();

    match matches.len() {
        1 => Ok(matches.remove(0)),
        0 => {
            let message = format!(
                "No volume named \"{}\" exists in region {}.",
                name, decisions.chosen_region
            );
            select_volume_action(Some(message), definition, api, interact, decisions).await
        }
        _ => Err(DeployError::AmbiguousVolumeName {
            name: name.to_string(),
            region: decisions.chosen_region.clone(),
        }),
    }
}

/// The "no usable volume specified" flow: create a new volume or choose an
/// existing in-region one. Aborting is always on the table.
async fn select_volume_action(
    context: Option<String>,
    definition: &DeploymentDefinition,
    api: &dyn CloudApi,
    interact: &mut dyn Interaction,
    decisions: &mut Decisions,
) -> Result<Volume> {
    let context = context.unwrap_or_else(|| {
        "This deployment definition does not specify a volume to use for block storage."
            .to_string()
    });

    let available = api.list_volumes(&decisions.chosen_region).await?;

    let mut choices = vec!["Create a new volume".to_string()];
    if !available.is_empty() {
        choices.push("Choose an existing volume".to_string());
    }
    choices.push("Abort (make no changes and cancel this deployment)".to_string());

    let message = format!("{context} How would you like to proceed?");
    let index = interact.select(&message, &choices)?;

    // Indexes shift when no existing volumes are offered.
    let create = index == 0;
    let choose_existing = !available.is_empty() && index == 1;

    if create {
        let (Some(name), Some(size_gigabytes)) = (
            definition.volume.name.clone(),
            definition.volume.size_gigabytes,
        ) else {
            return Err(DeployError::IncompleteVolumeSpec);
        };
        let volume = api
            .create_volume(&CreateVolumeRequest {
                name,
                region: decisions.chosen_region.clone(),
                size_gigabytes,
            })
            .await?;
        tracing::info!(volume = %volume.name, "created block storage volume");
        Ok(volume)
    } else if choose_existing {
        let labels: Vec<String> = available
            .iter()
            .map(|v| match v.droplet_ids.len() {
                0 => v.name.clone(),
                n => format!("{} (currently attached to {n} other droplet(s))", v.name),
            })
            .collect();
        let chosen = interact.select(
            "Please choose a block storage volume to use for this deployment",
            &labels,
        )?;
        Ok(available.into_iter().nth(chosen).expect("index from selection"))
    } else {
        Err(DeployError::Aborted)
    }
}

/// Surface and resolve an existing attachment before the volume is used.
/// Returns the volume with its attachment state updated to match what the
/// chosen resolution did.
async fn ensure_unattached(
    volume: &Volume,
    api: &dyn CloudApi,
    interact: &mut dyn Interaction,
) -> Result<Volume> {
    match volume.droplet_ids.len() {
        0 => return Ok(volume.clone()),
        1 => {}
        count => {
            return Err(DeployError::UnsupportedAttachment {
                name: volume.name.clone(),
                count,
            });
        }
    }

    let old_droplet = api.get_droplet(volume.droplet_ids[0]).await?;

    let choices = vec![
        format!("Destroy droplet \"{}\"", old_droplet.name),
        format!("Shutdown droplet \"{}\"", old_droplet.name),
        "Abort (make no changes and cancel this deployment)".to_string(),
    ];
    let message = format!(
        "Volume \"{}\" is currently attached to droplet \"{}\". How do you want to proceed?",
        volume.name, old_droplet.name
    );

    match interact.select(&message, &choices)? {
        0 => {
            // Destroying the droplet detaches all of its volumes.
            api.delete_droplet(old_droplet.id).await?;
            tracing::info!(droplet = %old_droplet.name, "destroyed droplet holding volume");
        }
        1 => {
            api.shutdown_droplet(old_droplet.id).await?;
            api.detach_volume(&volume.id, old_droplet.id, &volume.region)
                .await?;
            tracing::info!(
                droplet = %old_droplet.name,
                volume = %volume.name,
                "shut down droplet and detached volume"
            );
        }
        _ => return Err(DeployError::Aborted),
    }

    let mut resolved = volume.clone();
    resolved.droplet_ids.clear();
    Ok(resolved)
}
