//! Droplet creation and boot wait

use crate::decisions::Decisions;
use crate::error::{DeployError, Result};
use crate::poller::{PollError, PollOutcome, Poller};
use rigup_cloud::{CloudApi, CreateDropletRequest, Droplet};
use rigup_core::DeploymentDefinition;
use std::time::Duration;

const BOOT_POLL_INTERVAL: Duration = Duration::from_millis(2500);

/// Submit the droplet spec: image, size, region, the attached volume if one
/// was decided, the setup key fingerprint, and the rendered cloud-config as
/// the first-boot payload.
pub async fn create_droplet(
    definition: &DeploymentDefinition,
    decisions: &Decisions,
    setup_key_fingerprint: &str,
    user_data: &str,
    api: &dyn CloudApi,
) -> Result<Droplet> {
    let name = droplet_name(definition);
    let volumes = decisions
        .chosen_volume
        .as_ref()
        .map(|volume| vec![volume.id.clone()])
        .unwrap_or_default();

    let request = CreateDropletRequest {
        name: name.clone(),
        region: decisions.chosen_region.clone(),
        size: definition.droplet.size.clone(),
        image: definition.droplet.image.clone(),
        ssh_keys: vec![setup_key_fingerprint.to_string()],
        volumes,
        user_data: Some(user_data.to_string()),
    };

    let droplet = api.create_droplet(&request).await?;
    tracing::info!(id = droplet.id, name = %name, "created droplet");
    Ok(droplet)
}

/// Poll the droplet until the provider reports it active, then hand back the
/// refreshed record (which now carries its networks).
///
/// TODO: bound this poll; a droplet that never leaves "new" keeps the
/// deployment spinning forever.
pub async fn wait_until_active(api: &dyn CloudApi, droplet_id: u64) -> Result<Droplet> {
    let poller = Poller::new(BOOT_POLL_INTERVAL);
    let droplet = poller
        .run(|| async move {
            match api.get_droplet(droplet_id).await {
                Ok(droplet) if droplet.is_active() => PollOutcome::Ready(droplet),
                Ok(_) => PollOutcome::Pending,
                Err(e) => PollOutcome::Failed(e),
            }
        })
        .await
        .map_err(|e| match e {
            PollError::Failed(e) => DeployError::Cloud(e),
            PollError::Exhausted(n) => {
                DeployError::Cloud(rigup_cloud::CloudError::Request(format!(
                    "droplet {droplet_id} not active after {n} checks"
                )))
            }
        })?;

    tracing::info!(id = droplet.id, "droplet is active");
    Ok(droplet)
}

fn droplet_name(definition: &DeploymentDefinition) -> String {
    if definition.domain.is_empty() {
        "showkit".to_string()
    } else {
        definition.domain.replace('.', "-")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn droplet_name_derives_from_domain() {
        let mut definition = crate::test_fixtures::minimal_definition();
        assert_eq!(droplet_name(&definition), "graphics-example-com");
        definition.domain.clear();
        assert_eq!(droplet_name(&definition), "showkit");
    }
}
