//! Provisioning state machine
//!
//! Linear sequence with two bounded-only-by-success retry loops:
//!
//! create droplet -> wait active -> [assign floating IP] ->
//! [wait for DNS] -> connect ssh (retry) -> [mount volume] ->
//! wait for cloud-init (retry) -> revoke setup access
//!
//! Once a mutating call has been issued there is no compensating action on a
//! later failure: whatever was created stays and is reported, never rolled
//! back silently.

use crate::credentials::Credentials;
use crate::decisions::Decisions;
use crate::error::{DeployError, Result};
use crate::interact::Interaction;
use crate::poller::Poller;
use crate::ssh::OpenSsh;
use crate::steps;
use rigup_cloud::{CloudApi, Droplet};
use rigup_core::DeploymentDefinition;
use std::time::Duration;

const SSH_RETRY_INTERVAL: Duration = Duration::from_secs(2);
const CLOUD_INIT_POLL_INTERVAL: Duration = Duration::from_secs(2);

pub struct Orchestrator<'a> {
    pub api: &'a dyn CloudApi,
    pub interact: &'a mut dyn Interaction,
}

impl Orchestrator<'_> {
    /// Drive the machine from creation to confirmed-healthy. On success the
    /// droplet is recorded in `decisions` and returned.
    pub async fn run(
        &mut self,
        definition: &DeploymentDefinition,
        decisions: &mut Decisions,
        credentials: &Credentials,
        user_data: &str,
    ) -> Result<Droplet> {
        let fingerprint = credentials.setup_keypair.fingerprint().await?;
        let created =
            steps::create_droplet(definition, decisions, &fingerprint, user_data, self.api)
                .await?;

        let droplet = steps::wait_until_active(self.api, created.id).await?;
        let droplet_ip = droplet
            .public_ipv4()
            .ok_or(DeployError::NoPublicAddress(droplet.id))?
            .to_string();

        if decisions.use_floating_ip
            && let Some(floating_ip) = &decisions.chosen_floating_ip
        {
            self.api.assign_floating_ip(floating_ip, droplet.id).await?;
            tracing::info!(floating_ip, droplet = droplet.id, "assigned floating IP");

            // First-boot certificate issuance needs the domain correct
            // before the HTTP challenge runs.
            if definition.secure {
                steps::wait_until_domain_resolves(
                    &definition.domain,
                    floating_ip,
                    self.interact,
                )
                .await?;
            }
        }

        let shell = steps::connect_with_retry(&Poller::new(SSH_RETRY_INTERVAL), || {
            OpenSsh::connect(
                droplet_ip.clone(),
                crate::generate::DROPLET_USER,
                credentials.setup_keypair.private_key_path(),
            )
        })
        .await?;

        if decisions.use_block_storage
            && let Some(volume) = &decisions.chosen_volume
        {
            steps::mount_volume(&shell, volume).await?;
        }

        steps::wait_for_cloud_init(&shell, &Poller::new(CLOUD_INIT_POLL_INTERVAL)).await?;
        steps::revoke_setup_key(&shell).await?;

        decisions.droplet = Some(droplet.clone());
        Ok(droplet)
    }
}
