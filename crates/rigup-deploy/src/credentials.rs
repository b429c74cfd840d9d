//! Credential collection for one deployment run
//!
//! Each provider's credentials keep their own shape rather than sharing a
//! loose bag: the cloud token, per-source-host credentials, the operator's
//! long-lived public key, and the ephemeral setup keypair generated fresh
//! per run.
//!
//! Before prompting, every bundle repository gets a concurrent read-only
//! permission probe; only hosts that actually gate access get a credential
//! prompt.

use crate::artifact::ArtifactResolver;
use crate::error::{DeployError, Result};
use crate::interact::Interaction;
use crate::ssh::EphemeralKeypair;
use futures_util::future::join_all;
use rigup_core::{DeploymentDefinition, SourceHost};
use rigup_config::StoredCredentials;
use std::collections::HashSet;

#[derive(Debug, Clone)]
pub struct GitHubCredentials {
    pub username: String,
    pub token: String,
}

#[derive(Debug, Clone)]
pub struct BitbucketCredentials {
    pub username: String,
    pub app_password: String,
}

/// Everything secret a single deployment run needs. Held read-only for the
/// duration of the run and dropped at the end; the setup keypair's files go
/// with it.
pub struct Credentials {
    pub cloud_token: String,
    pub operator_public_key: String,
    pub setup_keypair: EphemeralKeypair,
    pub github: Option<GitHubCredentials>,
    pub bitbucket: Option<BitbucketCredentials>,
}

impl Credentials {
    pub fn source_host(&self, host: SourceHost) -> bool {
        match host {
            SourceHost::GitHub => self.github.is_some(),
            SourceHost::Bitbucket => self.bitbucket.is_some(),
        }
    }
}

/// Collect every credential the deployment needs, prompting only for the
/// missing ones, and offer to persist newly entered values.
pub async fn gather_credentials(
    definition: &DeploymentDefinition,
    resolver: &ArtifactResolver,
    interact: &mut dyn Interaction,
) -> Result<Credentials> {
    let mut store = StoredCredentials::load()?;
    let store_before = store.clone();

    let needed_hosts = probe_needed_hosts(definition, resolver, &store).await?;

    if store.digitalocean_token.is_none() {
        let token = interact.password("Enter your DigitalOcean API token")?;
        if token.is_empty() {
            return Err(DeployError::Credential(
                "a DigitalOcean API token is required".to_string(),
            ));
        }
        store.digitalocean_token = Some(token);
    }

    if store.public_key.is_none() {
        let key = interact.input("Enter the public key you will use to log into the droplet")?;
        if key.is_empty() {
            return Err(DeployError::Credential(
                "an operator public key is required".to_string(),
            ));
        }
        store.public_key = Some(key);
    }

    if needed_hosts.contains(&SourceHost::GitHub) && store.github_token.is_none() {
        store.github_username = Some(interact.input("GitHub username")?);
        store.github_token = Some(interact.password("GitHub personal access token")?);
    }

    if needed_hosts.contains(&SourceHost::Bitbucket) && store.bitbucket_app_password.is_none() {
        store.bitbucket_username = Some(interact.input("Bitbucket username")?);
        store.bitbucket_app_password = Some(interact.password("Bitbucket app password")?);
    }

    if store != store_before
        && interact.confirm("Save these credentials for future deployments?")?
    {
        store.save()?;
    }

    let setup_keypair = EphemeralKeypair::generate().await?;
    tracing::debug!("generated ephemeral setup keypair");

    let github = match (&store.github_username, &store.github_token) {
        (Some(username), Some(token)) => Some(GitHubCredentials {
            username: username.clone(),
            token: token.clone(),
        }),
        _ => None,
    };
    let bitbucket = match (&store.bitbucket_username, &store.bitbucket_app_password) {
        (Some(username), Some(app_password)) => Some(BitbucketCredentials {
            username: username.clone(),
            app_password: app_password.clone(),
        }),
        _ => None,
    };

    Ok(Credentials {
        cloud_token: store
            .digitalocean_token
            .clone()
            .expect("token ensured above"),
        operator_public_key: store.public_key.clone().expect("key ensured above"),
        setup_keypair,
        github,
        bitbucket,
    })
}

/// Probe each bundle repository whose host we have no stored credentials
/// for. Probes are independent reads and run concurrently; the results are
/// joined before any prompting starts.
async fn probe_needed_hosts(
    definition: &DeploymentDefinition,
    resolver: &ArtifactResolver,
    store: &StoredCredentials,
) -> Result<HashSet<SourceHost>> {
    let mut candidates: Vec<&rigup_core::Bundle> = Vec::new();
    for bundle in &definition.bundles {
        let already_covered = match bundle.repo.host {
            SourceHost::GitHub => store.github_token.is_some(),
            SourceHost::Bitbucket => store.bitbucket_app_password.is_some(),
        };
        if !already_covered {
            candidates.push(bundle);
        }
    }

    let probes = candidates
        .iter()
        .map(|bundle| resolver.repo_requires_auth(&bundle.repo));
    let results = join_all(probes).await;

    let mut needed = HashSet::new();
    for (bundle, result) in candidates.iter().zip(results) {
        if result? {
            needed.insert(bundle.repo.host);
        }
    }
    Ok(needed)
}
