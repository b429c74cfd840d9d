//! Deployment resolution and provisioning orchestration for rigup
//!
//! The deploy flow runs in three phases over one immutable
//! [`DeploymentDefinition`](rigup_core::DeploymentDefinition):
//!
//! 1. **Resolution** ([`resolve`]) turns the requested region, floating IP,
//!    and volume into concrete, conflict-free choices in a [`Decisions`]
//!    accumulator, prompting the operator through every pre-existing
//!    attachment.
//! 2. **Assembly** ([`generate`], [`cloud_config`]) builds the cloud-config
//!    document the droplet executes on first boot.
//! 3. **Orchestration** ([`orchestrator`], [`steps`]) creates the droplet,
//!    attaches resources, connects over SSH with bounded-by-classification
//!    retry, and polls remote bring-up to completion.

pub mod artifact;
pub mod cloud_config;
pub mod credentials;
pub mod decisions;
pub mod error;
pub mod generate;
pub mod interact;
pub mod orchestrator;
pub mod poller;
pub mod resolve;
pub mod ssh;
pub mod steps;

pub use artifact::{ArtifactResolver, ResolvedArtifacts};
pub use cloud_config::{ArchiveKind, CloudConfig, DownloadAuth, DownloadOpts, WriteFileOpts};
pub use credentials::{gather_credentials, Credentials};
pub use decisions::Decisions;
pub use error::{DeployError, Result};
pub use generate::{generate_cloud_config, BootAccess, DROPLET_USER};
pub use interact::Interaction;
pub use orchestrator::Orchestrator;
pub use poller::{PollError, PollOutcome, Poller};
pub use resolve::resolve_decisions;
pub use ssh::{EphemeralKeypair, ExecOutput, OpenSsh, RemoteShell, SshError};

#[cfg(test)]
pub(crate) mod test_fixtures;
