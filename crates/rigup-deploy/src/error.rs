//! Deployment error taxonomy
//!
//! Definition and credential problems fail fast, before any mutating provider
//! call. Attachment conflicts never surface here directly: they are resolved
//! interactively and only escalate to [`DeployError::Aborted`] when the
//! operator declines every option. Transient SSH failures are retried at the
//! connect site only; everything else propagates and aborts the run.

use crate::cloud_config::CloudConfigError;
use crate::ssh::SshError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeployError {
    #[error(transparent)]
    Definition(#[from] rigup_core::DefinitionError),

    #[error("credential error: {0}")]
    Credential(String),

    #[error(transparent)]
    Config(#[from] rigup_config::ConfigError),

    #[error(transparent)]
    Cloud(#[from] rigup_cloud::CloudError),

    #[error(transparent)]
    CloudConfig(#[from] CloudConfigError),

    #[error(transparent)]
    Ssh(#[from] SshError),

    #[error(
        "volume \"{name}\" is attached to {count} droplets; \
         only a single attachment is supported"
    )]
    UnsupportedAttachment { name: String, count: usize },

    #[error("more than one volume in {region} is named \"{name}\"; set volume.id to disambiguate")]
    AmbiguousVolumeName { name: String, region: String },

    #[error("no floating IPs exist in region {0}")]
    NoFloatingIpInRegion(String),

    #[error("volume.name and volume.size_gigabytes must be set to create a new volume")]
    IncompleteVolumeSpec,

    #[error("no tag of {repo} satisfies \"{range}\"")]
    NoMatchingTag { repo: String, range: String },

    #[error("artifact resolution failed: {0}")]
    Artifact(String),

    #[error("droplet {0} reports no public IPv4 address")]
    NoPublicAddress(u64),

    #[error("could not resolve {domain}: {message}")]
    DnsLookup { domain: String, message: String },

    #[error("remote bring-up failed:\n{detail}")]
    RemoteBringup { detail: String },

    #[error("template error: {0}")]
    Template(#[from] tera::Error),

    #[error("prompt failed: {0}")]
    Prompt(String),

    #[error("failed to save definition changes: {0}")]
    SaveChanges(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The operator declined at a conflict-resolution or confirmation prompt.
    /// Reported as a clean exit, not a failure.
    #[error("deployment aborted")]
    Aborted,
}

pub type Result<T> = std::result::Result<T, DeployError>;
