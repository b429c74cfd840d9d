//! Parsed deployment definition types

use crate::error::{DefinitionError, Result};
use semver::VersionReq;
use serde::{Deserialize, Serialize};
use url::Url;

/// A fully parsed, defaulted, and validated deployment definition.
///
/// Bundles are normalized from the raw `name -> spec` map into a vector that
/// carries each bundle's name and parsed repository reference.
#[derive(Debug, Clone)]
pub struct DeploymentDefinition {
    pub domain: String,
    pub email: String,
    pub secure: bool,
    pub droplet: DropletSpec,
    pub volume: VolumeSpec,
    pub runtime: RuntimeSpec,
    pub bundles: Vec<Bundle>,
    /// Path the definition was loaded from; used when offering to save
    /// resolved values back.
    pub file_path: std::path::PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DropletSpec {
    #[serde(default = "defaults::region")]
    pub region: String,
    #[serde(default = "defaults::size")]
    pub size: String,
    #[serde(default = "defaults::image")]
    pub image: String,
    #[serde(default)]
    pub floating_ip: Option<String>,
}

impl Default for DropletSpec {
    fn default() -> Self {
        Self {
            region: defaults::region(),
            size: defaults::size(),
            image: defaults::image(),
            floating_ip: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VolumeSpec {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub size_gigabytes: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct RuntimeSpec {
    /// Semver range selecting the ShowKit release to install.
    pub version: VersionReq,
    /// Raw range string as written in the definition, kept for display.
    pub version_range: String,
    /// Runtime configuration written to `cfg/showkit.json` on the droplet.
    pub config: serde_json::Map<String, serde_json::Value>,
    pub port: u16,
}

/// Hosting provider of a bundle repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceHost {
    GitHub,
    Bitbucket,
}

impl std::fmt::Display for SourceHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceHost::GitHub => write!(f, "github"),
            SourceHost::Bitbucket => write!(f, "bitbucket"),
        }
    }
}

/// An `owner/name` repository reference on a supported source host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostedRepo {
    pub host: SourceHost,
    pub owner: String,
    pub name: String,
}

impl HostedRepo {
    /// Parse a repository URL like `https://github.com/owner/repo` or
    /// `https://bitbucket.org/owner/repo.git`.
    pub fn parse(bundle_name: &str, raw: &str) -> Result<Self> {
        let unsupported = || DefinitionError::UnsupportedHost {
            name: bundle_name.to_string(),
            url: raw.to_string(),
        };

        let url = Url::parse(raw).map_err(|_| unsupported())?;
        let host = match url.host_str() {
            Some("github.com") | Some("www.github.com") => SourceHost::GitHub,
            Some("bitbucket.org") | Some("www.bitbucket.org") => SourceHost::Bitbucket,
            _ => return Err(unsupported()),
        };

        let mut segments = url.path_segments().ok_or_else(unsupported)?;
        let owner = segments.next().filter(|s| !s.is_empty()).ok_or_else(unsupported)?;
        let name = segments
            .next()
            .filter(|s| !s.is_empty())
            .map(|s| s.trim_end_matches(".git"))
            .ok_or_else(unsupported)?;

        Ok(Self {
            host,
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }

    /// `owner/name`, the form the source-host APIs address repositories by.
    pub fn slug(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

/// A versioned plugin bundle installed alongside the runtime.
#[derive(Debug, Clone)]
pub struct Bundle {
    pub name: String,
    pub url: String,
    pub repo: HostedRepo,
    pub version_range: VersionReq,
    /// Raw range string as written in the definition.
    pub raw_range: String,
    /// Optional bundle configuration written to `cfg/<name>.json`.
    pub config: Option<serde_json::Value>,
}

pub(crate) mod defaults {
    pub fn region() -> String {
        "nyc1".to_string()
    }

    pub fn size() -> String {
        "s-1vcpu-2gb".to_string()
    }

    pub fn image() -> String {
        "ubuntu-24-04-x64".to_string()
    }

    pub fn port() -> u16 {
        9090
    }

    pub fn runtime_version() -> String {
        "*".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_github_repo() {
        let repo = HostedRepo::parse("lineup", "https://github.com/acme/lineup-bundle").unwrap();
        assert_eq!(repo.host, SourceHost::GitHub);
        assert_eq!(repo.slug(), "acme/lineup-bundle");
    }

    #[test]
    fn parses_bitbucket_repo_with_git_suffix() {
        let repo = HostedRepo::parse("overlay", "https://bitbucket.org/acme/overlay.git").unwrap();
        assert_eq!(repo.host, SourceHost::Bitbucket);
        assert_eq!(repo.name, "overlay");
    }

    #[test]
    fn rejects_unknown_host() {
        let err = HostedRepo::parse("x", "https://gitlab.com/acme/x").unwrap_err();
        assert!(matches!(err, DefinitionError::UnsupportedHost { .. }));
    }
}
