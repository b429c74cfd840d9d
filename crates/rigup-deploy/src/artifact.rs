//! Bundle and runtime artifact resolution
//!
//! Each bundle names a repository and a semver range; resolution lists the
//! repository's tags, picks the highest tag satisfying the range, and builds
//! the tarball download URL. The ShowKit runtime itself resolves through the
//! releases of its upstream repository.

use crate::credentials::Credentials;
use crate::error::{DeployError, Result};
use rigup_core::{Bundle, HostedRepo, SourceHost};
use semver::{Version, VersionReq};
use serde::Deserialize;
use std::collections::HashMap;

const GITHUB_API: &str = "https://api.github.com";
const BITBUCKET_API: &str = "https://api.bitbucket.org/2.0";

/// Upstream repository the runtime is released from.
const RUNTIME_REPO: &str = "showkit/showkit";

/// Download URLs resolved for one deployment.
#[derive(Debug, Clone)]
pub struct ResolvedArtifacts {
    pub runtime_url: String,
    /// Bundle name -> tarball URL.
    pub bundle_urls: HashMap<String, String>,
}

pub struct ArtifactResolver {
    client: reqwest::Client,
}

impl Default for ArtifactResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ArtifactResolver {
    pub fn new() -> Self {
        Self {
            // GitHub rejects requests without a User-Agent.
            client: reqwest::Client::builder()
                .user_agent(concat!("rigup/", env!("CARGO_PKG_VERSION")))
                .build()
                .expect("client construction cannot fail"),
        }
    }

    /// Read-only probe: does fetching this repository anonymously fail in a
    /// way that suggests credentials are required? GitHub reports missing
    /// permission as 404 rather than admitting the repository exists, so a
    /// 404 is treated as "credentials needed" and a bad URL surfaces later
    /// during tag resolution.
    pub async fn repo_requires_auth(&self, repo: &HostedRepo) -> Result<bool> {
        let url = match repo.host {
            SourceHost::GitHub => format!("{GITHUB_API}/repos/{}", repo.slug()),
            SourceHost::Bitbucket => format!("{BITBUCKET_API}/repositories/{}", repo.slug()),
        };

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| DeployError::Artifact(e.to_string()))?;

        let needs_auth = match repo.host {
            SourceHost::GitHub => response.status().as_u16() == 404,
            SourceHost::Bitbucket => response.status().as_u16() == 403,
        };
        tracing::debug!(repo = %repo.slug(), needs_auth, "permission probe");
        Ok(needs_auth)
    }

    /// Resolve the runtime and every bundle to concrete download URLs.
    pub async fn gather_download_urls(
        &self,
        definition: &rigup_core::DeploymentDefinition,
        credentials: &Credentials,
    ) -> Result<ResolvedArtifacts> {
        let runtime_url = self
            .resolve_runtime_url(&definition.runtime.version, &definition.runtime.version_range)
            .await?;

        let mut bundle_urls = HashMap::with_capacity(definition.bundles.len());
        for bundle in &definition.bundles {
            let url = self.resolve_bundle_url(bundle, credentials).await?;
            tracing::debug!(bundle = %bundle.name, url, "resolved bundle artifact");
            bundle_urls.insert(bundle.name.clone(), url);
        }

        Ok(ResolvedArtifacts {
            runtime_url,
            bundle_urls,
        })
    }

    /// Resolve one bundle's version range to a tarball URL.
    pub async fn resolve_bundle_url(
        &self,
        bundle: &Bundle,
        credentials: &Credentials,
    ) -> Result<String> {
        match bundle.repo.host {
            SourceHost::GitHub => {
                self.resolve_github_tag(&bundle.repo, &bundle.version_range, &bundle.raw_range, credentials)
                    .await
            }
            SourceHost::Bitbucket => {
                self.resolve_bitbucket_tag(&bundle.repo, &bundle.version_range, &bundle.raw_range, credentials)
                    .await
            }
        }
    }

    /// Resolve the runtime release matching `range` to its tarball URL.
    pub async fn resolve_runtime_url(&self, range: &VersionReq, raw_range: &str) -> Result<String> {
        let url = format!("{GITHUB_API}/repos/{RUNTIME_REPO}/releases?per_page=100");
        let releases: Vec<GitHubRelease> = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| DeployError::Artifact(e.to_string()))?
            .error_for_status()
            .map_err(|e| DeployError::Artifact(e.to_string()))?
            .json()
            .await
            .map_err(|e| DeployError::Artifact(e.to_string()))?;

        let best = best_tag(releases.iter().map(|r| r.tag_name.as_str()), range).ok_or_else(
            || DeployError::NoMatchingTag {
                repo: RUNTIME_REPO.to_string(),
                range: raw_range.to_string(),
            },
        )?;

        let release = releases
            .iter()
            .find(|r| r.tag_name == best)
            .expect("best tag came from this list");
        Ok(release.tarball_url.clone())
    }

    async fn resolve_github_tag(
        &self,
        repo: &HostedRepo,
        range: &VersionReq,
        raw_range: &str,
        credentials: &Credentials,
    ) -> Result<String> {
        let url = format!("{GITHUB_API}/repos/{}/tags?per_page=100", repo.slug());
        let mut request = self.client.get(&url);
        if let Some(github) = &credentials.github {
            request = request.bearer_auth(&github.token);
        }

        let tags: Vec<GitHubTag> = request
            .send()
            .await
            .map_err(|e| DeployError::Artifact(e.to_string()))?
            .error_for_status()
            .map_err(|e| DeployError::Artifact(e.to_string()))?
            .json()
            .await
            .map_err(|e| DeployError::Artifact(e.to_string()))?;

        let best =
            best_tag(tags.iter().map(|t| t.name.as_str()), range).ok_or_else(|| {
                DeployError::NoMatchingTag {
                    repo: repo.slug(),
                    range: raw_range.to_string(),
                }
            })?;

        let tag = tags
            .iter()
            .find(|t| t.name == best)
            .expect("best tag came from this list");
        Ok(tag.tarball_url.clone())
    }

    async fn resolve_bitbucket_tag(
        &self,
        repo: &HostedRepo,
        range: &VersionReq,
        raw_range: &str,
        credentials: &Credentials,
    ) -> Result<String> {
        let url = format!(
            "{BITBUCKET_API}/repositories/{}/refs/tags?pagelen=100",
            repo.slug()
        );
        let mut request = self.client.get(&url);
        if let Some(bitbucket) = &credentials.bitbucket {
            request = request.basic_auth(&bitbucket.username, Some(&bitbucket.app_password));
        }

        let page: BitbucketTagPage = request
            .send()
            .await
            .map_err(|e| DeployError::Artifact(e.to_string()))?
            .error_for_status()
            .map_err(|e| DeployError::Artifact(e.to_string()))?
            .json()
            .await
            .map_err(|e| DeployError::Artifact(e.to_string()))?;

        let best = best_tag(page.values.iter().map(|t| t.name.as_str()), range).ok_or_else(
            || DeployError::NoMatchingTag {
                repo: repo.slug(),
                range: raw_range.to_string(),
            },
        )?;

        Ok(format!(
            "https://bitbucket.org/{}/get/{best}.tar.gz",
            repo.slug()
        ))
    }
}

#[derive(Debug, Deserialize)]
struct GitHubTag {
    name: String,
    tarball_url: String,
}

#[derive(Debug, Deserialize)]
struct GitHubRelease {
    tag_name: String,
    tarball_url: String,
}

#[derive(Debug, Deserialize)]
struct BitbucketTagPage {
    #[serde(default)]
    values: Vec<BitbucketTag>,
}

#[derive(Debug, Deserialize)]
struct BitbucketTag {
    name: String,
}

/// Highest tag satisfying `range`. Tags that do not parse as semver (with or
/// without a leading `v`) are skipped rather than treated as errors.
fn best_tag<'a>(tags: impl Iterator<Item = &'a str>, range: &VersionReq) -> Option<&'a str> {
    tags.filter_map(|tag| {
        let version = Version::parse(tag.trim_start_matches('v')).ok()?;
        range.matches(&version).then_some((version, tag))
    })
    .max_by(|(a, _), (b, _)| a.cmp(b))
    .map(|(_, tag)| tag)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn best_tag_picks_highest_satisfying() {
        let range = VersionReq::parse("^1.2.0").unwrap();
        let tags = ["v1.1.0", "v1.2.3", "v1.9.1", "v2.0.0"];
        assert_eq!(best_tag(tags.iter().copied(), &range), Some("v1.9.1"));
    }

    #[test]
    fn best_tag_skips_non_semver_tags() {
        let range = VersionReq::parse("*").unwrap();
        let tags = ["nightly", "release-candidate", "v0.3.0"];
        assert_eq!(best_tag(tags.iter().copied(), &range), Some("v0.3.0"));
    }

    #[test]
    fn best_tag_none_when_nothing_matches() {
        let range = VersionReq::parse("^3.0.0").unwrap();
        let tags = ["v1.0.0", "v2.4.0"];
        assert_eq!(best_tag(tags.iter().copied(), &range), None);
    }
}
