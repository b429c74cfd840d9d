//! Deployment definition parsing, defaulting, and validation
//!
//! The raw document is accepted as YAML (`.yml`/`.yaml`) or JSON (`.json`),
//! selected by file extension. Static defaults (droplet size, image, region,
//! runtime port) come from serde; the handful of dynamic defaults (the
//! runtime's `baseURL`, a generated session secret) are applied afterwards.
//! Validation failures are fatal and happen before any remote call is made.

use crate::error::{DefinitionError, Result};
use crate::model::{
    Bundle, DeploymentDefinition, DropletSpec, HostedRepo, RuntimeSpec, VolumeSpec, defaults,
};
use rand::Rng;
use rand::distributions::Alphanumeric;
use semver::VersionReq;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawDefinition {
    #[serde(default)]
    domain: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    secure: bool,
    #[serde(default)]
    droplet: DropletSpec,
    #[serde(default)]
    volume: VolumeSpec,
    #[serde(default)]
    runtime: RawRuntime,
    #[serde(default)]
    bundles: BTreeMap<String, RawBundle>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawRuntime {
    #[serde(default = "defaults::runtime_version")]
    version: String,
    #[serde(default)]
    config: Option<serde_json::Value>,
    #[serde(default = "defaults::port")]
    port: u16,
}

impl Default for RawRuntime {
    fn default() -> Self {
        Self {
            version: defaults::runtime_version(),
            config: None,
            port: defaults::port(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawBundle {
    url: String,
    #[serde(default = "defaults::runtime_version")]
    version_range: String,
    #[serde(default)]
    config: Option<serde_json::Value>,
}

/// Load and validate a deployment definition from `path`.
pub fn parse_definition_file(path: &Path) -> Result<DeploymentDefinition> {
    let text = std::fs::read_to_string(path).map_err(|e| DefinitionError::Read {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();

    let raw: RawDefinition = match ext {
        "yml" | "yaml" => {
            serde_yaml::from_str(&text).map_err(|e| DefinitionError::InvalidYaml {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?
        }
        "json" => serde_json::from_str(&text).map_err(|e| DefinitionError::InvalidJson {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?,
        other => return Err(DefinitionError::UnsupportedExtension(other.to_string())),
    };

    build_definition(raw, path)
}

fn build_definition(raw: RawDefinition, path: &Path) -> Result<DeploymentDefinition> {
    if raw.secure {
        if raw.domain.is_empty() {
            return Err(DefinitionError::MissingSecureField("domain"));
        }
        if raw.email.is_empty() {
            return Err(DefinitionError::MissingSecureField("email"));
        }
    }

    let runtime = build_runtime(&raw)?;

    let mut bundles = Vec::with_capacity(raw.bundles.len());
    for (name, bundle) in raw.bundles {
        let repo = HostedRepo::parse(&name, &bundle.url)?;
        let version_range = VersionReq::parse(&bundle.version_range).map_err(|e| {
            DefinitionError::InvalidVersionRange {
                name: name.clone(),
                range: bundle.version_range.clone(),
                message: e.to_string(),
            }
        })?;
        bundles.push(Bundle {
            name,
            url: bundle.url,
            repo,
            version_range,
            raw_range: bundle.version_range,
            config: bundle.config,
        });
    }

    Ok(DeploymentDefinition {
        domain: raw.domain,
        email: raw.email,
        secure: raw.secure,
        droplet: raw.droplet,
        volume: raw.volume,
        runtime,
        bundles,
        file_path: path.to_path_buf(),
    })
}

fn build_runtime(raw: &RawDefinition) -> Result<RuntimeSpec> {
    let version = VersionReq::parse(&raw.runtime.version).map_err(|e| {
        DefinitionError::InvalidRuntimeVersion {
            range: raw.runtime.version.clone(),
            message: e.to_string(),
        }
    })?;

    let mut config = match &raw.runtime.config {
        None => serde_json::Map::new(),
        Some(serde_json::Value::Object(map)) => map.clone(),
        Some(_) => return Err(DefinitionError::RuntimeConfigNotObject),
    };

    if !raw.domain.is_empty() {
        config
            .entry("baseURL")
            .or_insert_with(|| serde_json::Value::String(raw.domain.clone()));
    }

    let login = config
        .entry("login")
        .or_insert_with(|| serde_json::Value::Object(Default::default()));
    if let serde_json::Value::Object(login) = login {
        login
            .entry("sessionSecret")
            .or_insert_with(|| serde_json::Value::String(session_secret()));
        if raw.secure {
            login
                .entry("forceHttpsReturn")
                .or_insert(serde_json::Value::Bool(true));
        }
    }

    Ok(RuntimeSpec {
        version,
        version_range: raw.runtime.version.clone(),
        config,
        port: raw.runtime.port,
    })
}

fn session_secret() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(48)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_definition(ext: &str, content: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(format!("deployment.{ext}"));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        (dir, path)
    }

    const MINIMAL_YAML: &str = r#"
domain: graphics.example.com
email: ops@example.com
secure: true
droplet:
  region: sfo3
volume:
  name: showkit-data
  size_gigabytes: 40
runtime:
  version: "^2.0.0"
  port: 9090
bundles:
  lineup:
    url: https://github.com/acme/lineup-bundle
    version_range: "^1.2.0"
"#;

    #[test]
    fn parses_yaml_with_defaults() {
        let (_dir, path) = write_definition("yml", MINIMAL_YAML);
        let def = parse_definition_file(&path).unwrap();

        assert_eq!(def.droplet.region, "sfo3");
        // Static defaults fill whatever the file omits.
        assert_eq!(def.droplet.size, "s-1vcpu-2gb");
        assert_eq!(def.droplet.image, "ubuntu-24-04-x64");
        assert_eq!(def.bundles.len(), 1);
        assert_eq!(def.bundles[0].name, "lineup");
        assert_eq!(def.bundles[0].repo.slug(), "acme/lineup-bundle");
    }

    #[test]
    fn runtime_config_gains_dynamic_defaults() {
        let (_dir, path) = write_definition("yml", MINIMAL_YAML);
        let def = parse_definition_file(&path).unwrap();

        assert_eq!(
            def.runtime.config.get("baseURL").and_then(|v| v.as_str()),
            Some("graphics.example.com")
        );
        let login = def.runtime.config.get("login").unwrap().as_object().unwrap();
        assert_eq!(login.get("sessionSecret").unwrap().as_str().unwrap().len(), 48);
        assert_eq!(login.get("forceHttpsReturn"), Some(&serde_json::json!(true)));
    }

    #[test]
    fn secure_requires_domain_and_email() {
        let (_dir, path) = write_definition("yml", "secure: true\nemail: a@b.c\n");
        let err = parse_definition_file(&path).unwrap_err();
        assert!(matches!(err, DefinitionError::MissingSecureField("domain")));
    }

    #[test]
    fn rejects_unknown_extension() {
        let (_dir, path) = write_definition("toml", "domain = \"x\"");
        let err = parse_definition_file(&path).unwrap_err();
        assert!(matches!(err, DefinitionError::UnsupportedExtension(_)));
    }

    #[test]
    fn rejects_bad_version_range() {
        let yaml = r#"
bundles:
  broken:
    url: https://github.com/acme/broken
    version_range: "not-a-range"
"#;
        let (_dir, path) = write_definition("yml", yaml);
        let err = parse_definition_file(&path).unwrap_err();
        assert!(matches!(err, DefinitionError::InvalidVersionRange { .. }));
    }

    #[test]
    fn parses_json_definition() {
        let json = r#"{
  "domain": "graphics.example.com",
  "droplet": { "region": "nyc3" },
  "runtime": { "version": "*", "port": 9091 }
}"#;
        let (_dir, path) = write_definition("json", json);
        let def = parse_definition_file(&path).unwrap();
        assert_eq!(def.droplet.region, "nyc3");
        assert_eq!(def.runtime.port, 9091);
        assert!(!def.secure);
    }
}
