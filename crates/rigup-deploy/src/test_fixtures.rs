//! Shared unit-test fixtures

use rigup_core::{DeploymentDefinition, DropletSpec, RuntimeSpec, VolumeSpec};

pub(crate) fn minimal_definition() -> DeploymentDefinition {
    DeploymentDefinition {
        domain: "graphics.example.com".to_string(),
        email: "ops@example.com".to_string(),
        secure: false,
        droplet: DropletSpec {
            region: "nyc1".to_string(),
            size: "s-1vcpu-2gb".to_string(),
            image: "ubuntu-24-04-x64".to_string(),
            floating_ip: None,
        },
        volume: VolumeSpec {
            id: None,
            name: Some("data".to_string()),
            size_gigabytes: Some(40),
        },
        runtime: RuntimeSpec {
            version: semver::VersionReq::parse("*").unwrap(),
            version_range: "*".to_string(),
            config: serde_json::Map::new(),
            port: 9090,
        },
        bundles: Vec::new(),
        file_path: std::path::PathBuf::from("deployment.yml"),
    }
}
