//! Full cloud-config assembly for a ShowKit droplet
//!
//! Builds the complete first-boot document from the definition, the resolved
//! decisions, and the resolved artifact URLs: the runtime user and keys,
//! nginx (and certificate issuance for secure deployments), the runtime and
//! bundle downloads, configuration files, dependency installation, and the
//! systemd unit that finally starts ShowKit.
//!
//! The runtime tarball download is registered last but inserted at the head
//! of the command list: every bundle directory lives inside the unpacked
//! runtime tree, so the unpack must run before any bundle command.

use crate::artifact::ResolvedArtifacts;
use crate::cloud_config::{
    ArchiveKind, CloudConfig, DownloadAuth, DownloadOpts, WriteFileOpts,
};
use crate::credentials::{BitbucketCredentials, Credentials, GitHubCredentials};
use crate::decisions::Decisions;
use crate::error::Result;
use rigup_core::{DeploymentDefinition, SourceHost};
use tera::{Context, Tera};

/// Account the runtime runs under on the droplet.
pub const DROPLET_USER: &str = "showkit";

const RUNTIME_DIR: &str = "/home/showkit/showkit";
const BUNDLES_DIR: &str = "/home/showkit/showkit/bundles";
const CFG_DIR: &str = "/home/showkit/showkit/cfg";
const NODE_VERSION: &str = "22";

const NGINX_SITE_SECURE: &str = include_str!("../templates/nginx-site-secure.conf.tera");
const NGINX_SITE_INSECURE: &str = include_str!("../templates/nginx-site-insecure.conf.tera");
const INSTALL_DEPS: &str = include_str!("../templates/install-deps.sh.tera");
const LETSENCRYPT_CRON: &str = include_str!("../templates/letsencrypt-cronjob");

/// Key material and download auth needed while assembling the document.
/// Carved out of [`Credentials`] so assembly is testable without generating
/// a real keypair.
pub struct BootAccess<'a> {
    pub operator_public_key: &'a str,
    pub setup_public_key: &'a str,
    pub github: Option<&'a GitHubCredentials>,
    pub bitbucket: Option<&'a BitbucketCredentials>,
}

impl<'a> BootAccess<'a> {
    pub fn from_credentials(credentials: &'a Credentials) -> Self {
        Self {
            operator_public_key: &credentials.operator_public_key,
            setup_public_key: credentials.setup_keypair.public_key(),
            github: credentials.github.as_ref(),
            bitbucket: credentials.bitbucket.as_ref(),
        }
    }
}

pub fn generate_cloud_config(
    definition: &DeploymentDefinition,
    decisions: &Decisions,
    artifacts: &ResolvedArtifacts,
    access: &BootAccess<'_>,
) -> Result<CloudConfig> {
    let mut config = CloudConfig::new();

    config.add_ssh_key(DROPLET_USER, access.operator_public_key)?;
    // Only used during bring-up, then scrubbed from authorized_keys.
    config.add_ssh_key(DROPLET_USER, access.setup_public_key)?;

    let mount_path = decisions
        .chosen_volume
        .as_ref()
        .map(|volume| format!("/mnt/{}", volume.name));

    add_runtime_config(&mut config, definition);
    add_nginx(&mut config, definition)?;
    if definition.secure {
        add_certificates(&mut config, definition, mount_path.as_deref());
    }
    add_bundles(&mut config, definition, artifacts, access);

    // Registered after the bundle commands on purpose; see module docs.
    config.add_download(
        &artifacts.runtime_url,
        DownloadOpts {
            dest: format!("/home/{DROPLET_USER}/showkit.tar.gz"),
            archive: Some(ArchiveKind::Tar),
            strip_components: Some(1),
            extract_to: Some(RUNTIME_DIR.to_string()),
            position: Some(0),
            ..Default::default()
        },
    );
    config.add_command(&format!("mkdir -p {BUNDLES_DIR} {CFG_DIR}"), Some(0));

    if let Some(mount_path) = &mount_path {
        add_volume_relocation(&mut config, mount_path);
    }

    add_dependency_install(&mut config)?;

    config.add_command(
        &format!("chown -R {DROPLET_USER}:{DROPLET_USER} /home/{DROPLET_USER}/"),
        None,
    );
    if let Some(mount_path) = &mount_path {
        config.add_command(
            &format!("chown -R {DROPLET_USER}:{DROPLET_USER} {mount_path}"),
            None,
        );
    }

    add_service_unit(&mut config);
    config.add_command("systemctl restart nginx", None);

    // Global substitution; any {{email}} placeholder left in bundle or
    // runtime configuration is intentional.
    config.replace("{{email}}", &definition.email)?;

    Ok(config)
}

fn add_runtime_config(config: &mut CloudConfig, definition: &DeploymentDefinition) {
    let mut runtime_config = definition.runtime.config.clone();
    runtime_config
        .entry("port")
        .or_insert_with(|| serde_json::json!(definition.runtime.port));

    config.add_json_file(
        &format!("{CFG_DIR}/showkit.json"),
        &serde_json::Value::Object(runtime_config),
        WriteFileOpts::default(),
    );
}

fn add_nginx(config: &mut CloudConfig, definition: &DeploymentDefinition) -> Result<()> {
    config.add_package("nginx");

    let template = if definition.secure {
        NGINX_SITE_SECURE
    } else {
        NGINX_SITE_INSECURE
    };

    let mut context = Context::new();
    context.insert("domain", &definition.domain);
    context.insert("port", &definition.runtime.port);
    let site = Tera::one_off(template, &context, false)?;

    config.add_write_file(
        "/etc/nginx/sites-available/showkit",
        &site,
        WriteFileOpts {
            owner: Some("root:root".to_string()),
            ..Default::default()
        },
    );
    config.add_command(
        "ln -sf /etc/nginx/sites-available/showkit /etc/nginx/sites-enabled/showkit",
        None,
    );
    config.add_command("rm -f /etc/nginx/sites-enabled/default", None);
    Ok(())
}

/// Certificate issuance runs standalone on port 80, so nginx has to be down
/// around it. The live certificate directory moves onto the volume when one
/// is in use, surviving droplet replacement.
fn add_certificates(
    config: &mut CloudConfig,
    definition: &DeploymentDefinition,
    mount_path: Option<&str>,
) {
    if let Some(mount_path) = mount_path {
        config.add_command(&format!("mkdir -p {mount_path}/letsencrypt"), None);
        config.add_command(&format!("ln -sf {mount_path}/letsencrypt /etc/letsencrypt"), None);
    }

    config.add_write_file(
        "/etc/cron.d/letsencrypt_auto_renew",
        LETSENCRYPT_CRON,
        WriteFileOpts {
            owner: Some("root:root".to_string()),
            ..Default::default()
        },
    );
    config.add_package("letsencrypt");

    config.add_command("service nginx stop", None);
    config.add_command(
        &format!(
            "letsencrypt certonly --standalone --non-interactive --agree-tos \
             --email {} -d {}",
            definition.email, definition.domain
        ),
        None,
    );
    config.add_command("service nginx start", None);
}

fn add_bundles(
    config: &mut CloudConfig,
    definition: &DeploymentDefinition,
    artifacts: &ResolvedArtifacts,
    access: &BootAccess<'_>,
) {
    for bundle in &definition.bundles {
        let Some(url) = artifacts.bundle_urls.get(&bundle.name) else {
            // Resolution runs before assembly; a missing entry is a caller bug.
            unreachable!("bundle {} has no resolved URL", bundle.name);
        };

        let bundle_dir = format!("{BUNDLES_DIR}/{}", bundle.name);
        config.add_command(&format!("mkdir -p {bundle_dir}"), None);

        let auth = match bundle.repo.host {
            SourceHost::GitHub => access.github.map(|github| DownloadAuth {
                username: github.username.clone(),
                password: github.token.clone(),
            }),
            SourceHost::Bitbucket => access.bitbucket.map(|bitbucket| DownloadAuth {
                username: bitbucket.username.clone(),
                password: bitbucket.app_password.clone(),
            }),
        };

        config.add_download(
            url,
            DownloadOpts {
                dest: format!("{BUNDLES_DIR}/{}.tar.gz", bundle.name),
                auth,
                archive: Some(ArchiveKind::Tar),
                strip_components: Some(1),
                extract_to: Some(bundle_dir),
                ..Default::default()
            },
        );

        if let Some(bundle_config) = &bundle.config {
            config.add_json_file(
                &format!("{CFG_DIR}/{}.json", bundle.name),
                bundle_config,
                WriteFileOpts::default(),
            );
        }
    }
}

/// Replace the runtime's mutable state directories with symlinks onto the
/// volume so data outlives the droplet.
fn add_volume_relocation(config: &mut CloudConfig, mount_path: &str) {
    config.add_command(
        &format!("mkdir -p {mount_path}/showkit/db {mount_path}/showkit/assets {mount_path}/showkit/logs"),
        None,
    );
    for dir in ["db", "assets", "logs"] {
        config.add_command(&format!("rm -rf {RUNTIME_DIR}/{dir}"), None);
        config.add_command(
            &format!("ln -sf {mount_path}/showkit/{dir} {RUNTIME_DIR}/{dir}"),
            None,
        );
    }
}

fn add_dependency_install(config: &mut CloudConfig) -> Result<()> {
    let mut context = Context::new();
    context.insert("node_version", NODE_VERSION);
    context.insert("runtime_dir", RUNTIME_DIR);
    context.insert("bundles_dir", BUNDLES_DIR);
    let script = Tera::one_off(INSTALL_DEPS, &context, false)?;

    config.add_write_file(
        "/root/install-showkit-dependencies.sh",
        &script,
        WriteFileOpts {
            owner: Some("root:root".to_string()),
            permissions: Some("0744".to_string()),
            ..Default::default()
        },
    );
    config.add_command("/root/install-showkit-dependencies.sh", None);
    Ok(())
}

fn add_service_unit(config: &mut CloudConfig) {
    let unit = format!(
        "[Unit]\n\
         Description=ShowKit broadcast graphics runtime\n\
         After=network.target\n\
         \n\
         [Service]\n\
         User={DROPLET_USER}\n\
         WorkingDirectory={RUNTIME_DIR}\n\
         ExecStart=/usr/bin/node {RUNTIME_DIR}/index.js\n\
         Restart=on-failure\n\
         \n\
         [Install]\n\
         WantedBy=multi-user.target\n"
    );
    config.add_write_file(
        "/etc/systemd/system/showkit.service",
        &unit,
        WriteFileOpts {
            owner: Some("root:root".to_string()),
            ..Default::default()
        },
    );
    config.add_command("systemctl daemon-reload", None);
    config.add_command("systemctl enable --now showkit", None);
}
