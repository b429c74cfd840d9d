//! cloud-config document builder
//!
//! Accumulates user, file-write, package, and command directives and renders
//! them as a single cloud-config document. Command order is execution order
//! on the droplet: `add_command` and `add_download` take an optional index
//! for the cases where a directive must run earlier than its registration
//! order (the runtime tarball has to be unpacked before any bundle directory
//! is created inside it).

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Marker the first-boot agent uses to recognize the payload type.
const CLOUD_CONFIG_HEADER: &str = "#cloud-config";

#[derive(Error, Debug)]
pub enum CloudConfigError {
    #[error("a user named \"{0}\" already exists in this document")]
    DuplicateUser(String),

    #[error("cloud-config serialization failed: {0}")]
    Serialize(#[source] serde_yaml::Error),

    /// A substitution produced text that no longer parses as a cloud-config
    /// document (e.g. a replacement value broke YAML structure).
    #[error("cloud-config reparse after substitution failed: {0}")]
    Reparse(#[source] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, CloudConfigError>;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Document {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    users: Vec<UserDirective>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    write_files: Vec<WriteFileDirective>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    packages: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    runcmd: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct UserDirective {
    name: String,
    #[serde(
        rename = "ssh-authorized-keys",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    ssh_authorized_keys: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WriteFileDirective {
    path: String,
    content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    permissions: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    encoding: Option<String>,
}

/// Metadata for a file-write directive, passed through to the boot agent
/// verbatim.
#[derive(Debug, Clone, Default)]
pub struct WriteFileOpts {
    pub owner: Option<String>,
    pub permissions: Option<String>,
    pub encoding: Option<String>,
}

/// Archive handling mode for [`CloudConfig::add_download`]. Chosen by the
/// caller's configuration, never sniffed from the URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    Tar,
    Zip,
}

#[derive(Debug, Clone)]
pub struct DownloadAuth {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Default)]
pub struct DownloadOpts {
    /// Path the archive is fetched to on the droplet.
    pub dest: String,
    pub auth: Option<DownloadAuth>,
    /// When set, the fetched file is extracted as an archive of this kind.
    pub archive: Option<ArchiveKind>,
    /// Leading path components stripped on extraction (tar mode only).
    pub strip_components: Option<u32>,
    /// Extraction target; defaults to the parent directory of `dest`.
    pub extract_to: Option<String>,
    /// Remove the archive after extraction. Defaults to true.
    pub keep_archive: bool,
    /// Insert the synthesized command at this index instead of appending.
    pub position: Option<usize>,
}

/// Ordered accumulator for one droplet's first-boot configuration.
#[derive(Debug, Clone, Default)]
pub struct CloudConfig {
    doc: Document,
}

impl CloudConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user. Registering the same name twice is an error.
    pub fn add_user(&mut self, name: &str) -> Result<()> {
        if self.doc.users.iter().any(|u| u.name == name) {
            return Err(CloudConfigError::DuplicateUser(name.to_string()));
        }
        self.doc.users.push(UserDirective {
            name: name.to_string(),
            ssh_authorized_keys: Vec::new(),
        });
        Ok(())
    }

    /// Append an authorized key for `user`, creating the user on demand.
    /// Multiple keys per user accumulate.
    pub fn add_ssh_key(&mut self, user: &str, public_key: &str) -> Result<()> {
        if !self.doc.users.iter().any(|u| u.name == user) {
            self.add_user(user)?;
        }
        let entry = self
            .doc
            .users
            .iter_mut()
            .find(|u| u.name == user)
            .expect("user added above");
        entry.ssh_authorized_keys.push(public_key.to_string());
        Ok(())
    }

    /// Write a plain-text file on first boot.
    pub fn add_write_file(&mut self, path: &str, content: &str, opts: WriteFileOpts) {
        self.doc.write_files.push(WriteFileDirective {
            path: path.to_string(),
            content: content.to_string(),
            owner: opts.owner,
            permissions: opts.permissions,
            encoding: opts.encoding,
        });
    }

    /// Write a JSON file on first boot; the value is embedded in its
    /// canonical pretty-printed form.
    pub fn add_json_file(
        &mut self,
        path: &str,
        content: &serde_json::Value,
        opts: WriteFileOpts,
    ) {
        let text = serde_json::to_string_pretty(content).expect("JSON value serializes");
        self.add_write_file(path, &text, opts);
    }

    pub fn add_package(&mut self, package: &str) {
        if !self.doc.packages.iter().any(|p| p == package) {
            self.doc.packages.push(package.to_string());
        }
    }

    /// Append a command, or insert it at `position` when it must run earlier
    /// than its registration order. An index past the end appends.
    pub fn add_command(&mut self, command: &str, position: Option<usize>) {
        match position {
            Some(index) if index < self.doc.runcmd.len() => {
                self.doc.runcmd.insert(index, command.to_string());
            }
            _ => self.doc.runcmd.push(command.to_string()),
        }
    }

    /// Synthesize a single composite download command: authenticated fetch,
    /// optional extraction, optional cleanup of the archive.
    pub fn add_download(&mut self, url: &str, opts: DownloadOpts) {
        let mut command = String::from("curl -fsSL");

        if let Some(auth) = &opts.auth {
            command.push_str(&format!(" -u {}:{}", auth.username, auth.password));
        }

        command.push_str(&format!(" -o {} {}", opts.dest, url));

        if let Some(kind) = opts.archive {
            let target = opts.extract_to.clone().unwrap_or_else(|| {
                std::path::Path::new(&opts.dest)
                    .parent()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| ".".to_string())
            });

            match kind {
                ArchiveKind::Tar => {
                    command.push_str(&format!(" && tar -xf {} --directory={}", opts.dest, target));
                    if let Some(strip) = opts.strip_components.filter(|s| *s > 0) {
                        command.push_str(&format!(" --strip-components {strip}"));
                    }
                }
                ArchiveKind::Zip => {
                    command.push_str(&format!(" && unzip -o {} -d {}", opts.dest, target));
                }
            }

            if !opts.keep_archive {
                command.push_str(&format!(" && rm {}", opts.dest));
            }
        }

        self.add_command(&command, opts.position);
    }

    /// Globally substitute `token` with `value` across the whole document by
    /// serializing, replacing, and re-parsing.
    ///
    /// The substitution is unscoped on purpose: a token occurring inside any
    /// directive's genuine content is replaced too. Callers must choose
    /// tokens that cannot appear in real content by accident.
    pub fn replace(&mut self, token: &str, value: &str) -> Result<()> {
        let serialized =
            serde_yaml::to_string(&self.doc).map_err(CloudConfigError::Serialize)?;
        let replaced = serialized.replace(token, value);
        self.doc = serde_yaml::from_str(&replaced).map_err(CloudConfigError::Reparse)?;
        Ok(())
    }

    /// Number of registered commands; later insertions may use this as an
    /// anchor.
    pub fn command_count(&self) -> usize {
        self.doc.runcmd.len()
    }

    /// Render the document for the first-boot agent. Rendering consumes the
    /// builder; the output text is never mutated afterwards.
    pub fn render(self) -> Result<String> {
        let body = serde_yaml::to_string(&self.doc).map_err(CloudConfigError::Serialize)?;
        Ok(format!("{CLOUD_CONFIG_HEADER}\n{body}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn download_opts(dest: &str) -> DownloadOpts {
        DownloadOpts {
            dest: dest.to_string(),
            archive: Some(ArchiveKind::Tar),
            strip_components: Some(1),
            extract_to: Some("/opt/app".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn duplicate_user_is_an_error() {
        let mut config = CloudConfig::new();
        config.add_user("showkit").unwrap();
        assert!(matches!(
            config.add_user("showkit"),
            Err(CloudConfigError::DuplicateUser(_))
        ));
    }

    #[test]
    fn ssh_keys_accumulate_per_user() {
        let mut config = CloudConfig::new();
        config.add_ssh_key("showkit", "ssh-ed25519 AAAA... operator").unwrap();
        config.add_ssh_key("showkit", "ssh-ed25519 BBBB... rigup-setup").unwrap();

        let rendered = config.render().unwrap();
        assert_eq!(rendered.matches("ssh-ed25519").count(), 2);
        // Still a single user entry.
        assert_eq!(rendered.matches("name: showkit").count(), 1);
    }

    #[test]
    fn render_starts_with_recognition_marker() {
        let mut config = CloudConfig::new();
        config.add_command("echo ready", None);
        let rendered = config.render().unwrap();
        assert!(rendered.starts_with("#cloud-config\n"));
    }

    #[test]
    fn downloads_render_one_composite_command_each_in_order() {
        let mut config = CloudConfig::new();
        config.add_command("mkdir -p /opt/app/bundles", None);
        config.add_download("https://example.com/a.tar.gz", download_opts("/tmp/a.tar.gz"));
        config.add_download("https://example.com/b.tar.gz", download_opts("/tmp/b.tar.gz"));
        // Registered last, must run first.
        config.add_download(
            "https://example.com/runtime.tar.gz",
            DownloadOpts {
                position: Some(0),
                ..download_opts("/tmp/runtime.tar.gz")
            },
        );

        let rendered = config.render().unwrap();
        assert_eq!(rendered.matches("curl -fsSL").count(), 3);

        let runtime = rendered.find("runtime.tar.gz").unwrap();
        let a = rendered.find("a.tar.gz").unwrap();
        let b = rendered.find("b.tar.gz").unwrap();
        assert!(runtime < a && a < b);
    }

    #[test]
    fn download_composite_includes_extract_and_cleanup() {
        let mut config = CloudConfig::new();
        config.add_download(
            "https://example.com/a.tar.gz",
            DownloadOpts {
                auth: Some(DownloadAuth {
                    username: "user".into(),
                    password: "secret".into(),
                }),
                ..download_opts("/tmp/a.tar.gz")
            },
        );

        let rendered = config.render().unwrap();
        assert!(rendered.contains("-u user:secret"));
        assert!(rendered.contains("tar -xf /tmp/a.tar.gz --directory=/opt/app --strip-components 1"));
        assert!(rendered.contains("&& rm /tmp/a.tar.gz"));
    }

    #[test]
    fn zip_mode_uses_unzip() {
        let mut config = CloudConfig::new();
        config.add_download(
            "https://example.com/a.zip",
            DownloadOpts {
                dest: "/tmp/a.zip".into(),
                archive: Some(ArchiveKind::Zip),
                extract_to: Some("/opt/app".into()),
                ..Default::default()
            },
        );
        let rendered = config.render().unwrap();
        assert!(rendered.contains("unzip -o /tmp/a.zip -d /opt/app"));
    }

    // The substitution contract is global and unscoped: a token that also
    // appears inside genuine file content is replaced there too. This is
    // documented behavior, not a bug to scope away silently.
    #[test]
    fn replace_substitutes_every_occurrence_including_file_content() {
        let mut config = CloudConfig::new();
        config.add_write_file(
            "/etc/nginx/sites-available/showkit",
            "proxy_pass http://127.0.0.1:{{port}};",
            WriteFileOpts::default(),
        );
        config.add_write_file(
            "/opt/app/notes.txt",
            "the literal token {{port}} appears in prose here",
            WriteFileOpts::default(),
        );

        config.replace("{{port}}", "9090").unwrap();
        let rendered = config.render().unwrap();

        assert!(rendered.contains("proxy_pass http://127.0.0.1:9090;"));
        assert!(rendered.contains("the literal token 9090 appears in prose here"));
        assert!(!rendered.contains("{{port}}"));
    }

    #[test]
    fn insert_past_end_appends() {
        let mut config = CloudConfig::new();
        config.add_command("first", None);
        config.add_command("second", Some(10));
        let rendered = config.render().unwrap();
        let first = rendered.find("- first").unwrap();
        let second = rendered.find("- second").unwrap();
        assert!(first < second);
    }
}
