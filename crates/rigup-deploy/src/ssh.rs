//! Remote shell over the system `ssh` binary
//!
//! Command execution on the droplet goes through the [`RemoteShell`] trait so
//! bring-up logic can be exercised against a scripted shell. The real
//! implementation shells out to `ssh` in batch mode with the ephemeral setup
//! key.
//!
//! Error classification matters at exactly one call site: the post-boot
//! connect loop retries transient failures (connection refused, timeouts,
//! stalled handshake) and treats everything else, authentication failures
//! included, as terminal.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use thiserror::Error;
use tokio::process::Command;

#[derive(Error, Debug)]
pub enum SshError {
    #[error("connection refused")]
    ConnectionRefused,

    #[error("connection timed out")]
    Timeout,

    #[error("timed out during handshake")]
    HandshakeTimeout,

    #[error("ssh failed: {0}")]
    Connection(String),

    #[error("ssh io error: {0}")]
    Io(#[from] std::io::Error),
}

impl SshError {
    /// Transient failures are retried by the connect loop; everything else
    /// aborts the deployment.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            SshError::ConnectionRefused | SshError::Timeout | SshError::HandshakeTimeout
        )
    }
}

#[derive(Debug, Clone)]
pub struct ExecOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
}

impl ExecOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Command execution on the remote machine.
#[async_trait]
pub trait RemoteShell: Send + Sync {
    /// Run `command` remotely. The remote command's own exit status comes
    /// back in [`ExecOutput`]; only transport-level failures are errors.
    async fn exec(&self, command: &str) -> Result<ExecOutput, SshError>;
}

/// `ssh` binary wrapper bound to one host, user, and identity file.
pub struct OpenSsh {
    host: String,
    user: String,
    key_path: PathBuf,
}

/// ssh reserves exit status 255 for its own failures; anything else is the
/// remote command's status.
const SSH_TRANSPORT_FAILURE: i32 = 255;

impl OpenSsh {
    /// Establish that the host accepts this identity by running a no-op
    /// command. Classified errors let the caller decide whether to retry.
    pub async fn connect(
        host: impl Into<String>,
        user: impl Into<String>,
        key_path: impl Into<PathBuf>,
    ) -> Result<Self, SshError> {
        let shell = Self {
            host: host.into(),
            user: user.into(),
            key_path: key_path.into(),
        };
        shell.exec("true").await?;
        tracing::debug!(host = %shell.host, "ssh connection established");
        Ok(shell)
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    fn command(&self, remote_command: &str) -> Command {
        let mut cmd = Command::new("ssh");
        cmd.arg("-i")
            .arg(&self.key_path)
            .arg("-o")
            .arg("BatchMode=yes")
            .arg("-o")
            .arg("StrictHostKeyChecking=accept-new")
            .arg("-o")
            .arg("ConnectTimeout=10")
            .arg(format!("{}@{}", self.user, self.host))
            .arg(remote_command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd
    }

    fn classify_transport_failure(stderr: &str) -> SshError {
        let lowercase = stderr.to_lowercase();
        if lowercase.contains("connection refused") {
            SshError::ConnectionRefused
        } else if lowercase.contains("banner exchange") {
            SshError::HandshakeTimeout
        } else if lowercase.contains("timed out") {
            SshError::Timeout
        } else {
            SshError::Connection(stderr.trim().to_string())
        }
    }
}

#[async_trait]
impl RemoteShell for OpenSsh {
    async fn exec(&self, command: &str) -> Result<ExecOutput, SshError> {
        tracing::debug!(host = %self.host, command, "ssh exec");
        let output = self.command(command).output().await?;
        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        let exit_code = output.status.code();

        if exit_code == Some(SSH_TRANSPORT_FAILURE) {
            return Err(Self::classify_transport_failure(&stderr));
        }

        Ok(ExecOutput {
            stdout,
            stderr,
            exit_code,
        })
    }
}

/// Generate an ephemeral ed25519 keypair for the setup connection by
/// shelling out to `ssh-keygen`. The key comment carries the fragment the
/// revoke step later matches on when scrubbing `authorized_keys`.
pub struct EphemeralKeypair {
    /// Tempdir owning both key files; removal on drop disposes of the key.
    _dir: tempfile::TempDir,
    private_key_path: PathBuf,
    public_key: String,
}

/// Distinguishing fragment embedded in the setup key comment.
pub const SETUP_KEY_COMMENT: &str = "rigup-setup";

impl EphemeralKeypair {
    pub async fn generate() -> Result<Self, SshError> {
        let dir = tempfile::tempdir()?;
        let private_key_path = dir.path().join("setup_key");

        let output = Command::new("ssh-keygen")
            .arg("-t")
            .arg("ed25519")
            .arg("-N")
            .arg("")
            .arg("-C")
            .arg(SETUP_KEY_COMMENT)
            .arg("-f")
            .arg(&private_key_path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            return Err(SshError::Connection(format!(
                "ssh-keygen failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let public_key =
            tokio::fs::read_to_string(private_key_path.with_extension("pub")).await?;

        Ok(Self {
            _dir: dir,
            private_key_path,
            public_key: public_key.trim().to_string(),
        })
    }

    pub fn private_key_path(&self) -> &Path {
        &self.private_key_path
    }

    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    /// MD5 fingerprint of the public key in the colon-separated form the
    /// provider expects in machine-creation requests.
    pub async fn fingerprint(&self) -> Result<String, SshError> {
        fingerprint_key_file(&self.private_key_path.with_extension("pub")).await
    }
}

/// `ssh-keygen -l -E md5` prints `2048 MD5:aa:bb:... comment (TYPE)`;
/// extract the colon-separated digest.
pub async fn fingerprint_key_file(path: &Path) -> Result<String, SshError> {
    let output = Command::new("ssh-keygen")
        .arg("-l")
        .arg("-E")
        .arg("md5")
        .arg("-f")
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        return Err(SshError::Connection(format!(
            "ssh-keygen -l failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    stdout
        .split_whitespace()
        .find_map(|field| field.strip_prefix("MD5:"))
        .map(|digest| digest.to_string())
        .ok_or_else(|| {
            SshError::Connection(format!("unexpected ssh-keygen output: {}", stdout.trim()))
        })
}
