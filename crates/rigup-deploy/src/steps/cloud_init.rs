//! Remote bring-up completion wait
//!
//! cloud-init drops a result file when the first-boot script finishes; there
//! is no push notification, so the file is polled for. Three outcomes per
//! poll: the file is absent (keep polling), present and clean (done), or
//! present with recorded errors or unparsable content (terminal failure,
//! reported with whatever detail was captured).

use crate::error::{DeployError, Result};
use crate::poller::{PollError, PollOutcome, Poller};
use crate::ssh::RemoteShell;
use serde::Deserialize;

const RESULT_FILE: &str = "/var/lib/cloud/data/result.json";
const ABSENT_MARKER: &str = "Not found";

#[derive(Debug, Deserialize)]
struct CloudInitResult {
    v1: CloudInitResultV1,
}

#[derive(Debug, Deserialize)]
struct CloudInitResultV1 {
    #[serde(default)]
    errors: Vec<serde_json::Value>,
}

/// Poll for the cloud-init result file using `poller`'s cadence.
pub async fn wait_for_cloud_init(shell: &dyn RemoteShell, poller: &Poller) -> Result<()> {
    let probe = format!("[ -f {RESULT_FILE} ] && cat {RESULT_FILE} || echo \"{ABSENT_MARKER}\"");
    let probe = probe.as_str();

    poller
        .run(|| async move {
            let output = match shell.exec(probe).await {
                Ok(output) => output,
                Err(e) => return PollOutcome::Failed(DeployError::Ssh(e)),
            };

            if output.stdout.trim() == ABSENT_MARKER {
                return PollOutcome::Pending;
            }

            match serde_json::from_str::<CloudInitResult>(&output.stdout) {
                Ok(result) if result.v1.errors.is_empty() => PollOutcome::Ready(()),
                Ok(result) => PollOutcome::Failed(DeployError::RemoteBringup {
                    detail: result
                        .v1
                        .errors
                        .iter()
                        .map(|e| e.to_string())
                        .collect::<Vec<_>>()
                        .join("\n"),
                }),
                Err(_) => PollOutcome::Failed(DeployError::RemoteBringup {
                    detail: format!("unparsable result file:\n{}", output.stdout.trim()),
                }),
            }
        })
        .await
        .map_err(|e| match e {
            PollError::Failed(e) => e,
            PollError::Exhausted(n) => DeployError::RemoteBringup {
                detail: format!("first-boot script still running after {n} checks"),
            },
        })
}
