//! Post-boot SSH connect loop
//!
//! sshd comes up some time after the droplet reports active, so refused and
//! timed-out connections are expected for a while and retried at a fixed
//! interval. Any other failure (wrong key, host rejecting the user) will not
//! fix itself and aborts immediately.
//!
//! TODO: bound this loop; a droplet whose sshd never starts keeps it
//! retrying forever.

use crate::error::{DeployError, Result};
use crate::poller::{PollError, PollOutcome, Poller};
use crate::ssh::SshError;
use std::future::Future;

pub async fn connect_with_retry<S, F, Fut>(poller: &Poller, mut connect: F) -> Result<S>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<S, SshError>>,
{
    poller
        .run(|| {
            let attempt = connect();
            async move {
                match attempt.await {
                    Ok(shell) => PollOutcome::Ready(shell),
                    Err(error) if error.is_transient() => {
                        tracing::debug!(%error, "ssh not reachable yet, retrying");
                        PollOutcome::Pending
                    }
                    Err(error) => PollOutcome::Failed(error),
                }
            }
        })
        .await
        .map_err(|error| match error {
            PollError::Failed(ssh_error) => DeployError::Ssh(ssh_error),
            PollError::Exhausted(attempts) => DeployError::Ssh(SshError::Connection(format!(
                "host not reachable after {attempts} attempts"
            ))),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn retries_through_refused_connections() {
        let poller = Poller::new(Duration::ZERO);
        let mut attempts = 0;
        let shell = connect_with_retry(&poller, || {
            attempts += 1;
            let outcome: std::result::Result<&str, SshError> = if attempts < 4 {
                Err(SshError::ConnectionRefused)
            } else {
                Ok("connected")
            };
            async move { outcome }
        })
        .await
        .unwrap();

        assert_eq!(shell, "connected");
        assert_eq!(attempts, 4);
    }

    #[tokio::test]
    async fn auth_failure_aborts_without_retry() {
        let poller = Poller::new(Duration::ZERO);
        let mut attempts = 0;
        let result: Result<&str> = connect_with_retry(&poller, || {
            attempts += 1;
            async {
                Err(SshError::Connection(
                    "Permission denied (publickey)".to_string(),
                ))
            }
        })
        .await;

        assert!(matches!(result, Err(DeployError::Ssh(SshError::Connection(_)))));
        assert_eq!(attempts, 1);
    }
}
