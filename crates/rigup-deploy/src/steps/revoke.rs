//! Setup-access revocation
//!
//! The ephemeral setup key is identified in `authorized_keys` by its comment
//! fragment and deleted. Failure here is terminal and reported; resources
//! created earlier in the run are left as they are.

use crate::error::{DeployError, Result};
use crate::generate::DROPLET_USER;
use crate::ssh::{RemoteShell, SETUP_KEY_COMMENT};

pub async fn revoke_setup_key(shell: &dyn RemoteShell) -> Result<()> {
    let authorized_keys = format!("/home/{DROPLET_USER}/.ssh/authorized_keys");
    let output = shell
        .exec(&format!(
            "sudo sed -i '/{SETUP_KEY_COMMENT}/d' {authorized_keys}"
        ))
        .await?;

    if !output.success() {
        return Err(DeployError::RemoteBringup {
            detail: format!(
                "failed to remove the setup key from {authorized_keys}: {}",
                output.stderr.trim()
            ),
        });
    }

    tracing::info!("revoked setup key");
    Ok(())
}
