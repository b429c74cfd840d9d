//! Volume mount over the remote shell
//!
//! The device is probed before any formatting: `file -sL` reports a bare
//! `data` for an unformatted device and a filesystem description otherwise.
//! A device that already carries a filesystem is never reformatted. The
//! fstab persistence entry is appended only when missing, so re-running a
//! deployment against an already-mounted volume cannot duplicate it.

use crate::error::{DeployError, Result};
use crate::ssh::RemoteShell;
use rigup_cloud::Volume;

const MOUNT_OPTIONS: &str = "discard,defaults";
const FSTAB_OPTIONS: &str = "defaults,nofail,discard";

pub async fn mount_volume(shell: &dyn RemoteShell, volume: &Volume) -> Result<()> {
    let mount_path = format!("/mnt/{}", volume.name);
    let device_path = format!("/dev/disk/by-uuid/{}", volume.id);

    shell.exec(&format!("sudo mkdir -p {mount_path}")).await?;

    let probe = shell.exec(&format!("sudo file -sL {device_path}")).await?;
    if probe.stdout.trim() == format!("{device_path}: data") {
        tracing::info!(volume = %volume.name, "device is unformatted, creating ext4 filesystem");
        let format = shell
            .exec(&format!("sudo mkfs.ext4 -F {device_path}"))
            .await?;
        if !format.success() {
            return Err(DeployError::RemoteBringup {
                detail: format!("mkfs.ext4 failed: {}", format.stderr.trim()),
            });
        }
    }

    let mount = shell
        .exec(&format!("sudo mount -o {MOUNT_OPTIONS} {device_path} {mount_path}"))
        .await?;
    if !mount.success() {
        return Err(DeployError::RemoteBringup {
            detail: format!("mount failed: {}", mount.stderr.trim()),
        });
    }

    let fstab_entry = format!("{device_path} {mount_path} ext4 {FSTAB_OPTIONS} 0 0");
    shell
        .exec(&format!(
            "grep -qF '{fstab_entry}' /etc/fstab || echo '{fstab_entry}' | sudo tee -a /etc/fstab"
        ))
        .await?;

    tracing::info!(volume = %volume.name, mount_path, "volume mounted");
    Ok(())
}
