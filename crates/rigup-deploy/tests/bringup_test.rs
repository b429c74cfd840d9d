//! Remote bring-up stages against a scripted shell

mod common;

use common::*;
use rigup_deploy::error::DeployError;
use rigup_deploy::poller::Poller;
use rigup_deploy::steps::{mount_volume, revoke_setup_key, wait_for_cloud_init};
use std::time::Duration;

fn fast_poller() -> Poller {
    Poller::new(Duration::ZERO)
}

#[tokio::test]
async fn cloud_init_wait_polls_until_result_file_appears() {
    let shell = FakeShell::new(vec![
        ok("Not found"),
        ok("Not found"),
        ok("Not found"),
        ok(r#"{"v1": {"errors": []}}"#),
    ]);

    wait_for_cloud_init(&shell, &fast_poller()).await.unwrap();

    // Three absent polls plus the one that found a clean result.
    assert_eq!(shell.commands().len(), 4);
}

#[tokio::test]
async fn cloud_init_errors_fail_immediately_without_further_polls() {
    let shell = FakeShell::new(vec![ok(
        r#"{"v1": {"errors": ["('scripts-user', ...)"], "datasource": "DataSourceDigitalOcean"}}"#,
    )]);

    let result = wait_for_cloud_init(&shell, &fast_poller()).await;

    match result {
        Err(DeployError::RemoteBringup { detail }) => {
            assert!(detail.contains("scripts-user"));
        }
        other => panic!("expected a bring-up failure, got {other:?}"),
    }
    assert_eq!(shell.commands().len(), 1);
}

#[tokio::test]
async fn cloud_init_unparsable_result_is_terminal_with_captured_text() {
    let shell = FakeShell::new(vec![ok("segfault: core dumped")]);

    let result = wait_for_cloud_init(&shell, &fast_poller()).await;

    match result {
        Err(DeployError::RemoteBringup { detail }) => {
            assert!(detail.contains("segfault: core dumped"));
        }
        other => panic!("expected a bring-up failure, got {other:?}"),
    }
}

#[tokio::test]
async fn unformatted_device_is_formatted_before_mounting() {
    let vol = volume("506f78a4", "showkit-data", "nyc1", &[]);
    let shell = FakeShell::new(vec![
        ok(""),                                     // mkdir
        ok("/dev/disk/by-uuid/506f78a4: data"),     // probe: bare device
        ok(""),                                     // mkfs
        ok(""),                                     // mount
        ok(""),                                     // fstab append
    ]);

    mount_volume(&shell, &vol).await.unwrap();

    let commands = shell.commands();
    assert!(commands.iter().any(|c| c.contains("mkfs.ext4 -F /dev/disk/by-uuid/506f78a4")));
    assert!(commands.iter().any(|c| c.contains("mount -o discard,defaults")));
}

#[tokio::test]
async fn formatted_device_is_never_reformatted() {
    let vol = volume("506f78a4", "showkit-data", "nyc1", &[]);
    let shell = FakeShell::new(vec![
        ok(""),
        ok("/dev/disk/by-uuid/506f78a4: Linux rev 1.0 ext4 filesystem data (extents)"),
        ok(""), // mount
        ok(""), // fstab append
    ]);

    mount_volume(&shell, &vol).await.unwrap();

    let commands = shell.commands();
    assert!(!commands.iter().any(|c| c.contains("mkfs")));
    assert_eq!(commands.len(), 4);
}

#[tokio::test]
async fn fstab_entry_append_is_guarded_by_a_presence_check() {
    let vol = volume("506f78a4", "showkit-data", "nyc1", &[]);
    let shell = FakeShell::new(vec![
        ok(""),
        ok("/dev/disk/by-uuid/506f78a4: Linux rev 1.0 ext4 filesystem data (extents)"),
        ok(""),
        ok(""),
    ]);

    mount_volume(&shell, &vol).await.unwrap();

    let fstab = shell
        .commands()
        .into_iter()
        .find(|c| c.contains("/etc/fstab"))
        .unwrap();
    assert!(fstab.contains("grep -qF"));
    assert!(fstab.contains("defaults,nofail,discard"));
}

#[tokio::test]
async fn revoke_scrubs_the_setup_key_by_comment_fragment() {
    let shell = FakeShell::new(vec![ok("")]);

    revoke_setup_key(&shell).await.unwrap();

    let commands = shell.commands();
    assert_eq!(commands.len(), 1);
    assert!(commands[0].contains("rigup-setup"));
    assert!(commands[0].contains("/home/showkit/.ssh/authorized_keys"));
}
