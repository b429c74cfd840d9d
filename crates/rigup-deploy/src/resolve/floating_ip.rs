//! Floating IP resolution
//!
//! Cases, evaluated in order:
//! 1. an IP is requested, sits in the chosen region, and is unattached:
//!    adopt it;
//! 2. the requested IP is attached to another droplet: the operator destroys
//!    that droplet, unassigns the IP, or aborts;
//! 3. the requested IP is in the wrong region: fall through to the
//!    "nothing requested" flow;
//! 4. nothing requested: create a new IP, pick an existing in-region one
//!    (re-running the case-2 conflict resolution if it is attached), or
//!    proceed without a floating IP.

use crate::decisions::Decisions;
use crate::error::{DeployError, Result};
use crate::interact::Interaction;
use rigup_cloud::{CloudApi, FloatingIp};

pub async fn resolve_floating_ip(
    api: &dyn CloudApi,
    interact: &mut dyn Interaction,
    decisions: &mut Decisions,
) -> Result<()> {
    if let Some(requested) = decisions.chosen_floating_ip.clone() {
        decisions.use_floating_ip = true;
        let floating_ip = api.get_floating_ip(&requested).await?;

        if floating_ip.region == decisions.chosen_region {
            if floating_ip.droplet.is_some() {
                resolve_attachment_conflict(api, interact, &floating_ip).await?;
            }
            decisions.chosen_floating_ip = Some(floating_ip.ip);
        } else {
            let message = format!(
                "The defined floating IP ({}) is in region {}, but this deployment \
                 is for {}. How would you like to proceed?",
                requested, floating_ip.region, decisions.chosen_region
            );
            decisions.chosen_floating_ip =
                select_floating_ip_action(&message, api, interact, decisions).await?;
        }
    } else {
        let message = "Your deployment definition does not specify a droplet.floating_ip. \
                       How would you like to proceed?";
        decisions.chosen_floating_ip =
            select_floating_ip_action(message, api, interact, decisions).await?;
    }

    Ok(())
}

/// The "no usable IP requested" flow: create, choose existing, or go without.
async fn select_floating_ip_action(
    message: &str,
    api: &dyn CloudApi,
    interact: &mut dyn Interaction,
    decisions: &mut Decisions,
) -> Result<Option<String>> {
    let choices = vec![
        "Create a new floating IP".to_string(),
        "Choose an existing floating IP".to_string(),
        "Don't use a floating IP".to_string(),
    ];

    match interact.select(message, &choices)? {
        0 => {
            let created = api.create_floating_ip(&decisions.chosen_region).await?;
            decisions.use_floating_ip = true;
            tracing::debug!(ip = %created.ip, "created floating IP");
            Ok(Some(created.ip))
        }
        1 => {
            let chosen = choose_existing_floating_ip(api, interact, decisions).await?;
            decisions.use_floating_ip = true;
            Ok(Some(chosen))
        }
        _ => {
            decisions.use_floating_ip = false;
            Ok(None)
        }
    }
}

async fn choose_existing_floating_ip(
    api: &dyn CloudApi,
    interact: &mut dyn Interaction,
    decisions: &mut Decisions,
) -> Result<String> {
    let available: Vec<FloatingIp> = api
        .list_floating_ips()
        .await?
        .into_iter()
        .filter(|ip| ip.region == decisions.chosen_region)
        .collect();

    if available.is_empty() {
        return Err(DeployError::NoFloatingIpInRegion(
            decisions.chosen_region.clone(),
        ));
    }

    let labels: Vec<String> = available
        .iter()
        .map(|ip| match &ip.droplet {
            Some(droplet) => format!("{} (currently assigned to {})", ip.ip, droplet.name),
            None => ip.ip.clone(),
        })
        .collect();

    let index = interact.select(
        "Please choose a floating IP to use for this deployment",
        &labels,
    )?;
    let chosen = &available[index];

    if chosen.droplet.is_some() {
        resolve_attachment_conflict(api, interact, chosen).await?;
    }

    Ok(chosen.ip.clone())
}

/// The IP is assigned to another droplet. No mutating call touches the IP
/// until the operator picks an outcome; aborting changes nothing.
async fn resolve_attachment_conflict(
    api: &dyn CloudApi,
    interact: &mut dyn Interaction,
    floating_ip: &FloatingIp,
) -> Result<()> {
    let droplet = floating_ip
        .droplet
        .as_ref()
        .expect("caller checked attachment");

    let choices = vec![
        format!("Destroy droplet \"{}\"", droplet.name),
        format!("Unassign {} from droplet \"{}\"", floating_ip.ip, droplet.name),
        "Abort (make no changes and cancel this deployment)".to_string(),
    ];

    let message = format!(
        "Floating IP \"{}\" is currently assigned to droplet \"{}\". \
         How do you want to proceed?",
        floating_ip.ip, droplet.name
    );

    match interact.select(&message, &choices)? {
        0 => {
            // Destroying a droplet releases its floating IPs as a side effect.
            api.delete_droplet(droplet.id).await?;
            tracing::info!(droplet = %droplet.name, "destroyed droplet holding floating IP");
            Ok(())
        }
        1 => {
            api.unassign_floating_ip(&floating_ip.ip).await?;
            tracing::info!(ip = %floating_ip.ip, "unassigned floating IP");
            Ok(())
        }
        _ => Err(DeployError::Aborted),
    }
}
