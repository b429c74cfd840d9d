//! DNS convergence wait for secure deployments
//!
//! Certificate issuance during first boot requires the deployment's domain
//! to already resolve to the droplet's floating IP. When it does not, the
//! operator is asked to update the DNS record, then resolution is polled
//! until it matches.

use crate::error::{DeployError, Result};
use crate::interact::Interaction;
use crate::poller::{PollError, PollOutcome, Poller};
use std::time::Duration;

const DNS_POLL_INTERVAL: Duration = Duration::from_secs(2);

pub async fn wait_until_domain_resolves(
    domain: &str,
    floating_ip: &str,
    interact: &mut dyn Interaction,
) -> Result<()> {
    match resolve_first_a_record(domain).await {
        Some(ip) if ip == floating_ip => return Ok(()),
        current => {
            let currently = match current {
                Some(ip) => format!("It currently resolves to {ip}."),
                None => "It currently does not resolve to anything.".to_string(),
            };
            interact.pause(&format!(
                "The defined domain ({domain}) does not resolve to the chosen floating IP \
                 ({floating_ip}). {currently} Press Enter once you've updated the DNS record \
                 to point to {floating_ip}."
            ))?;
        }
    }

    tracing::info!(domain, floating_ip, "waiting for DNS to converge");
    let poller = Poller::new(DNS_POLL_INTERVAL);
    let converged: std::result::Result<(), PollError<DeployError>> = poller
        .run(|| async move {
            match resolve_first_a_record(domain).await {
                Some(ip) if ip == floating_ip => PollOutcome::Ready(()),
                _ => PollOutcome::Pending,
            }
        })
        .await;

    converged.map_err(|e| match e {
        PollError::Failed(e) => e,
        PollError::Exhausted(n) => DeployError::DnsLookup {
            domain: domain.to_string(),
            message: format!("did not converge after {n} checks"),
        },
    })
}

/// First IPv4 address the domain resolves to. A lookup failure (the record
/// does not exist yet, or the resolver is unhappy) reads as "resolves to
/// nothing": the operator is fixing DNS right now, so the next poll simply
/// tries again.
async fn resolve_first_a_record(domain: &str) -> Option<String> {
    match tokio::net::lookup_host((domain, 443)).await {
        Ok(addresses) => addresses
            .filter(|a| a.is_ipv4())
            .map(|a| a.ip().to_string())
            .next(),
        Err(error) => {
            tracing::debug!(domain, %error, "lookup failed");
            None
        }
    }
}
