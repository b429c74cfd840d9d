//! Individual provisioning stages
//!
//! Each stage is a standalone async function over the collaborator traits so
//! the orchestrator stays a thin sequencing layer and every stage can be
//! driven against fakes.

mod cloud_init;
mod connect;
mod create_droplet;
mod dns;
mod mount_volume;
mod revoke;
mod save_changes;

pub use cloud_init::wait_for_cloud_init;
pub use connect::connect_with_retry;
pub use create_droplet::{create_droplet, wait_until_active};
pub use dns::wait_until_domain_resolves;
pub use mount_volume::mount_volume;
pub use revoke::revoke_setup_key;
pub use save_changes::offer_to_save_changes;
