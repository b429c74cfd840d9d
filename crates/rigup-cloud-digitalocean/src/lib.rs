//! DigitalOcean provider for rigup
//!
//! Implements the `rigup-cloud` [`CloudApi`](rigup_cloud::CloudApi) trait
//! against the DigitalOcean v2 REST API with bearer-token authentication.
//!
//! # Example
//!
//! ```ignore
//! use rigup_cloud::CloudApi;
//! use rigup_cloud_digitalocean::DigitalOceanApi;
//!
//! let api = DigitalOceanApi::new(token);
//! let regions = api.list_regions().await?;
//! ```

pub mod client;
pub mod error;

pub use client::DigitalOceanApi;
pub use error::{DigitalOceanError, Result};
