//! Deployment definition model for rigup
//!
//! A deployment definition is a YAML or JSON document describing one ShowKit
//! deployment: the droplet to create, the optional block-storage volume and
//! floating IP, the runtime version and configuration, and the set of
//! versioned bundles to install alongside it.
//!
//! This crate owns parsing, defaulting, and validation. The definition is
//! immutable once parsed; every later stage of a deployment holds it by
//! reference.

pub mod error;
pub mod model;
pub mod parser;

pub use error::{DefinitionError, Result};
pub use model::{
    Bundle, DeploymentDefinition, DropletSpec, HostedRepo, RuntimeSpec, SourceHost, VolumeSpec,
};
pub use parser::parse_definition_file;
