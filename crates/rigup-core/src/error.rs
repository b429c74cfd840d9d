use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DefinitionError {
    #[error("failed to read deployment definition {path}: {message}")]
    Read { path: PathBuf, message: String },

    #[error("unsupported deployment definition extension \"{0}\"; use .yml, .yaml, or .json")]
    UnsupportedExtension(String),

    #[error("{path} is not valid YAML: {message}")]
    InvalidYaml { path: PathBuf, message: String },

    #[error("{path} is not valid JSON: {message}")]
    InvalidJson { path: PathBuf, message: String },

    #[error("secure deployments require a non-empty \"{0}\"")]
    MissingSecureField(&'static str),

    #[error("bundle \"{name}\": {url} is not a supported repository URL (github.com or bitbucket.org)")]
    UnsupportedHost { name: String, url: String },

    #[error("bundle \"{name}\": \"{range}\" is not a valid version range: {message}")]
    InvalidVersionRange {
        name: String,
        range: String,
        message: String,
    },

    #[error("runtime.version \"{range}\" is not a valid version range: {message}")]
    InvalidRuntimeVersion { range: String, message: String },

    #[error("runtime.config must be a JSON object")]
    RuntimeConfigNotObject,
}

pub type Result<T> = std::result::Result<T, DefinitionError>;
