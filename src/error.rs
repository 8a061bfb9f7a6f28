//! Error types for dmctl

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DmcError {
    #[error("Unknown workload '{0}' (expected one of: drone, sim)")]
    UnknownWorkload(String),

    #[error("Unknown OBC type '{0}' (expected rpi, x86 or sim)")]
    UnknownObcType(String),

    #[error("OBC not configured, select version by running dmctl config obc")]
    ImageNotConfigured,

    #[error("Location must be set for simulation (use --location LAT,LNG,ALT)")]
    MissingSimulationLocation,

    #[error("Invalid simulation location '{0}', expected LAT,LNG,ALT")]
    InvalidSimulationLocation(String),

    #[error("Missing configuration value {0}, run dmctl config first")]
    MissingConfig(String),

    #[error("Failed writing config: {0}")]
    ConfigPersistError(String),

    #[error("Failed reading config {path}: {message}")]
    ConfigLoad { path: String, message: String },

    #[error("Container name '{0}' is already in use, run dmctl stop or start --recreate")]
    CreateConflict(String),

    #[error("Failed to start container: {0}")]
    StartFailed(String),

    #[error("Could not connect to docker: {0}")]
    RuntimeUnreachable(String),

    #[error("Docker {operation} failed: {message}")]
    Runtime {
        operation: &'static str,
        message: String,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DmcError>;
