//! Error types for each pipeline stage.
//!
//! Every failure is terminal for the invocation; `main` hands the
//! top-level [`PersistNetError`] to color-eyre for reporting.

use camino::Utf8PathBuf;
use thiserror::Error;

/// The VM is not in a state that permits modifying its disk.
#[derive(Debug, Error)]
pub enum VmStateError {
    /// No domain with this name is defined
    #[error("VM '{0}' does not exist")]
    NotFound(String),

    /// The domain exists but is not shut off
    #[error("VM '{0}' exists but is currently running. Please shut it down first")]
    RunningNotShutOff(String),

    /// The status query itself could not be executed
    #[error("failed to query VM status: {0}")]
    ToolFailure(String),
}

/// Failure obtaining hardware addresses from the machine description.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// Retrieving the description failed
    #[error("failed to retrieve VM description: {0}")]
    ToolFailure(String),

    /// The description is not a well-formed domain document
    #[error("failed to parse VM description: {0}")]
    ParseFailure(String),

    /// The description lists no network device with a hardware address
    #[error("no network interfaces found in VM '{0}'")]
    NoDevicesFound(String),
}

/// Failure writing the transient rules artifact.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("work directory path is not valid UTF-8: {0}")]
    NonUtf8WorkDir(String),

    #[error("failed to create scratch directory under {path}")]
    Create {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write rules file {path}")]
    Write {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failure installing the artifact into the guest filesystem.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("failed to copy rules file to VM: {0}")]
    ToolFailure(String),
}

/// Top-level error for one invocation.
#[derive(Debug, Error)]
pub enum PersistNetError {
    /// Invalid command-line options that clap itself cannot reject
    #[error("invalid usage: {0}")]
    Usage(String),

    #[error(transparent)]
    VmState(#[from] VmStateError),

    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Delivery(#[from] DeliveryError),

    /// Writing to standard output failed
    #[error("failed to write output")]
    Output(#[source] std::io::Error),
}
