//! Capabilities the pipeline needs from the virtualization host
//!
//! Each trait is a narrow seam around an external tool so that the pipeline
//! can run against virsh/libguestfs in production and against in-memory
//! fakes in tests.

use camino::Utf8Path;

use crate::errors::{DeliveryError, DiscoveryError, VmStateError};

/// Fixed guest directory for udev rule files.
pub const GUEST_RULES_DIR: &str = "/etc/udev/rules.d/";

/// Coarse state of a domain as far as disk modification is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum DomainState {
    NotFound,
    Running,
    ShutOff,
}

/// Query whether a domain exists and is shut off.
pub trait DomainStatusQuery {
    fn domain_state(&self, vm_name: &str) -> Result<DomainState, VmStateError>;
}

/// Retrieve the structured (XML) machine description of a domain.
pub trait DomainDescriptionSource {
    fn domain_xml(&self, vm_name: &str) -> Result<String, DiscoveryError>;
}

/// Install a local file into [`GUEST_RULES_DIR`] of a powered-off domain.
pub trait GuestDelivery {
    fn deliver(
        &self,
        artifact: &Utf8Path,
        vm_name: &str,
        destination_filename: &str,
    ) -> Result<(), DeliveryError>;
}
