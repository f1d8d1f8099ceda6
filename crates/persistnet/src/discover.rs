//! Discover the hardware addresses of a domain's network interfaces
//!
//! Addresses are read from `domain/devices/interface/mac/@address` in
//! document order; that order later decides interface numbering.

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::backend::DomainDescriptionSource;
use crate::errors::DiscoveryError;
use crate::xml_utils::{self, XmlNode};

/// One virtual NIC from the machine description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkDevice {
    pub hardware_address: String,
}

impl NetworkDevice {
    pub fn new(hardware_address: impl Into<String>) -> Self {
        Self {
            hardware_address: hardware_address.into(),
        }
    }
}

/// Extract network devices from a libvirt domain document.
///
/// Interfaces without a `<mac>` element or with an empty address are skipped.
pub fn parse_network_devices(xml: &str) -> Result<Vec<NetworkDevice>, DiscoveryError> {
    let dom = xml_utils::parse_xml_dom(xml)
        .map_err(|e| DiscoveryError::ParseFailure(e.to_string()))?;
    if dom.name != "domain" {
        return Err(DiscoveryError::ParseFailure(format!(
            "expected <domain> root element, found <{}>",
            dom.name
        )));
    }

    let devices: Vec<_> = dom
        .children_named("devices")
        .flat_map(|d| d.children_named("interface"))
        .filter_map(interface_mac)
        .map(NetworkDevice::new)
        .collect();
    Ok(devices)
}

fn interface_mac(iface: &XmlNode) -> Option<&str> {
    let address = iface.child("mac")?.attribute("address")?.trim();
    (!address.is_empty()).then_some(address)
}

// Duplicates are passed through unchanged and get distinct names.
fn warn_duplicates(vm_name: &str, devices: &[NetworkDevice]) {
    let mut seen = HashSet::new();
    for dev in devices {
        if !seen.insert(dev.hardware_address.as_str()) {
            warn!(
                "VM '{vm_name}' lists hardware address {} more than once",
                dev.hardware_address
            );
        }
    }
}

/// Fetch and parse the description of `vm_name`.
///
/// Fails with [`DiscoveryError::NoDevicesFound`] rather than returning an
/// empty list.
pub fn discover(
    source: &dyn DomainDescriptionSource,
    vm_name: &str,
) -> Result<Vec<NetworkDevice>, DiscoveryError> {
    let xml = source.domain_xml(vm_name)?;
    let devices = parse_network_devices(&xml)?;
    if devices.is_empty() {
        return Err(DiscoveryError::NoDevicesFound(vm_name.to_owned()));
    }

    warn_duplicates(vm_name, &devices);
    debug!("Discovered {} network devices in {vm_name}", devices.len());
    Ok(devices)
}
