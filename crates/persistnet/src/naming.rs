//! Map discovered devices to interface names

use crate::discover::NetworkDevice;

pub const DEFAULT_PREFIX: &str = "eth";

/// How interface names are generated: `prefix` followed by a counter
/// starting at `start_index`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamingPolicy {
    pub prefix: String,
    pub start_index: u32,
}

impl Default for NamingPolicy {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_owned(),
            start_index: 0,
        }
    }
}

impl NamingPolicy {
    /// Name for the device at `position` (0-based) in discovery order.
    pub fn interface_name(&self, position: usize) -> String {
        // u32 + usize always fits in u64 on supported targets
        let index = u64::from(self.start_index) + position as u64;
        format!("{}{}", self.prefix, index)
    }
}

/// A hardware address pinned to an interface name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceBinding {
    pub hardware_address: String,
    pub interface_name: String,
}

/// Assign names in input order. Total and deterministic; duplicate
/// addresses are not collapsed.
pub fn assign(devices: &[NetworkDevice], policy: &NamingPolicy) -> Vec<InterfaceBinding> {
    devices
        .iter()
        .enumerate()
        .map(|(i, dev)| InterfaceBinding {
            hardware_address: dev.hardware_address.clone(),
            interface_name: policy.interface_name(i),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn devices(macs: &[&str]) -> Vec<NetworkDevice> {
        macs.iter().copied().map(NetworkDevice::new).collect()
    }

    fn names(bindings: &[InterfaceBinding]) -> Vec<&str> {
        bindings.iter().map(|b| b.interface_name.as_str()).collect()
    }

    #[test]
    fn test_default_policy() {
        let bindings = assign(
            &devices(&["52:54:00:11:11:11", "52:54:00:22:22:22"]),
            &NamingPolicy::default(),
        );
        assert_eq!(
            bindings,
            [
                InterfaceBinding {
                    hardware_address: "52:54:00:11:11:11".into(),
                    interface_name: "eth0".into(),
                },
                InterfaceBinding {
                    hardware_address: "52:54:00:22:22:22".into(),
                    interface_name: "eth1".into(),
                },
            ]
        );
    }

    #[test]
    fn test_custom_prefix_and_start() {
        let policy = NamingPolicy {
            prefix: "enp".into(),
            start_index: 1,
        };
        let bindings = assign(&devices(&["a", "b", "c"]), &policy);
        assert_eq!(names(&bindings), ["enp1", "enp2", "enp3"]);
    }

    #[test]
    fn test_large_start_index() {
        let policy = NamingPolicy {
            prefix: "net".into(),
            start_index: u32::MAX,
        };
        let bindings = assign(&devices(&["a", "b"]), &policy);
        assert_eq!(names(&bindings), ["net4294967295", "net4294967296"]);
    }

    #[test]
    fn test_suffixes_follow_input_order() {
        for start in [0u32, 7, 1_000_000] {
            let policy = NamingPolicy {
                prefix: "eth".into(),
                start_index: start,
            };
            let input = devices(&["m0", "m1", "m2", "m3", "m4"]);
            let bindings = assign(&input, &policy);
            assert_eq!(bindings.len(), input.len());
            for (i, (b, d)) in bindings.iter().zip(&input).enumerate() {
                assert_eq!(b.hardware_address, d.hardware_address);
                assert_eq!(b.interface_name, format!("eth{}", u64::from(start) + i as u64));
            }
        }
    }

    #[test]
    fn test_empty_input() {
        assert!(assign(&[], &NamingPolicy::default()).is_empty());
    }

    #[test]
    fn test_duplicate_addresses_get_distinct_names() {
        // Addresses are not deduplicated; each entry gets its own slot.
        let bindings = assign(&devices(&["52:54:00:11:11:11"; 2]), &NamingPolicy::default());
        assert_eq!(names(&bindings), ["eth0", "eth1"]);
        assert_eq!(bindings[0].hardware_address, bindings[1].hardware_address);
    }
}
