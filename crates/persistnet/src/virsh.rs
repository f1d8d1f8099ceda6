//! virsh-backed domain status and description retrieval

use std::process::Command;

use tracing::debug;

use crate::backend::{DomainDescriptionSource, DomainState, DomainStatusQuery};
use crate::command_run::CommandRun;
use crate::errors::{DiscoveryError, VmStateError};

/// How external libvirt/libguestfs tools are invoked on this host.
#[derive(Debug, Clone, Default)]
pub struct HostTools {
    /// Hypervisor connection URI (e.g., qemu:///system)
    pub connect: Option<String>,
    /// Run every tool through sudo
    pub sudo: bool,
}

impl HostTools {
    /// Create a command for `program`, honoring sudo and the connection URI.
    ///
    /// Both virsh and the virt-* tools accept `-c URI`.
    pub(crate) fn command(&self, program: &str) -> Command {
        let mut cmd = if self.sudo {
            let mut cmd = Command::new("sudo");
            cmd.arg(program);
            cmd
        } else {
            Command::new(program)
        };
        if let Some(uri) = self.connect.as_deref() {
            cmd.arg("-c").arg(uri);
        }
        cmd
    }

    /// The command line a user would type to start `vm_name`.
    pub fn start_hint(&self, vm_name: &str) -> String {
        let mut hint = String::new();
        if self.sudo {
            hint.push_str("sudo ");
        }
        hint.push_str("virsh ");
        if let Some(uri) = self.connect.as_deref() {
            hint.push_str(&format!("-c {uri} "));
        }
        hint.push_str(&format!("start {vm_name}"));
        hint
    }

    fn virsh_list(&self, filter: &str) -> Result<Vec<String>, VmStateError> {
        let out = self
            .command("virsh")
            .args(["list", filter, "--name"])
            .run_get_string()
            .map_err(|e| VmStateError::ToolFailure(e.to_string()))?;
        Ok(parse_domain_names(&out))
    }
}

/// Parse `virsh list --name` output: one domain per line, blank lines ignored.
fn parse_domain_names(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

impl DomainStatusQuery for HostTools {
    fn domain_state(&self, vm_name: &str) -> Result<DomainState, VmStateError> {
        let state = if self
            .virsh_list("--state-shutoff")?
            .iter()
            .any(|n| n == vm_name)
        {
            DomainState::ShutOff
        } else if self.virsh_list("--all")?.iter().any(|n| n == vm_name) {
            DomainState::Running
        } else {
            DomainState::NotFound
        };
        debug!("Domain {vm_name} is {state}");
        Ok(state)
    }
}

impl DomainDescriptionSource for HostTools {
    fn domain_xml(&self, vm_name: &str) -> Result<String, DiscoveryError> {
        self.command("virsh")
            .args(["dumpxml", vm_name])
            .run_get_string()
            .map_err(|e| DiscoveryError::ToolFailure(e.to_string()))
    }
}
