//! Guest filesystem delivery through libguestfs' virt-copy-in

use camino::Utf8Path;
use tracing::debug;

use crate::backend::{GuestDelivery, GUEST_RULES_DIR};
use crate::command_run::CommandRun;
use crate::errors::DeliveryError;
use crate::virsh::HostTools;

impl GuestDelivery for HostTools {
    fn deliver(
        &self,
        artifact: &Utf8Path,
        vm_name: &str,
        destination_filename: &str,
    ) -> Result<(), DeliveryError> {
        // virt-copy-in keeps the source file name; there is no rename option.
        if artifact.file_name() != Some(destination_filename) {
            return Err(DeliveryError::ToolFailure(format!(
                "artifact {artifact} must be named {destination_filename}"
            )));
        }
        debug!("Copying {artifact} into {vm_name}:{GUEST_RULES_DIR}");
        self.command("virt-copy-in")
            .args(["-d", vm_name, artifact.as_str(), GUEST_RULES_DIR])
            .run()
            .map_err(|e| DeliveryError::ToolFailure(e.to_string()))
    }
}
