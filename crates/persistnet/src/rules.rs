//! udev rule rendering and the transient rule file
//!
//! The rendered text is the single source for both the console preview and
//! the file handed to the guest; nothing re-renders it in between.

use std::fmt;

use camino::{Utf8Path, Utf8PathBuf};
use tempfile::TempDir;
use tracing::{debug, warn};

use crate::errors::RenderError;
use crate::naming::InterfaceBinding;

pub const DEFAULT_RULE_NAME: &str = "70-persistent-net.rules";

/// Bindings for one VM, ready to be rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSet {
    pub vm_name: String,
    pub bindings: Vec<InterfaceBinding>,
}

impl RuleSet {
    pub fn new(vm_name: impl Into<String>, bindings: Vec<InterfaceBinding>) -> Self {
        Self {
            vm_name: vm_name.into(),
            bindings,
        }
    }

    pub fn render(&self) -> String {
        render(&self.bindings, &self.vm_name)
    }
}

impl fmt::Display for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Render `bindings` for `vm_name`. Values are substituted verbatim.
pub fn render(bindings: &[InterfaceBinding], vm_name: &str) -> String {
    let mut text = format!("# Network interface persistence rules for VM '{vm_name}'\n");
    for b in bindings {
        text.push_str(&format!(
            r#"SUBSYSTEM=="net", ACTION=="add", ATTR{{address}}=="{}", NAME="{}""#,
            b.hardware_address, b.interface_name
        ));
        text.push('\n');
    }
    text
}

/// The rendered rules written to `<scratch dir>/<rule name>`.
///
/// The scratch directory is removed by [`RuleArtifact::cleanup`], or on drop
/// if an early return skips it.
#[derive(Debug)]
pub struct RuleArtifact {
    dir: TempDir,
    path: Utf8PathBuf,
}

impl RuleArtifact {
    pub fn create(work_dir: &Utf8Path, rule_name: &str, text: &str) -> Result<Self, RenderError> {
        let dir = tempfile::Builder::new()
            .prefix("persistent-net-")
            .tempdir_in(work_dir)
            .map_err(|source| RenderError::Create {
                path: work_dir.to_owned(),
                source,
            })?;
        let path = Utf8Path::from_path(dir.path())
            .ok_or_else(|| RenderError::NonUtf8WorkDir(dir.path().display().to_string()))?
            .join(rule_name);
        std::fs::write(&path, text).map_err(|source| RenderError::Write {
            path: path.clone(),
            source,
        })?;
        debug!("Wrote {} bytes to {path}", text.len());
        Ok(Self { dir, path })
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Remove the artifact and its scratch directory.
    pub fn cleanup(self) {
        let path = self.path;
        match self.dir.close() {
            Ok(()) => debug!("Removed {path}"),
            Err(e) => warn!("Failed to remove {path}: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    fn binding(mac: &str, name: &str) -> InterfaceBinding {
        InterfaceBinding {
            hardware_address: mac.into(),
            interface_name: name.into(),
        }
    }

    /// Recover `(address, name)` from a rendered rule line.
    fn parse_rule_line(line: &str) -> Option<(String, String)> {
        let rest = line.strip_prefix(r#"SUBSYSTEM=="net", ACTION=="add", ATTR{address}==""#)?;
        let (mac, rest) = rest.split_once('"')?;
        let name = rest.strip_prefix(r#", NAME=""#)?.strip_suffix('"')?;
        Some((mac.to_owned(), name.to_owned()))
    }

    #[test]
    fn test_render_two_bindings() {
        let text = render(
            &[
                binding("52:54:00:11:11:11", "eth0"),
                binding("52:54:00:22:22:22", "eth1"),
            ],
            "centos7-vm",
        );
        assert_eq!(
            text,
            indoc! {r#"
                # Network interface persistence rules for VM 'centos7-vm'
                SUBSYSTEM=="net", ACTION=="add", ATTR{address}=="52:54:00:11:11:11", NAME="eth0"
                SUBSYSTEM=="net", ACTION=="add", ATTR{address}=="52:54:00:22:22:22", NAME="eth1"
            "#}
        );
    }

    #[test]
    fn test_render_empty_is_header_only() {
        assert_eq!(
            render(&[], "vm"),
            "# Network interface persistence rules for VM 'vm'\n"
        );
    }

    #[test]
    fn test_render_is_deterministic() {
        let bindings = vec![binding("52:54:00:ab:cd:ef", "enp1")];
        assert_eq!(render(&bindings, "vm"), render(&bindings, "vm"));
    }

    #[test]
    fn test_rendered_lines_parse_back() {
        let bindings: Vec<_> = (0..5)
            .map(|i| binding(&format!("52:54:00:00:00:0{i}"), &format!("net{}", 10 + i)))
            .collect();
        let text = render(&bindings, "roundtrip-vm");
        let mut lines = text.lines();
        assert!(lines.next().unwrap().starts_with('#'));
        let parsed: Vec<_> = lines.map(|l| parse_rule_line(l).unwrap()).collect();
        let expected: Vec<_> = bindings
            .iter()
            .map(|b| (b.hardware_address.clone(), b.interface_name.clone()))
            .collect();
        assert_eq!(parsed, expected);
    }

    #[test]
    fn test_artifact_lifecycle() {
        let work = tempfile::tempdir().unwrap();
        let work_dir = Utf8Path::from_path(work.path()).unwrap();
        let artifact = RuleArtifact::create(work_dir, DEFAULT_RULE_NAME, "# rules\n").unwrap();
        let path = artifact.path().to_owned();
        assert_eq!(path.file_name(), Some(DEFAULT_RULE_NAME));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# rules\n");

        artifact.cleanup();
        assert!(!path.exists());
        assert_eq!(std::fs::read_dir(work_dir).unwrap().count(), 0);
    }

    #[test]
    fn test_artifact_removed_on_drop() {
        let work = tempfile::tempdir().unwrap();
        let work_dir = Utf8Path::from_path(work.path()).unwrap();
        let path = {
            let artifact = RuleArtifact::create(work_dir, "x.rules", "").unwrap();
            artifact.path().to_owned()
        };
        assert!(!path.exists());
    }

    #[test]
    fn test_artifact_missing_work_dir() {
        let err = RuleArtifact::create(
            Utf8Path::new("/nonexistent/work/dir"),
            DEFAULT_RULE_NAME,
            "",
        )
        .unwrap_err();
        assert!(matches!(err, RenderError::Create { .. }));
    }
}
