//! A throwaway libvirt host made of shell scripts
//!
//! `virsh` answers `list` and `dumpxml` from files in a state directory, and
//! `virt-copy-in` copies into `<state>/guest/<domain>/...`. Both are put
//! first on PATH for the tool under test; TMPDIR points at a private
//! scratch directory so leftover artifacts can be detected.

use std::fs;
use std::os::unix::fs::PermissionsExt;

use camino::{Utf8Path, Utf8PathBuf};
use color_eyre::eyre::{eyre, Context};
use color_eyre::Result;
use indoc::indoc;
use tempfile::TempDir;
use xshell::{cmd, Shell};

use crate::{get_tool_command, CapturedOutput};

const FAKE_VIRSH: &str = indoc! {r#"
    #!/bin/sh
    state=@STATE@
    if [ "$1" = "-c" ]; then shift 2; fi
    case "$1" in
    list)
        if [ "$2" = "--state-shutoff" ]; then cat "$state/shutoff"; else cat "$state/all"; fi
        ;;
    dumpxml)
        if [ -f "$state/$2.xml" ]; then
            cat "$state/$2.xml"
        else
            echo "error: failed to get domain '$2'" >&2
            exit 1
        fi
        ;;
    *)
        echo "fake virsh: unsupported arguments: $*" >&2
        exit 1
        ;;
    esac
"#};

const FAKE_VIRT_COPY_IN: &str = indoc! {r#"
    #!/bin/sh
    state=@STATE@
    if [ "$1" = "-c" ]; then shift 2; fi
    if [ -e "$state/copy-fails" ]; then
        echo "libguestfs: error: could not create appliance" >&2
        exit 1
    fi
    # virt-copy-in -d DOMAIN FILE DEST
    mkdir -p "$state/guest/$2$4" && cp "$3" "$state/guest/$2$4"
"#};

/// Domain XML with one `<interface>` per MAC address.
pub(crate) fn domain_xml(name: &str, macs: &[&str]) -> String {
    let interfaces: String = macs
        .iter()
        .map(|mac| {
            format!(
                "    <interface type='network'>\n      <mac address='{mac}'/>\n      <source network='default'/>\n    </interface>\n"
            )
        })
        .collect();
    format!(
        "<domain type='kvm'>\n  <name>{name}</name>\n  <devices>\n    <emulator>/usr/bin/qemu-kvm</emulator>\n{interfaces}  </devices>\n</domain>\n"
    )
}

pub(crate) struct FakeLibvirt {
    _root: TempDir,
    bin: Utf8PathBuf,
    state: Utf8PathBuf,
    scratch: Utf8PathBuf,
}

fn write_script(path: &Utf8Path, template: &str, state: &Utf8Path) -> Result<()> {
    fs::write(path, template.replace("@STATE@", state.as_str()))
        .with_context(|| format!("Writing {path}"))?;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))?;
    Ok(())
}

impl FakeLibvirt {
    pub fn new() -> Result<Self> {
        let root = tempfile::tempdir()?;
        let base = Utf8Path::from_path(root.path())
            .ok_or_else(|| eyre!("non-UTF-8 tempdir"))?
            .to_owned();
        let bin = base.join("bin");
        let state = base.join("state");
        let scratch = base.join("scratch");
        for dir in [&bin, &state, &scratch] {
            fs::create_dir(dir)?;
        }
        fs::write(state.join("shutoff"), "")?;
        fs::write(state.join("all"), "")?;
        write_script(&bin.join("virsh"), FAKE_VIRSH, &state)?;
        write_script(&bin.join("virt-copy-in"), FAKE_VIRT_COPY_IN, &state)?;
        Ok(Self {
            _root: root,
            bin,
            state,
            scratch,
        })
    }

    fn append_line(&self, file: &str, line: &str) -> Result<()> {
        let path = self.state.join(file);
        let mut contents = fs::read_to_string(&path)?;
        contents.push_str(line);
        contents.push('\n');
        fs::write(&path, contents)?;
        Ok(())
    }

    /// Define a domain; `running` controls whether it is listed as shut off.
    pub fn define(&self, name: &str, running: bool, macs: &[&str]) -> Result<()> {
        fs::write(self.state.join(format!("{name}.xml")), domain_xml(name, macs))?;
        self.append_line("all", name)?;
        if !running {
            self.append_line("shutoff", name)?;
        }
        Ok(())
    }

    /// Make every subsequent virt-copy-in invocation fail.
    pub fn fail_copies(&self) -> Result<()> {
        fs::write(self.state.join("copy-fails"), "")?;
        Ok(())
    }

    /// Contents of a rules file installed into the guest, if any.
    pub fn installed_rules(&self, domain: &str, rule_name: &str) -> Option<String> {
        let path = self
            .state
            .join("guest")
            .join(domain)
            .join("etc/udev/rules.d")
            .join(rule_name);
        fs::read_to_string(path).ok()
    }

    /// Number of entries left behind in the tool's temporary directory.
    pub fn scratch_entries(&self) -> Result<usize> {
        Ok(fs::read_dir(&self.scratch)?.count())
    }

    /// Run the tool under test with the fake tools first on PATH.
    pub fn run_tool(&self, args: &[&str]) -> Result<CapturedOutput> {
        let sh = Shell::new()?;
        let path = match std::env::var("PATH") {
            Ok(p) => format!("{}:{p}", self.bin),
            Err(_) => self.bin.to_string(),
        };
        sh.set_var("PATH", path);
        sh.set_var("TMPDIR", self.scratch.as_str());
        sh.set_var("RUST_LOG", "warn");
        let tool = get_tool_command()?;
        let output = cmd!(sh, "{tool} {args...}").ignore_status().output()?;
        Ok(CapturedOutput::new(output))
    }
}
