//! Integration tests for kvm-vm-persistent-net
//!
//! These run the built binary against fake `virsh` and `virt-copy-in`
//! executables, so no libvirt installation is required.

use std::process::Output;

use camino::Utf8Path;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use libtest_mimic::{Arguments, Trial};

pub(crate) use integration_tests::{integration_test, INTEGRATION_TESTS};

mod fake_libvirt;

mod tests {
    pub mod persistent_net;
}

/// Get the path to the binary under test, checking PERSISTENT_NET_PATH first
pub(crate) fn get_tool_command() -> Result<String> {
    if let Ok(path) = std::env::var("PERSISTENT_NET_PATH") {
        return Ok(path);
    }
    // Force the user to set this if we're running from the project dir
    if let Some(path) = [
        "target/debug/kvm-vm-persistent-net",
        "target/release/kvm-vm-persistent-net",
    ]
    .into_iter()
    .find(|p| Utf8Path::new(p).exists())
    {
        return Err(eyre!(
            "Detected {path} - set PERSISTENT_NET_PATH={path} to run using this binary"
        ));
    }
    Ok("kvm-vm-persistent-net".to_owned())
}

/// Captured output from a command with decoded stdout/stderr strings
pub(crate) struct CapturedOutput {
    pub output: Output,
    pub stdout: String,
    pub stderr: String,
}

impl CapturedOutput {
    pub fn new(output: Output) -> Self {
        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        Self {
            output,
            stdout,
            stderr,
        }
    }

    /// Assert that the command succeeded, printing debug info on failure
    pub fn assert_success(&self, context: &str) {
        assert!(
            self.output.status.success(),
            "{} failed: {}",
            context,
            self.stderr
        );
    }

    /// Assert that the command failed, printing its output if it did not
    pub fn assert_failure(&self, context: &str) {
        assert!(
            !self.output.status.success(),
            "{} unexpectedly succeeded: {}",
            context,
            self.stdout
        );
    }

    pub fn exit_code(&self) -> Option<i32> {
        self.output.status.code()
    }
}

fn main() {
    // The fake tools are POSIX shell scripts
    if std::env::consts::OS != "linux" {
        eprintln!(
            "Integration tests are only supported on Linux (current OS: {})",
            std::env::consts::OS
        );
        eprintln!("Skipping all integration tests.");
        std::process::exit(0);
    }

    let args = Arguments::from_args();

    let tests: Vec<Trial> = INTEGRATION_TESTS
        .iter()
        .map(|test| {
            let f = test.f;
            Trial::test(test.name, move || f().map_err(|e| format!("{:?}", e).into()))
        })
        .collect();

    libtest_mimic::run(&args, tests).exit();
}
