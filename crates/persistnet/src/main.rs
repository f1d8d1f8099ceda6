//! kvm-vm-persistent-net - pin network interface names of a shut-off libvirt VM
//!
//! Reads the MAC addresses from the domain XML, numbers them in order, and
//! installs a udev rules file into the guest so each NIC keeps its name.

use camino::Utf8PathBuf;
use clap::Parser;
use color_eyre::{eyre::eyre, Report, Result};
use indoc::indoc;

mod backend;
mod command_run;
mod config;
mod discover;
mod errors;
mod guestfs;
mod naming;
mod pipeline;
mod rules;
mod virsh;
mod xml_utils;

use config::Config;
use naming::NamingPolicy;
use pipeline::Backends;
use virsh::HostTools;

const EXAMPLES: &str = indoc! {"
    Examples:
      kvm-vm-persistent-net centos7-vm
      kvm-vm-persistent-net --prefix enp centos7-vm
      kvm-vm-persistent-net --start-index 1 ubuntu-vm
      kvm-vm-persistent-net --dry-run debian-vm
"};

/// Set persistent network interface names for KVM VMs.
///
/// Generates udev rules that bind each NIC's MAC address to a fixed name and
/// copies them into /etc/udev/rules.d/ of a shut-off libvirt domain.
#[derive(Parser, Debug)]
#[command(version, after_help = EXAMPLES)]
struct Cli {
    /// Name of the libvirt domain; it must be shut off
    vm_name: String,

    /// Show the rules file contents without copying to VM
    #[clap(long)]
    dry_run: bool,

    /// Interface name prefix
    #[clap(long, default_value = naming::DEFAULT_PREFIX)]
    prefix: String,

    /// Starting index for interface numbering
    #[clap(long, default_value_t = 0)]
    start_index: u32,

    /// Filename for the udev rules
    #[clap(long, default_value = rules::DEFAULT_RULE_NAME)]
    rule_name: String,

    /// Display verbose output
    #[clap(short, long)]
    verbose: bool,

    /// Hypervisor connection URI (e.g., qemu:///system)
    #[clap(short = 'c', long = "connect")]
    connect: Option<String>,

    /// Run virsh and virt-copy-in through sudo
    #[clap(long)]
    sudo: bool,
}

impl Cli {
    fn into_config(self, tools: &HostTools) -> Result<Config> {
        let work_dir = Utf8PathBuf::try_from(std::env::temp_dir())
            .map_err(|e| eyre!("Temporary directory is not valid UTF-8: {}", e))?;
        let config = Config {
            start_hint: tools.start_hint(&self.vm_name),
            vm_name: self.vm_name,
            policy: NamingPolicy {
                prefix: self.prefix,
                start_index: self.start_index,
            },
            rule_name: self.rule_name,
            dry_run: self.dry_run,
            verbose: self.verbose,
            work_dir,
        };
        config.validate()?;
        Ok(config)
    }
}

/// Install and configure the tracing/logging system.
///
/// Logs go to stderr, filtered by RUST_LOG (default 'info'), so they never
/// mix with the rules preview on stdout.
fn install_tracing() {
    use tracing_error::ErrorLayer;
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let format = fmt::format().without_time().with_target(false).compact();

    let fmt_layer = fmt::layer()
        .event_format(format)
        .with_writer(std::io::stderr);
    let filter_layer =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .with(ErrorLayer::default())
        .init();
}

fn main() -> Result<(), Report> {
    install_tracing();
    color_eyre::install()?;

    let cli = Cli::parse();
    let tools = HostTools {
        connect: cli.connect.clone(),
        sudo: cli.sudo,
    };
    let config = cli.into_config(&tools)?;

    let backends = Backends {
        status: &tools,
        description: &tools,
        delivery: &tools,
    };
    let outcome = pipeline::run(config, &backends, &mut std::io::stdout().lock())?;
    tracing::debug!("finished: {outcome:?}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_debug_assert() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["kvm-vm-persistent-net", "centos7-vm"]).unwrap();
        assert_eq!(cli.vm_name, "centos7-vm");
        assert_eq!(cli.prefix, "eth");
        assert_eq!(cli.start_index, 0);
        assert_eq!(cli.rule_name, "70-persistent-net.rules");
        assert!(!cli.dry_run && !cli.verbose && !cli.sudo);
        assert!(cli.connect.is_none());
    }

    #[test]
    fn test_flags() {
        let cli = Cli::try_parse_from([
            "kvm-vm-persistent-net",
            "--prefix",
            "enp",
            "--start-index",
            "1",
            "--dry-run",
            "--verbose",
            "-c",
            "qemu:///system",
            "centos7-vm",
        ])
        .unwrap();
        assert_eq!(cli.prefix, "enp");
        assert_eq!(cli.start_index, 1);
        assert!(cli.dry_run && cli.verbose);
        assert_eq!(cli.connect.as_deref(), Some("qemu:///system"));
    }

    #[test]
    fn test_positional_count() {
        assert!(Cli::try_parse_from(["kvm-vm-persistent-net"]).is_err());
        assert!(Cli::try_parse_from(["kvm-vm-persistent-net", "a", "b"]).is_err());
    }

    #[test]
    fn test_negative_start_index_rejected() {
        assert!(
            Cli::try_parse_from(["kvm-vm-persistent-net", "--start-index", "-1", "vm"]).is_err()
        );
    }

    #[test]
    fn test_help_is_not_a_failure() {
        let err = Cli::try_parse_from(["kvm-vm-persistent-net", "--help"]).unwrap_err();
        assert_eq!(err.exit_code(), 0);
        assert!(err.to_string().contains("kvm-vm-persistent-net --dry-run debian-vm"));
    }

    #[test]
    fn test_into_config_validates() {
        let cli = Cli::try_parse_from([
            "kvm-vm-persistent-net",
            "--rule-name",
            "../evil.rules",
            "vm",
        ])
        .unwrap();
        let err = cli.into_config(&HostTools::default()).unwrap_err();
        assert!(err.to_string().contains("must be a plain file name"));
    }
}
