//! Run one invocation end to end
//!
//! Status check, discovery, naming, rendering, then either preview or
//! delivery. Once the rule artifact exists it is removed on every path out
//! of [`run`], including delivery failure.

use std::io::Write;

use tracing::debug;

use crate::backend::{
    DomainDescriptionSource, DomainState, DomainStatusQuery, GuestDelivery, GUEST_RULES_DIR,
};
use crate::config::Config;
use crate::errors::{PersistNetError, VmStateError};
use crate::rules::{RuleArtifact, RuleSet};
use crate::{discover, naming};

const SEPARATOR: &str = "----------------------------------------";

/// Progress through one invocation, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "kebab-case")]
enum Stage {
    StatusChecked,
    Discovered,
    Mapped,
    Rendered,
}

/// How a successful invocation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Previewed,
    Delivered,
}

/// The external capabilities used by [`run`].
pub struct Backends<'a> {
    pub status: &'a dyn DomainStatusQuery,
    pub description: &'a dyn DomainDescriptionSource,
    pub delivery: &'a dyn GuestDelivery,
}

fn enter(stage: Stage, vm_name: &str) {
    debug!("{vm_name}: {stage}");
}

fn say(out: &mut dyn Write, args: std::fmt::Arguments<'_>) -> Result<(), PersistNetError> {
    out.write_fmt(args)
        .and_then(|()| out.write_all(b"\n"))
        .map_err(PersistNetError::Output)
}

/// Execute the pipeline, writing user-facing output to `out`.
pub fn run(
    config: Config,
    backends: &Backends<'_>,
    out: &mut dyn Write,
) -> Result<Outcome, PersistNetError> {
    let vm = config.vm_name.as_str();

    if config.verbose {
        say(out, format_args!("Processing VM: {vm}"))?;
    }
    match backends.status.domain_state(vm)? {
        DomainState::ShutOff => {}
        DomainState::Running => return Err(VmStateError::RunningNotShutOff(vm.to_owned()).into()),
        DomainState::NotFound => return Err(VmStateError::NotFound(vm.to_owned()).into()),
    }
    enter(Stage::StatusChecked, vm);

    let devices = discover::discover(backends.description, vm)?;
    enter(Stage::Discovered, vm);
    if config.verbose {
        say(out, format_args!("Found {} network interfaces", devices.len()))?;
    }

    let bindings = naming::assign(&devices, &config.policy);
    enter(Stage::Mapped, vm);

    let text = RuleSet::new(vm, bindings).render();
    let artifact = RuleArtifact::create(&config.work_dir, &config.rule_name, &text)?;
    enter(Stage::Rendered, vm);

    let result = finish(&config, backends, out, &artifact, &text);
    artifact.cleanup();
    result
}

fn finish(
    config: &Config,
    backends: &Backends<'_>,
    out: &mut dyn Write,
    artifact: &RuleArtifact,
    text: &str,
) -> Result<Outcome, PersistNetError> {
    let vm = config.vm_name.as_str();
    if config.verbose {
        say(out, format_args!("Wrote rules to {}", artifact.path()))?;
    }

    say(out, format_args!("Generated udev rules:"))?;
    say(out, format_args!("{SEPARATOR}"))?;
    say(out, format_args!("{text}"))?;
    say(out, format_args!("{SEPARATOR}"))?;

    if config.dry_run {
        say(out, format_args!("Dry run completed. Rules file not copied to VM."))?;
        return Ok(Outcome::Previewed);
    }

    if config.verbose {
        say(
            out,
            format_args!("Copying {} into {vm}:{GUEST_RULES_DIR}", config.rule_name),
        )?;
    }
    backends
        .delivery
        .deliver(artifact.path(), vm, &config.rule_name)?;

    say(
        out,
        format_args!("Successfully configured network interfaces for VM '{vm}'"),
    )?;
    say(out, format_args!("Start the VM with: {}", config.start_hint))?;
    Ok(Outcome::Delivered)
}
