//! Per-invocation configuration, built once from the command line

use camino::Utf8PathBuf;

use crate::errors::PersistNetError;
use crate::naming::NamingPolicy;

/// Everything the pipeline needs, passed by value into [`crate::pipeline::run`].
#[derive(Debug, Clone)]
pub struct Config {
    pub vm_name: String,
    pub policy: NamingPolicy,
    pub rule_name: String,
    pub dry_run: bool,
    pub verbose: bool,
    /// Parent directory for the transient rules artifact
    pub work_dir: Utf8PathBuf,
    /// How to tell the user to boot the VM afterwards
    pub start_hint: String,
}

impl Config {
    /// Reject values that would corrupt the rule syntax or escape the guest
    /// rules directory.
    pub fn validate(&self) -> Result<(), PersistNetError> {
        let usage = |msg: String| Err(PersistNetError::Usage(msg));

        if self.vm_name.trim().is_empty() {
            return usage("VM name is required".into());
        }
        let prefix = &self.policy.prefix;
        if prefix.is_empty() {
            return usage("--prefix must not be empty".into());
        }
        if prefix.chars().any(|c| c.is_whitespace() || c == '"' || c == '/') {
            return usage(format!(
                "--prefix '{prefix}' must not contain whitespace, quotes or slashes"
            ));
        }
        let rule_name = &self.rule_name;
        if rule_name.is_empty() || rule_name == "." || rule_name == ".." || rule_name.contains('/')
        {
            return usage(format!("--rule-name '{rule_name}' must be a plain file name"));
        }
        Ok(())
    }
}
