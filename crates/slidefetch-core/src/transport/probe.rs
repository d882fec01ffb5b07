//! Host capability probes.

use std::process::{Command, Stdio};

/// Answers whether an external program can be run on this host.
pub trait HostProbe: Send + Sync {
    fn has_program(&self, program: &str) -> bool;
}

/// Probes the real host by running `<program> --version`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemProbe;

impl HostProbe for SystemProbe {
    fn has_program(&self, program: &str) -> bool {
        let found = Command::new(program)
            .arg("--version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false);
        tracing::debug!(program, found, "probed host program");
        found
    }
}
