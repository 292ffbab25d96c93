//! Host shell commands
//!
//! `path_readlink` with the [`fd::SHELL`](super::abi::fd::SHELL) sentinel does
//! not resolve a symlink. Its path is a command line for the host shell, and
//! the command's exit status is the syscall's return value.

use super::abi::ABNORMAL_EXIT;
use super::error::HostResult;
use std::process::{Command, ExitStatus};

#[cfg(unix)]
fn shell(command: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command);
    cmd
}

#[cfg(windows)]
fn shell(command: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").arg(command);
    cmd
}

/// Map a finished child to the status handed back to the guest
pub fn exit_status(status: ExitStatus) -> i32 {
    status.code().unwrap_or(ABNORMAL_EXIT)
}

/// Run `command` through the host shell and wait for it.
///
/// Standard streams are inherited. Fails only if the shell cannot be spawned.
pub fn run_command(command: &str) -> HostResult<i32> {
    log::info!("running host command: {}", command);
    let status = shell(command).status()?;
    let code = exit_status(status);
    log::debug!("host command finished with status {}", code);
    Ok(code)
}
