//! Process spawning

use std::io;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info};

use crate::{
    child::SpawnedChild,
    config::LaunchSpec,
    error::{ProcessError, Result},
};

/// Spawn the process described by `spec`.
///
/// The child gets a null stdin and piped stdout/stderr; the caller owns
/// both pipes and must keep reading them until the process exits, or the
/// child can block once an unread pipe buffer fills.
pub fn spawn(spec: &LaunchSpec) -> Result<SpawnedChild> {
    spec.validate()?;

    debug!(
        command = %spec.command(),
        args = ?spec.arg_list(),
        key = %spec.key(),
        "Spawning emulator process"
    );

    let mut cmd = Command::new(spec.command());
    cmd.args(spec.arg_list());

    if let Some(dir) = spec.working_dir_path() {
        cmd.current_dir(dir);
    }

    for (key, value) in spec.env_overlay() {
        cmd.env(key, value);
    }

    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let child = cmd.spawn()?;
    let pid = child.id().ok_or_else(|| {
        ProcessError::SpawnFailed(io::Error::new(
            io::ErrorKind::Other,
            "process exited before a pid could be read",
        ))
    })?;

    info!(pid = %pid, key = %spec.key(), command = %spec.command(), "Emulator process spawned");

    Ok(SpawnedChild::new(child, spec.key(), pid))
}
