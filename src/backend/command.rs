//! Time-bounded child processes
//!
//! Children are spawned with `kill_on_drop`, so a timed-out call never leaves
//! a stray process behind.

use std::ffi::OsStr;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tokio::time::timeout;

use crate::error::BackendError;

fn command<I, S>(program: &'static str, args: I) -> Command
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true);
    cmd
}

/// Run to completion within `limit`, discarding output
pub async fn run_bounded<I, S>(
    program: &'static str,
    args: I,
    envs: &[(&str, &str)],
    limit: Duration,
) -> Result<(), BackendError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut cmd = command(program, args);
    cmd.stdout(Stdio::null());
    for (key, value) in envs {
        cmd.env(key, value);
    }

    let mut child = cmd.spawn().map_err(|e| BackendError::spawn(program, e))?;

    match timeout(limit, child.wait()).await {
        Ok(Ok(status)) if status.success() => Ok(()),
        Ok(Ok(status)) => Err(BackendError::Failed { program, status }),
        Ok(Err(source)) => Err(BackendError::Spawn { program, source }),
        Err(_) => {
            let _ = child.start_kill();
            Err(BackendError::TimedOut { program, limit })
        }
    }
}

/// Run within `limit` and return stdout on success
pub async fn capture_bounded<I, S>(
    program: &'static str,
    args: I,
    limit: Duration,
) -> Result<String, BackendError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut cmd = command(program, args);
    cmd.stdout(Stdio::piped());

    let child = cmd.spawn().map_err(|e| BackendError::spawn(program, e))?;

    // Dropping the future on timeout drops the child, which kills it
    let output = timeout(limit, child.wait_with_output())
        .await
        .map_err(|_| BackendError::TimedOut { program, limit })?
        .map_err(|source| BackendError::Spawn { program, source })?;

    if !output.status.success() {
        return Err(BackendError::Failed {
            program,
            status: output.status,
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_program_is_not_found() {
        let result = run_bounded(
            "retro-sfx-definitely-missing-binary",
            ["--help"],
            &[],
            Duration::from_secs(1),
        )
        .await;
        assert!(matches!(result, Err(BackendError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_capture_missing_program_is_not_found() {
        let result = capture_bounded(
            "retro-sfx-definitely-missing-binary",
            Vec::<String>::new(),
            Duration::from_secs(1),
        )
        .await;
        assert!(matches!(result, Err(BackendError::NotFound { .. })));
    }
}
