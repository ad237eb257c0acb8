//! External program execution

use crate::RdInitError;
use crate::systemd::notify::NOTIFY_SOCKET_ENV;
use std::process::Output;
use tracing::debug;

/// Run a program to completion, capturing its output
///
/// `NOTIFY_SOCKET` is stripped from the child environment so that only
/// rd-init itself can report readiness to the service manager.
pub(crate) async fn run(program: &str, args: &[&str]) -> Result<Output, RdInitError> {
    debug!(program, ?args, "Running command");

    tokio::process::Command::new(program)
        .args(args)
        .env_remove(NOTIFY_SOCKET_ENV)
        .output()
        .await
        .map_err(|e| RdInitError::os(format!("failed to execute {}", program), e))
}

/// Run a program and fail if it exits non-zero
pub(crate) async fn run_checked(program: &str, args: &[&str]) -> Result<Output, RdInitError> {
    let output = run(program, args).await?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(RdInitError::command(
            format!("{} {}", program, args.join(" ")),
            format!("{} ({})", stderr.trim(), output.status),
        ));
    }

    Ok(output)
}
