//! sd_notify(3) readiness protocol

use crate::RdInitError;
use std::ffi::OsStr;
use std::os::unix::net::{SocketAddr, UnixDatagram};
use tracing::debug;

/// Environment variable systemd uses to pass the notification socket
pub const NOTIFY_SOCKET_ENV: &str = "NOTIFY_SOCKET";

/// Tell the service manager that startup is complete
///
/// Returns `Ok(false)` when no notification socket was provided (rd-init is
/// not running under a `Type=notify` unit).
pub fn notify_ready() -> Result<bool, RdInitError> {
    notify_ready_to(std::env::var_os(NOTIFY_SOCKET_ENV).as_deref())
}

/// [`notify_ready`] against an explicit socket; `None` is a no-op
pub fn notify_ready_to(socket: Option<&OsStr>) -> Result<bool, RdInitError> {
    match socket {
        Some(socket) => {
            notify(socket, "READY=1\nSTATUS=Provisioning complete")?;
            Ok(true)
        }
        None => {
            debug!("{} not set, skipping readiness notification", NOTIFY_SOCKET_ENV);
            Ok(false)
        }
    }
}

/// Send a state string to the given notification socket
///
/// Socket names starting with `@` refer to the Linux abstract namespace.
pub fn notify(socket: &OsStr, state: &str) -> Result<(), RdInitError> {
    let addr = socket_addr(socket)?;
    let fail = |e: std::io::Error| {
        RdInitError::ControlPlane(format!(
            "failed to notify {}: {}",
            socket.to_string_lossy(),
            e
        ))
    };

    let sock = UnixDatagram::unbound().map_err(fail)?;
    sock.send_to_addr(state.as_bytes(), &addr).map_err(fail)?;
    debug!(socket = %socket.to_string_lossy(), state, "Sent notification");
    Ok(())
}

fn socket_addr(socket: &OsStr) -> Result<SocketAddr, RdInitError> {
    use std::os::unix::ffi::OsStrExt;

    let bytes = socket.as_bytes();
    let result = match bytes.first() {
        Some(b'@') => {
            use std::os::linux::net::SocketAddrExt;
            SocketAddr::from_abstract_name(&bytes[1..])
        }
        Some(b'/') => SocketAddr::from_pathname(socket),
        _ => {
            return Err(RdInitError::ControlPlane(format!(
                "unsupported notification socket {:?}",
                socket
            )));
        }
    };

    result.map_err(|e| {
        RdInitError::ControlPlane(format!(
            "invalid notification socket {:?}: {}",
            socket, e
        ))
    })
}
