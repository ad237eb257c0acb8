//! Hostname configuration module

use crate::RdInitError;
use crate::host::Host;
use tracing::info;

/// Set the running kernel host name
///
/// Only the kernel name is changed; `/etc/hostname` is left alone.
pub async fn set_hostname(host: &dyn Host, hostname: &str) -> Result<(), RdInitError> {
    let hostname = hostname.trim();
    if hostname.is_empty() {
        return Err(RdInitError::validation("meta-data has no local-hostname"));
    }

    info!(hostname, "Setting host name");
    host.set_hostname(hostname).await
}
