//! Network configuration renderers
//!
//! Converts NetworkConfig to systemd-networkd descriptor files and writes
//! them to the runtime network directory.

pub mod networkd;

use crate::RdInitError;
use crate::network::NetworkConfig;
use crate::paths::Paths;
use tracing::{debug, info};

/// Service that must be restarted to pick up new `.network` files
pub const NETWORKD_SERVICE: &str = "systemd-networkd.service";

/// Render and write the network configuration
///
/// Returns the units that need a restart: `systemd-networkd.service` when at
/// least one file was written, nothing otherwise. Rendering finishes before
/// the first write, so an invalid interface leaves the filesystem untouched.
/// Renamed links only take effect once udev re-runs; that is the caller's
/// job.
pub async fn apply_network_config(
    config: &NetworkConfig,
    paths: &Paths,
) -> Result<Vec<String>, RdInitError> {
    let renderer = networkd::NetworkdRenderer::new(paths);
    let files = renderer.render(config)?;

    if files.is_empty() {
        debug!("No network descriptors to write");
        return Ok(Vec::new());
    }

    for file in &files {
        info!(path = %file.path.display(), "Writing network descriptor");
        file.write().await?;
    }

    info!("Wrote {} network configuration files", files.len());
    Ok(vec![NETWORKD_SERVICE.to_string()])
}
