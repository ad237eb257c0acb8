//! Network component - applies `network-config`

use crate::RdInitError;
use crate::datasources::{Document, NoCloud};
use crate::network::{NetworkConfig, render};
use crate::paths::Paths;
use tracing::{debug, info};

/// Write networkd descriptors; returns the networkd service if anything changed
pub async fn run(paths: &Paths, source: &NoCloud) -> Result<Vec<String>, RdInitError> {
    let content = source.read(Document::NetworkConfig).await?;
    let config = NetworkConfig::from_yaml(&content)?;

    if !config.has_interfaces() {
        debug!("network-config has no ethernets");
    }
    info!(interfaces = config.ethernets.len(), "Applying network configuration");

    render::apply_network_config(&config, paths).await
}
