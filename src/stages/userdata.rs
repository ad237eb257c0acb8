//! User data component - applies `user-data`
//!
//! Runs the users, mounts, files and resolver passes in that order. The
//! first failing pass ends the component; later passes are not attempted.

use crate::RdInitError;
use crate::config::CloudConfig;
use crate::datasources::{Document, NoCloud};
use crate::host::Host;
use crate::modules::{mounts, resolv_conf, users, write_files};
use crate::paths::Paths;
use tracing::{debug, info};

/// Apply the cloud-config; returns the mount units to start
pub async fn run(
    host: &dyn Host,
    paths: &Paths,
    source: &NoCloud,
) -> Result<Vec<String>, RdInitError> {
    let content = source.read(Document::UserData).await?;
    let config = CloudConfig::from_yaml(&content)?;
    info!(
        users = config.users.len(),
        mounts = config.mounts.len(),
        files = config.write_files.len(),
        "Applying user data"
    );

    users::create_users(host, paths, &config.users).await?;
    let units = mounts::configure_mounts(paths, &config.mounts).await?;
    write_files::write_files(host, &config.write_files).await?;

    if config.manage_resolv_conf {
        resolv_conf::configure_resolv_conf(paths, &config.resolv_conf).await?;
    } else {
        debug!("manage_resolv_conf not set; leaving resolver alone");
    }

    Ok(units)
}
