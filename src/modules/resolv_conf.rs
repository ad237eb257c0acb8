//! Resolver override module
//!
//! Writes a systemd-resolved drop-in instead of touching `/etc/resolv.conf`.

use crate::RdInitError;
use crate::config::ResolvConfConfig;
use crate::paths::Paths;
use crate::systemd::unit::{RenderedFile, UnitFile};
use tracing::info;

/// Drop-in content for `config`
pub fn render_dropin(config: &ResolvConfConfig) -> String {
    let mut dropin = UnitFile::new();
    dropin.set("Resolve", "DNS", config.nameservers.join(" "));
    dropin.render()
}

/// Write the resolver drop-in; resolved reads it without a restart
pub async fn configure_resolv_conf(
    paths: &Paths,
    config: &ResolvConfConfig,
) -> Result<(), RdInitError> {
    info!(nameservers = ?config.nameservers, "Updating name servers");
    RenderedFile::new(paths.resolved_dropin(), render_dropin(config))
        .write()
        .await
}
