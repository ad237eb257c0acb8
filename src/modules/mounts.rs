//! Mount unit generation module

use crate::RdInitError;
use crate::config::MountConfig;
use crate::paths::Paths;
use crate::systemd::unit::{RenderedFile, UnitFile, mount_unit_name};
use tracing::info;

/// Build the `.mount` unit for one entry
pub fn render_mount_unit(mount: &MountConfig) -> UnitFile {
    let mut unit = UnitFile::new();
    unit.set("Unit", "After", "local-fs.target")
        .set("Install", "WantedBy", "default.target")
        .set("Mount", "What", &mount.what)
        .set("Mount", "Where", &mount.mount_point);
    if let Some(fs_type) = &mount.fs_type {
        unit.set("Mount", "Type", fs_type);
    }
    if let Some(options) = &mount.options {
        unit.set("Mount", "Options", options);
    }
    unit
}

/// Write one mount unit per entry and return the unit names to start
pub async fn configure_mounts(
    paths: &Paths,
    entries: &[Vec<String>],
) -> Result<Vec<String>, RdInitError> {
    let mounts = entries
        .iter()
        .enumerate()
        .map(|(index, entry)| MountConfig::from_entry(index, entry))
        .collect::<Result<Vec<_>, _>>()?;

    let mut units = Vec::with_capacity(mounts.len());
    for mount in &mounts {
        info!(what = %mount.what, mount_point = %mount.mount_point, "Creating mount");

        let name = mount_unit_name(&mount.mount_point);
        RenderedFile::new(paths.unit_file(&name), render_mount_unit(mount).render())
            .write()
            .await?;
        units.push(name);
    }

    Ok(units)
}
