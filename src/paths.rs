//! Standard rd-init paths
//!
//! Every location rd-init reads from or writes to lives here, so tests can
//! re-root the whole tree under a temporary directory.

use std::path::{Path, PathBuf};

/// Mount point of the NoCloud seed volume
pub const SEED_DIR: &str = "/mnt/lima-cidata";

/// Runtime directory for systemd-networkd `.link` and `.network` files
pub const NETWORK_DIR: &str = "/run/systemd/network";

/// Runtime directory for generated systemd units
pub const SYSTEM_UNIT_DIR: &str = "/run/systemd/system";

/// sudo drop-in directory
pub const SUDOERS_DIR: &str = "/etc/sudoers.d";

/// systemd-resolved runtime drop-in directory
pub const RESOLVED_DROPIN_DIR: &str = "/run/systemd/resolved.conf.d";

/// Standard rd-init paths
#[derive(Debug, Clone)]
pub struct Paths {
    /// Seed volume holding meta-data, user-data and network-config
    pub seed: PathBuf,
    /// Output directory for link and network descriptors
    pub network: PathBuf,
    /// Output directory for mount units
    pub units: PathBuf,
    /// Output directory for sudoers fragments
    pub sudoers: PathBuf,
    /// Output directory for the resolver drop-in
    pub resolved: PathBuf,
}

impl Default for Paths {
    fn default() -> Self {
        Self::new()
    }
}

impl Paths {
    /// Create with the live system paths
    pub fn new() -> Self {
        Self {
            seed: PathBuf::from(SEED_DIR),
            network: PathBuf::from(NETWORK_DIR),
            units: PathBuf::from(SYSTEM_UNIT_DIR),
            sudoers: PathBuf::from(SUDOERS_DIR),
            resolved: PathBuf::from(RESOLVED_DROPIN_DIR),
        }
    }

    /// Re-root every location under `root` (useful for testing)
    pub fn with_root(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        let under = |p: &str| root.join(p.trim_start_matches('/'));
        Self {
            seed: under(SEED_DIR),
            network: under(NETWORK_DIR),
            units: under(SYSTEM_UNIT_DIR),
            sudoers: under(SUDOERS_DIR),
            resolved: under(RESOLVED_DROPIN_DIR),
        }
    }

    /// Replace the seed directory, keeping the output locations
    pub fn with_seed_dir(mut self, seed: impl AsRef<Path>) -> Self {
        self.seed = seed.as_ref().to_path_buf();
        self
    }

    // ==================== Generated Files ====================

    /// /run/systemd/network/10-<iface>.link
    pub fn link_file(&self, interface: &str) -> PathBuf {
        self.network.join(format!("10-{}.link", interface))
    }

    /// /run/systemd/network/<iface>.network
    pub fn network_file(&self, interface: &str) -> PathBuf {
        self.network.join(format!("{}.network", interface))
    }

    /// /run/systemd/system/<unit>
    pub fn unit_file(&self, unit: &str) -> PathBuf {
        self.units.join(unit)
    }

    /// /etc/sudoers.d/90-rd-init-<user>
    ///
    /// sudo skips `#includedir` entries containing `.`, so dots in the user
    /// name become `_`.
    pub fn sudoers_file(&self, user: &str) -> PathBuf {
        self.sudoers
            .join(format!("90-rd-init-{}", user.replace('.', "_")))
    }

    /// /run/systemd/resolved.conf.d/10-rd-init.conf
    pub fn resolved_dropin(&self) -> PathBuf {
        self.resolved.join("10-rd-init.conf")
    }
}
