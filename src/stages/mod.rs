//! Provisioning components
//!
//! Each component reads one seed document, applies it and reports the
//! systemd units that must be (re)started afterwards:
//! 1. Metadata - host name
//! 2. User data - users, mounts, files, resolver override
//! 3. Network - systemd-networkd descriptors

pub mod metadata;
pub mod network;
pub mod userdata;

use crate::RdInitError;
use crate::datasources::NoCloud;
use crate::host::Host;
use crate::paths::Paths;

/// A document-processing component
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    /// Applies `meta-data`
    Metadata,
    /// Applies `user-data`
    UserData,
    /// Applies `network-config`
    Network,
}

impl Component {
    /// Every component, in the order they run
    pub const ALL: [Component; 3] = [Component::Metadata, Component::UserData, Component::Network];

    /// Apply this component's document and return the units it affects
    pub async fn run(&self, host: &dyn Host, paths: &Paths) -> Result<Vec<String>, RdInitError> {
        let source = NoCloud::new(&paths.seed);
        match self {
            Component::Metadata => metadata::run(host, &source).await,
            Component::UserData => userdata::run(host, paths, &source).await,
            Component::Network => network::run(paths, &source).await,
        }
    }
}

impl std::fmt::Display for Component {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Component::Metadata => write!(f, "metadata"),
            Component::UserData => write!(f, "userdata"),
            Component::Network => write!(f, "network"),
        }
    }
}
