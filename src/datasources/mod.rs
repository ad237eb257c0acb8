//! Datasources for the seed documents
//!
//! rd-init only ever reads a locally attached NoCloud volume; there is no
//! network metadata service to probe.

pub mod nocloud;

pub use nocloud::NoCloud;

/// The three documents carried on the seed volume
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Document {
    /// Instance metadata (`local-hostname`)
    MetaData,
    /// Cloud-config directives (users, mounts, write_files, resolv_conf)
    UserData,
    /// Netplan-style v2 network topology
    NetworkConfig,
}

impl Document {
    /// File name of this document on the seed volume
    pub fn file_name(&self) -> &'static str {
        match self {
            Document::MetaData => "meta-data",
            Document::UserData => "user-data",
            Document::NetworkConfig => "network-config",
        }
    }
}

impl std::fmt::Display for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.file_name())
    }
}
