//! Metadata component - applies `meta-data`

use crate::RdInitError;
use crate::datasources::{Document, NoCloud};
use crate::host::Host;
use crate::modules::hostname;
use serde::Deserialize;
use tracing::info;

/// Instance metadata
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InstanceMetadata {
    #[serde(rename = "local-hostname", default)]
    pub local_hostname: String,
}

/// Set the host name; never needs a unit restart
pub async fn run(host: &dyn Host, source: &NoCloud) -> Result<Vec<String>, RdInitError> {
    let metadata: InstanceMetadata = source.load(Document::MetaData).await?;
    info!(hostname = %metadata.local_hostname, "Applying instance metadata");

    hostname::set_hostname(host, &metadata.local_hostname).await?;
    Ok(Vec::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::mock::MockHost;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_sets_hostname() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(
            temp_dir.path().join("meta-data"),
            "instance-id: iid-1\nlocal-hostname: lima-rancher-desktop\n",
        )
        .unwrap();
        let host = MockHost::new();

        let units = run(&host, &NoCloud::new(temp_dir.path())).await.unwrap();
        assert!(units.is_empty());
        assert_eq!(host.hostname().await.as_deref(), Some("lima-rancher-desktop"));
    }

    #[tokio::test]
    async fn test_missing_document() {
        let temp_dir = TempDir::new().unwrap();
        let host = MockHost::new();

        let err = run(&host, &NoCloud::new(temp_dir.path())).await.unwrap_err();
        assert!(matches!(err, RdInitError::Read { .. }));
    }

    #[tokio::test]
    async fn test_missing_hostname() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("meta-data"), "instance-id: iid-1\n").unwrap();
        let host = MockHost::new();

        let err = run(&host, &NoCloud::new(temp_dir.path())).await.unwrap_err();
        assert!(matches!(err, RdInitError::Validation(_)));
        assert_eq!(host.hostname().await, None);
    }

    #[tokio::test]
    async fn test_syscall_failure() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("meta-data"), "local-hostname: vm\n").unwrap();
        let host = MockHost::new().with_hostname_error("EPERM");

        let err = run(&host, &NoCloud::new(temp_dir.path())).await.unwrap_err();
        assert!(matches!(err, RdInitError::Os { .. }));
    }
}
