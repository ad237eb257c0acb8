//! Integration tests for the network-config component using tempfile

use rd_init::Paths;
use rd_init::RdInitError;
use rd_init::host::mock::MockHost;
use rd_init::network::render::NETWORKD_SERVICE;
use rd_init::stages::Component;
use std::fs;
use tempfile::TempDir;

fn seed(paths: &Paths, network_config: &str) {
    fs::create_dir_all(&paths.seed).unwrap();
    fs::write(paths.seed.join("network-config"), network_config).unwrap();
}

/// Lima network-config with a renamed interface
#[tokio::test]
async fn test_network_end_to_end() {
    let temp_dir = TempDir::new().unwrap();
    let paths = Paths::with_root(temp_dir.path());
    seed(
        &paths,
        r#"version: 2
ethernets:
  eth0:
    match:
      macaddress: "52:55:55:12:34:56"
    dhcp4: true
    dhcp4-overrides:
      route-metric: 100
    dhcp-identifier: mac
    nameservers:
      addresses: [192.168.5.3]
  lima0:
    match:
      macaddress: "52:55:55:ab:cd:ef"
    set-name: lima0
    dhcp4: true
"#,
    );

    let units = Component::Network
        .run(&MockHost::new(), &paths)
        .await
        .unwrap();
    assert_eq!(units, vec![NETWORKD_SERVICE]);

    let eth0 = fs::read_to_string(paths.network_file("eth0")).unwrap();
    assert_eq!(
        eth0,
        "[Match]\nMACAddress=52:55:55:12:34:56\n\n\
         [Network]\nDHCP=ipv4\nDNS=192.168.5.3\n\n\
         [DHCPv4]\nRouteMetric=100\nClientIdentifier=mac\n"
    );
    assert!(!paths.link_file("eth0").exists());

    let link = fs::read_to_string(paths.link_file("lima0")).unwrap();
    assert_eq!(
        link,
        "[Match]\nMACAddress=52:55:55:ab:cd:ef\n\n[Link]\nNamePolicy=\nName=lima0\n"
    );
    assert!(paths.network_file("lima0").exists());
}

/// Interfaces with nothing to configure produce no files and no restart
#[tokio::test]
async fn test_nothing_to_configure() {
    let temp_dir = TempDir::new().unwrap();
    let paths = Paths::with_root(temp_dir.path());
    seed(&paths, "version: 2\nethernets:\n  eth0: {}\n");

    let units = Component::Network
        .run(&MockHost::new(), &paths)
        .await
        .unwrap();
    assert!(units.is_empty());
    assert!(!paths.network.exists());
}

/// A rename without a match is rejected and nothing is written
#[tokio::test]
async fn test_rename_without_match() {
    let temp_dir = TempDir::new().unwrap();
    let paths = Paths::with_root(temp_dir.path());
    seed(
        &paths,
        "version: 2\nethernets:\n  eth0:\n    dhcp4: true\n  eth1:\n    set-name: lan1\n",
    );

    let err = Component::Network
        .run(&MockHost::new(), &paths)
        .await
        .unwrap_err();
    assert!(matches!(err, RdInitError::Validation(_)));
    assert!(!paths.network.exists());
}
