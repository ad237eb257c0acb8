//! Integration tests for the user-data component using tempfile

use rd_init::Paths;
use rd_init::RdInitError;
use rd_init::host::mock::MockHost;
use rd_init::stages::Component;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use tempfile::TempDir;

fn seed(paths: &Paths, user_data: &str) {
    fs::create_dir_all(&paths.seed).unwrap();
    fs::write(paths.seed.join("user-data"), user_data).unwrap();
}

fn mode(path: &Path) -> u32 {
    fs::metadata(path).unwrap().permissions().mode() & 0o7777
}

/// Full Lima-style user-data
#[tokio::test]
async fn test_userdata_end_to_end() {
    let temp_dir = TempDir::new().unwrap();
    let paths = Paths::with_root(temp_dir.path());
    let home = temp_dir.path().join("home/alice.linux");
    let script = temp_dir.path().join("var/lib/boot.sh");

    seed(
        &paths,
        &format!(
            r#"#cloud-config
users:
  - name: alice
    uid: "501"
    homedir: {home}
    shell: /bin/bash
    sudo: ALL=(ALL) NOPASSWD:ALL
    lock_passwd: true
    ssh_authorized_keys:
      - ssh-ed25519 AAAA first
    ssh-authorized-keys:
      - ssh-rsa BBBB second
mounts:
  - [tmpfs, /mnt/data, tmpfs, size=100m]
  - [mount0, /Users/alice]
write_files:
  - path: {script}
    content: |
      #!/bin/sh
      echo boot
    owner: alice:alice
    permissions: '0755'
manage_resolv_conf: true
resolv_conf:
  nameservers: [192.168.5.3, 1.1.1.1]
"#,
            home = home.display(),
            script = script.display(),
        ),
    );

    let host = MockHost::new().with_user("root", 0, 0, "/root");
    let units = Component::UserData.run(&host, &paths).await.unwrap();

    assert_eq!(units, vec!["mnt-data.mount", "Users-alice.mount"]);
    assert_eq!(host.created_users().await, vec!["alice"]);

    // Keys: underscore spelling first, then the hyphenated one
    let keys = home.join(".ssh/authorized_keys");
    assert_eq!(
        fs::read_to_string(&keys).unwrap(),
        "ssh-ed25519 AAAA first\nssh-rsa BBBB second\n"
    );
    assert_eq!(mode(&keys), 0o600);
    assert_eq!(mode(&home.join(".ssh")), 0o700);

    let sudoers = paths.sudoers_file("alice");
    assert_eq!(
        fs::read_to_string(&sudoers).unwrap(),
        "alice ALL=(ALL) NOPASSWD:ALL\n"
    );
    assert_eq!(mode(&sudoers), 0o440);

    let mount = fs::read_to_string(paths.unit_file("mnt-data.mount")).unwrap();
    assert!(mount.starts_with("[Unit]\nAfter=local-fs.target\n"));
    assert!(mount.contains("[Install]\nWantedBy=default.target\n"));
    assert!(mount.contains("What=tmpfs\nWhere=/mnt/data\nType=tmpfs\nOptions=size=100m\n"));

    assert_eq!(mode(&script), 0o755);
    let chowns = host.chowns().await;
    let script_chown = chowns.iter().find(|c| c.path == script).unwrap();
    assert_eq!(script_chown.uid, Some(501));
    assert_eq!(script_chown.gid, Some(501));

    assert_eq!(
        fs::read_to_string(paths.resolved_dropin()).unwrap(),
        "[Resolve]\nDNS=192.168.5.3 1.1.1.1\n"
    );
}

/// An unknown file owner stops the run before the resolver override
#[tokio::test]
async fn test_unknown_owner_stops_before_dns() {
    let temp_dir = TempDir::new().unwrap();
    let paths = Paths::with_root(temp_dir.path());
    let target = temp_dir.path().join("etc/motd");

    seed(
        &paths,
        &format!(
            "write_files:\n  - path: {}\n    content: hi\n    owner: ghost\nmanage_resolv_conf: true\nresolv_conf:\n  nameservers: [10.0.0.1]\n",
            target.display()
        ),
    );

    let host = MockHost::new().with_user("root", 0, 0, "/root");
    let err = Component::UserData.run(&host, &paths).await.unwrap_err();

    assert!(matches!(err, RdInitError::UserGroup(_)));
    assert!(!target.exists());
    assert!(!paths.resolved_dropin().exists());
}

/// A too-short mount entry is a validation error
#[tokio::test]
async fn test_short_mount_entry() {
    let temp_dir = TempDir::new().unwrap();
    let paths = Paths::with_root(temp_dir.path());
    seed(&paths, "mounts:\n  - [tmpfs]\n");

    let host = MockHost::new();
    let err = Component::UserData.run(&host, &paths).await.unwrap_err();
    assert!(matches!(err, RdInitError::Validation(_)));
    assert!(err.to_string().contains("mount #0 is too short"));
}

/// Without manage_resolv_conf no drop-in is written
#[tokio::test]
async fn test_no_resolver_override() {
    let temp_dir = TempDir::new().unwrap();
    let paths = Paths::with_root(temp_dir.path());
    seed(
        &paths,
        "#cloud-config\nresolv_conf:\n  nameservers: [10.0.0.1]\n",
    );

    let host = MockHost::new();
    let units = Component::UserData.run(&host, &paths).await.unwrap();
    assert!(units.is_empty());
    assert!(!paths.resolved_dropin().exists());
}

/// Missing user-data is a read error naming the file
#[tokio::test]
async fn test_missing_user_data() {
    let temp_dir = TempDir::new().unwrap();
    let paths = Paths::with_root(temp_dir.path());

    let host = MockHost::new();
    let err = Component::UserData.run(&host, &paths).await.unwrap_err();
    assert!(matches!(err, RdInitError::Read { .. }));
    assert!(err.to_string().contains("user-data"));
}
