//! Cloud-config parsing and types
//!
//! Handles the subset of the cloud-config `user-data` document rd-init acts
//! on: users, mounts, write_files and the resolver override.

use serde::{Deserialize, Deserializer, de::Error as _};

use crate::RdInitError;
use crate::datasources::{Document, nocloud::parse_yaml};

/// Main cloud-config structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CloudConfig {
    /// Users to create
    pub users: Vec<UserConfig>,

    /// Mount entries: `[what, where, type?, options?, ...]`
    pub mounts: Vec<Vec<String>>,

    /// Files to write
    pub write_files: Vec<WriteFileConfig>,

    /// Whether to install the resolver override
    pub manage_resolv_conf: bool,

    /// Resolver override
    pub resolv_conf: ResolvConfConfig,
}

/// User configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UserConfig {
    pub name: String,
    #[serde(deserialize_with = "deserialize_uid")]
    pub uid: Option<u32>,
    pub gecos: Option<String>,
    pub homedir: Option<String>,
    pub shell: Option<String>,
    /// Raw sudoers rule, e.g. `ALL=(ALL) NOPASSWD:ALL`
    pub sudo: Option<String>,
    pub lock_passwd: Option<bool>,
    pub ssh_authorized_keys: Vec<String>,
    /// Hyphenated spelling accepted by cloud-init as well
    #[serde(rename = "ssh-authorized-keys")]
    pub ssh_authorized_keys_alt: Vec<String>,
}

impl UserConfig {
    /// All authorized keys: `ssh_authorized_keys` first, then `ssh-authorized-keys`
    pub fn authorized_keys(&self) -> Vec<&str> {
        self.ssh_authorized_keys
            .iter()
            .chain(&self.ssh_authorized_keys_alt)
            .map(String::as_str)
            .collect()
    }

    /// The sudo rule, if one is set; empty and `false` mean no sudo
    pub fn sudo_rule(&self) -> Option<&str> {
        self.sudo
            .as_deref()
            .map(str::trim)
            .filter(|rule| !rule.is_empty() && *rule != "false")
    }
}

/// Accept `uid: 1000` as well as `uid: "1000"`
fn deserialize_uid<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawUid {
        Number(u32),
        Text(String),
    }

    match Option::<RawUid>::deserialize(deserializer)? {
        None => Ok(None),
        Some(RawUid::Number(uid)) => Ok(Some(uid)),
        Some(RawUid::Text(text)) => text
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| D::Error::custom(format!("uid {:?} is not a number", text))),
    }
}

/// File to write
#[derive(Debug, Clone, Deserialize)]
pub struct WriteFileConfig {
    pub path: String,
    #[serde(default)]
    pub content: String,
    /// `user` or `user:group`; defaults to `root`
    pub owner: Option<String>,
    /// Octal mode string; defaults to `0644`
    pub permissions: Option<String>,
}

/// Resolver override (`resolv_conf`)
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ResolvConfConfig {
    pub nameservers: Vec<String>,
}

/// A validated mount entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountConfig {
    pub what: String,
    pub mount_point: String,
    pub fs_type: Option<String>,
    pub options: Option<String>,
}

impl MountConfig {
    /// Build from the positional list form; `index` is only used in errors
    pub fn from_entry(index: usize, entry: &[String]) -> Result<Self, RdInitError> {
        match entry {
            [what, mount_point, rest @ ..] => Ok(Self {
                what: what.clone(),
                mount_point: mount_point.clone(),
                fs_type: rest.first().cloned(),
                options: rest.get(1).cloned(),
            }),
            _ => Err(RdInitError::validation(format!(
                "mount #{} is too short: {:?}",
                index, entry
            ))),
        }
    }
}

impl CloudConfig {
    /// Parse cloud-config from YAML string
    ///
    /// A leading `#cloud-config` line is an ordinary YAML comment.
    pub fn from_yaml(yaml: &str) -> Result<Self, RdInitError> {
        parse_yaml(Document::UserData, yaml)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIMA_USER_DATA: &str = r#"#cloud-config
users:
  - name: alice
    uid: "501"
    homedir: /home/alice.linux
    shell: /bin/bash
    sudo: ALL=(ALL) NOPASSWD:ALL
    lock_passwd: true
    ssh-authorized-keys:
      - ssh-ed25519 AAAA alice@mac
mounts:
  - [tmpfs, /mnt/data, tmpfs, size=100m]
  - ["mount0", "/Users/alice", "virtiofs", "rw,nofail"]
write_files:
  - content: |
      #!/bin/sh
      echo boot
    owner: root:root
    path: /var/lib/cloud/scripts/per-boot/00-lima.boot.sh
    permissions: '0755'
manage_resolv_conf: true
resolv_conf:
  nameservers:
    - 192.168.5.3
"#;

    #[test]
    fn test_parse_lima_user_data() {
        let config = CloudConfig::from_yaml(LIMA_USER_DATA).unwrap();

        assert_eq!(config.users.len(), 1);
        let user = &config.users[0];
        assert_eq!(user.name, "alice");
        assert_eq!(user.uid, Some(501));
        assert_eq!(user.homedir.as_deref(), Some("/home/alice.linux"));
        assert_eq!(user.sudo_rule(), Some("ALL=(ALL) NOPASSWD:ALL"));
        assert_eq!(user.lock_passwd, Some(true));
        assert_eq!(user.authorized_keys(), vec!["ssh-ed25519 AAAA alice@mac"]);

        assert_eq!(config.mounts.len(), 2);
        assert_eq!(config.write_files.len(), 1);
        assert_eq!(config.write_files[0].permissions.as_deref(), Some("0755"));
        assert!(config.manage_resolv_conf);
        assert_eq!(config.resolv_conf.nameservers, vec!["192.168.5.3"]);
    }

    #[test]
    fn test_authorized_keys_merge_order() {
        let yaml = r#"
users:
  - name: bob
    ssh_authorized_keys: [key-a, key-b]
    ssh-authorized-keys: [key-c]
"#;
        let config = CloudConfig::from_yaml(yaml).unwrap();
        assert_eq!(
            config.users[0].authorized_keys(),
            vec!["key-a", "key-b", "key-c"]
        );
    }

    #[test]
    fn test_uid_forms() {
        let config = CloudConfig::from_yaml("users:\n  - name: a\n    uid: 1001\n").unwrap();
        assert_eq!(config.users[0].uid, Some(1001));

        let config = CloudConfig::from_yaml("users:\n  - name: a\n").unwrap();
        assert_eq!(config.users[0].uid, None);

        let err = CloudConfig::from_yaml("users:\n  - name: a\n    uid: abc\n").unwrap_err();
        assert!(matches!(err, RdInitError::Parse { .. }));
    }

    #[test]
    fn test_empty_sudo_is_no_rule() {
        let config = CloudConfig::from_yaml("users:\n  - name: a\n    sudo: ''\n").unwrap();
        assert_eq!(config.users[0].sudo_rule(), None);
    }

    #[test]
    fn test_sudo_false_is_no_rule() {
        let config = CloudConfig::from_yaml("users:\n  - name: a\n    sudo: false\n").unwrap();
        assert_eq!(config.users[0].sudo_rule(), None);
    }

    #[test]
    fn test_defaults() {
        let config = CloudConfig::from_yaml("#cloud-config\n{}\n").unwrap();
        assert!(config.users.is_empty());
        assert!(config.mounts.is_empty());
        assert!(!config.manage_resolv_conf);
    }

    #[test]
    fn test_mount_entry() {
        let entry: Vec<String> = ["tmpfs", "/mnt/data", "tmpfs", "size=100m", "0", "0"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let mount = MountConfig::from_entry(0, &entry).unwrap();
        assert_eq!(mount.what, "tmpfs");
        assert_eq!(mount.mount_point, "/mnt/data");
        assert_eq!(mount.fs_type.as_deref(), Some("tmpfs"));
        assert_eq!(mount.options.as_deref(), Some("size=100m"));

        let mount = MountConfig::from_entry(1, &entry[..2]).unwrap();
        assert_eq!(mount.fs_type, None);
        assert_eq!(mount.options, None);
    }

    #[test]
    fn test_mount_entry_too_short() {
        let err = MountConfig::from_entry(3, &["only-source".to_string()]).unwrap_err();
        assert!(matches!(err, RdInitError::Validation(_)));
        assert!(err.to_string().contains("mount #3"));
    }
}
