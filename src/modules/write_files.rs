//! Write files module

use crate::RdInitError;
use crate::config::WriteFileConfig;
use crate::host::Host;
use crate::systemd::unit::RenderedFile;
use std::path::Path;
use tracing::{debug, info};

/// Mode used when `permissions` is absent
pub const DEFAULT_MODE: u32 = 0o644;

/// Owner used when `owner` is absent
pub const DEFAULT_OWNER: &str = "root";

/// Write files from cloud-config, in order
pub async fn write_files(host: &dyn Host, files: &[WriteFileConfig]) -> Result<(), RdInitError> {
    for file in files {
        write_file(host, file).await?;
    }
    Ok(())
}

async fn write_file(host: &dyn Host, config: &WriteFileConfig) -> Result<(), RdInitError> {
    info!(path = %config.path, "Writing file");

    let path = Path::new(&config.path);
    if !path.is_absolute() {
        return Err(RdInitError::validation(format!(
            "write_files path {:?} is not absolute",
            config.path
        )));
    }

    let mode = match config.permissions.as_deref() {
        Some(perms) => parse_mode(perms).map_err(|e| {
            RdInitError::validation(format!(
                "failed to parse permissions for {}: {}",
                config.path, e
            ))
        })?,
        None => DEFAULT_MODE,
    };

    // Resolve ownership up front so an unknown owner leaves nothing behind.
    let owner = config.owner.as_deref().unwrap_or(DEFAULT_OWNER);
    let (user, group) = parse_owner(owner);
    let uid = host
        .user_by_name(user)
        .await
        .map_err(|e| owner_error(&config.path, e))?
        .uid;
    let gid = match group {
        Some(group) => Some(
            host.group_by_name(group)
                .await
                .map_err(|e| owner_error(&config.path, e))?,
        ),
        None => None,
    };
    debug!(
        path = %config.path,
        uid,
        ?gid,
        mode = %format!("{:o}", mode),
        "Resolved file attributes"
    );

    RenderedFile::new(path, config.content.as_str())
        .with_mode(mode)
        .write()
        .await?;

    // No group means "leave the group alone", not group 0.
    host.chown(path, Some(uid), gid).await
}

fn owner_error(path: &str, err: RdInitError) -> RdInitError {
    match err {
        RdInitError::UserGroup(message) => {
            RdInitError::UserGroup(format!("failed to write file {}: {}", path, message))
        }
        other => other,
    }
}

/// Parse an octal permission string such as `0644`, `644` or `0o755`
pub fn parse_mode(perms: &str) -> Result<u32, String> {
    let trimmed = perms.trim();
    let digits = trimmed.strip_prefix("0o").unwrap_or(trimmed);
    let mode = u32::from_str_radix(digits, 8)
        .map_err(|e| format!("invalid octal mode {:?}: {}", perms, e))?;
    if mode > 0o7777 {
        return Err(format!("mode {:?} is out of range", perms));
    }
    Ok(mode)
}

/// Split `user[:group]`; an empty group counts as none
pub fn parse_owner(owner: &str) -> (&str, Option<&str>) {
    match owner.split_once(':') {
        Some((user, group)) if !group.is_empty() => (user, Some(group)),
        Some((user, _)) => (user, None),
        None => (owner, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::mock::{Chown, MockHost};
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    fn file(path: &Path, owner: Option<&str>, permissions: Option<&str>) -> WriteFileConfig {
        WriteFileConfig {
            path: path.to_string_lossy().into_owned(),
            content: "hello\n".to_string(),
            owner: owner.map(str::to_string),
            permissions: permissions.map(str::to_string),
        }
    }

    #[test]
    fn test_parse_mode() {
        assert_eq!(parse_mode("0644"), Ok(0o644));
        assert_eq!(parse_mode("755"), Ok(0o755));
        assert_eq!(parse_mode("0o600"), Ok(0o600));
        assert_eq!(parse_mode("04755"), Ok(0o4755));
        assert!(parse_mode("rwx").is_err());
        assert!(parse_mode("0999").is_err());
        assert!(parse_mode("17777").is_err());
    }

    #[test]
    fn test_parse_owner() {
        assert_eq!(parse_owner("root"), ("root", None));
        assert_eq!(parse_owner("alice:staff"), ("alice", Some("staff")));
        assert_eq!(parse_owner("alice:"), ("alice", None));
    }

    #[tokio::test]
    async fn test_write_file_with_owner() {
        let temp_dir = TempDir::new().unwrap();
        let host = MockHost::new()
            .with_user("alice", 501, 20, "/home/alice")
            .with_group("staff", 20);
        let path = temp_dir.path().join("nested/dir/script.sh");

        write_files(&host, &[file(&path, Some("alice:staff"), Some("0755"))])
            .await
            .unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "hello\n");
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o7777, 0o755);
        assert_eq!(
            host.chowns().await,
            vec![Chown {
                path,
                uid: Some(501),
                gid: Some(20)
            }]
        );
    }

    #[tokio::test]
    async fn test_defaults_to_root_and_0644() {
        let temp_dir = TempDir::new().unwrap();
        let host = MockHost::new().with_user("root", 0, 0, "/root");
        let path = temp_dir.path().join("motd");

        write_files(&host, &[file(&path, None, None)]).await.unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o7777, 0o644);
        assert_eq!(host.chowns().await[0].uid, Some(0));
        assert_eq!(host.chowns().await[0].gid, None);
    }

    #[tokio::test]
    async fn test_unknown_owner_writes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let host = MockHost::new();
        let path = temp_dir.path().join("orphan");

        let err = write_files(&host, &[file(&path, Some("nobody-here"), None)])
            .await
            .unwrap_err();

        assert!(matches!(err, RdInitError::UserGroup(_)));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_unknown_group_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let host = MockHost::new().with_user("root", 0, 0, "/root");
        let path = temp_dir.path().join("f");

        let err = write_files(&host, &[file(&path, Some("root:nogroup"), None)])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("nogroup"));
    }

    #[tokio::test]
    async fn test_relative_path_rejected() {
        let host = MockHost::new().with_user("root", 0, 0, "/root");
        let err = write_files(&host, &[file(Path::new("relative/file"), None, None)])
            .await
            .unwrap_err();
        assert!(matches!(err, RdInitError::Validation(_)));
    }
}
