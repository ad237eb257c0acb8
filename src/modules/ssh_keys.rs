//! SSH key configuration module

use crate::RdInitError;
use crate::host::{Account, Host};
use crate::systemd::unit::{RenderedFile, set_mode};
use tokio::fs;
use tracing::info;

/// Contents of an `authorized_keys` file for `keys`
pub fn authorized_keys_content(keys: &[&str]) -> String {
    if keys.is_empty() {
        return String::new();
    }
    keys.join("\n") + "\n"
}

/// Create `~/.ssh` and `~/.ssh/authorized_keys` for a freshly created account
///
/// The file is written even when there are no keys, so the account always
/// ends up with a well-formed `.ssh` directory it owns.
pub async fn configure_user_ssh_keys(
    host: &dyn Host,
    account: &Account,
    keys: &[&str],
) -> Result<(), RdInitError> {
    info!(user = %account.name, keys = keys.len(), "Creating authorized_keys");

    let ssh_dir = account.home.join(".ssh");
    let authorized_keys_path = ssh_dir.join("authorized_keys");

    fs::create_dir_all(&ssh_dir)
        .await
        .map_err(|e| RdInitError::os(format!("failed to create .ssh for {}", account.name), e))?;
    set_mode(&ssh_dir, 0o700).await?;
    host.chown(&ssh_dir, Some(account.uid), Some(account.gid)).await?;

    RenderedFile::new(&authorized_keys_path, authorized_keys_content(keys))
        .with_mode(0o600)
        .write()
        .await?;
    host.chown(&authorized_keys_path, Some(account.uid), Some(account.gid)).await
}
