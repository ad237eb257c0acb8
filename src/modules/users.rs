//! User creation and configuration module

use crate::RdInitError;
use crate::config::UserConfig;
use crate::host::{Account, Host};
use crate::modules::ssh_keys;
use crate::paths::Paths;
use crate::systemd::unit::RenderedFile;
use tracing::{debug, info};

/// Create users from cloud-config
pub async fn create_users(
    host: &dyn Host,
    paths: &Paths,
    users: &[UserConfig],
) -> Result<(), RdInitError> {
    for user in users {
        create_user(host, paths, user).await?;
    }
    Ok(())
}

async fn create_user(host: &dyn Host, paths: &Paths, user: &UserConfig) -> Result<(), RdInitError> {
    if user.name.trim().is_empty() {
        return Err(RdInitError::validation("user entry without a name"));
    }

    info!(user = %user.name, "Creating user");
    host.create_user(user).await?;

    // The account database is authoritative for ids and home directory.
    let account = resolve_created(host, user).await?;
    debug!(user = %account.name, uid = account.uid, gid = account.gid, "Resolved new account");

    if user.lock_passwd == Some(true) {
        debug!(user = %user.name, "lock_passwd requested; not enforced");
    }

    if let Some(rule) = user.sudo_rule() {
        configure_sudo(paths, &user.name, rule).await?;
    }

    ssh_keys::configure_user_ssh_keys(host, &account, &user.authorized_keys()).await
}

async fn resolve_created(host: &dyn Host, user: &UserConfig) -> Result<Account, RdInitError> {
    let lookup = match user.uid {
        Some(uid) => host.user_by_uid(uid).await,
        None => host.user_by_name(&user.name).await,
    };
    lookup.map_err(|e| match e {
        RdInitError::UserGroup(message) => RdInitError::UserGroup(format!(
            "failed to look up newly created user {}: {}",
            user.name, message
        )),
        other => other,
    })
}

/// Sudoers fragment granting `rule` to `username`
pub fn sudoers_entry(username: &str, rule: &str) -> String {
    format!("{} {}\n", username, rule.trim())
}

/// Configure sudo access for a user
async fn configure_sudo(paths: &Paths, username: &str, rule: &str) -> Result<(), RdInitError> {
    info!(user = %username, "Adding user to sudoers");

    // sudo ignores fragments that are writable by anyone but root.
    RenderedFile::new(paths.sudoers_file(username), sudoers_entry(username, rule))
        .with_mode(0o440)
        .write()
        .await
}
