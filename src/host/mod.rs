//! Host operating system primitives
//!
//! Everything that mutates kernel or account state goes through the [`Host`]
//! trait: the host name, account creation, account/group resolution and
//! file ownership. [`LinuxHost`] is the real implementation; [`mock`]
//! provides an in-memory one for tests.

pub mod mock;

use async_trait::async_trait;
use nix::unistd::{Gid, Group, Uid, User};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::UserConfig;
use crate::{RdInitError, command};

/// An account as recorded in the system account database
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub name: String,
    pub uid: u32,
    pub gid: u32,
    pub home: PathBuf,
}

impl From<User> for Account {
    fn from(user: User) -> Self {
        Self {
            name: user.name,
            uid: user.uid.as_raw(),
            gid: user.gid.as_raw(),
            home: user.dir,
        }
    }
}

/// OS primitives used while provisioning
#[async_trait]
pub trait Host: Send + Sync {
    /// Set the running kernel host name
    async fn set_hostname(&self, hostname: &str) -> Result<(), RdInitError>;

    /// Create an account (home directory included)
    async fn create_user(&self, user: &UserConfig) -> Result<(), RdInitError>;

    /// Resolve an account by uid
    async fn user_by_uid(&self, uid: u32) -> Result<Account, RdInitError>;

    /// Resolve an account by name
    async fn user_by_name(&self, name: &str) -> Result<Account, RdInitError>;

    /// Resolve a group name to its gid
    async fn group_by_name(&self, name: &str) -> Result<u32, RdInitError>;

    /// Change ownership; `None` leaves that id unchanged
    async fn chown(&self, path: &Path, uid: Option<u32>, gid: Option<u32>)
    -> Result<(), RdInitError>;
}

/// [`Host`] for a live Linux system
#[derive(Debug, Clone, Default)]
pub struct LinuxHost;

impl LinuxHost {
    pub fn new() -> Self {
        Self
    }
}

/// Arguments for `useradd` creating `user`
pub fn useradd_args(user: &UserConfig) -> Vec<String> {
    let mut args = vec!["--create-home".to_string()];

    if let Some(homedir) = &user.homedir {
        args.extend(["--home-dir".to_string(), homedir.clone()]);
    }
    if let Some(gecos) = &user.gecos {
        args.extend(["--comment".to_string(), gecos.clone()]);
    }
    if let Some(uid) = user.uid {
        args.extend(["--uid".to_string(), uid.to_string()]);
    }
    if let Some(shell) = &user.shell {
        args.extend(["--shell".to_string(), shell.clone()]);
    }

    args.push(user.name.clone());
    args
}

#[async_trait]
impl Host for LinuxHost {
    async fn set_hostname(&self, hostname: &str) -> Result<(), RdInitError> {
        nix::unistd::sethostname(hostname)
            .map_err(|e| RdInitError::os(format!("failed to set hostname to {:?}", hostname), e))
    }

    async fn create_user(&self, user: &UserConfig) -> Result<(), RdInitError> {
        let args = useradd_args(user);
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        command::run_checked("useradd", &args).await?;
        Ok(())
    }

    async fn user_by_uid(&self, uid: u32) -> Result<Account, RdInitError> {
        User::from_uid(Uid::from_raw(uid))
            .map_err(|e| RdInitError::os(format!("failed to look up uid {}", uid), e))?
            .map(Account::from)
            .ok_or_else(|| RdInitError::UserGroup(format!("no user with uid {}", uid)))
    }

    async fn user_by_name(&self, name: &str) -> Result<Account, RdInitError> {
        User::from_name(name)
            .map_err(|e| RdInitError::os(format!("failed to look up user {}", name), e))?
            .map(Account::from)
            .ok_or_else(|| RdInitError::UserGroup(format!("unknown user {}", name)))
    }

    async fn group_by_name(&self, name: &str) -> Result<u32, RdInitError> {
        Group::from_name(name)
            .map_err(|e| RdInitError::os(format!("failed to look up group {}", name), e))?
            .map(|group| group.gid.as_raw())
            .ok_or_else(|| RdInitError::UserGroup(format!("unknown group {}", name)))
    }

    async fn chown(
        &self,
        path: &Path,
        uid: Option<u32>,
        gid: Option<u32>,
    ) -> Result<(), RdInitError> {
        debug!(path = %path.display(), ?uid, ?gid, "Changing ownership");
        nix::unistd::chown(path, uid.map(Uid::from_raw), gid.map(Gid::from_raw))
            .map_err(|e| RdInitError::os(format!("failed to chown {}", path.display()), e))
    }
}
