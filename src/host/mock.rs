//! In-memory host for testing
//!
//! Keeps a fake account database and records host-name changes, created
//! accounts and ownership changes instead of touching the system.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

use super::{Account, Host};
use crate::RdInitError;
use crate::config::UserConfig;

/// An ownership change recorded by [`MockHost`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chown {
    pub path: PathBuf,
    pub uid: Option<u32>,
    pub gid: Option<u32>,
}

#[derive(Debug, Default)]
struct State {
    hostname: Option<String>,
    accounts: Vec<Account>,
    groups: HashMap<String, u32>,
    created: Vec<String>,
    chowns: Vec<Chown>,
    next_uid: u32,
}

/// Mock host
///
/// # Example
/// ```
/// use rd_init::host::mock::MockHost;
///
/// let host = MockHost::new()
///     .with_user("root", 0, 0, "/root")
///     .with_group("wheel", 10);
/// ```
#[derive(Debug, Clone)]
pub struct MockHost {
    state: Arc<Mutex<State>>,
    hostname_error: Option<String>,
}

impl MockHost {
    /// Create an empty host; new accounts get uids from 1000
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                next_uid: 1000,
                ..Default::default()
            })),
            hostname_error: None,
        }
    }

    /// Pre-populate an account
    pub fn with_user(self, name: &str, uid: u32, gid: u32, home: impl AsRef<Path>) -> Self {
        let account = Account {
            name: name.to_string(),
            uid,
            gid,
            home: home.as_ref().to_path_buf(),
        };
        if let Ok(mut state) = self.state.try_lock() {
            state.accounts.push(account);
        }
        self
    }

    /// Pre-populate a group
    pub fn with_group(self, name: &str, gid: u32) -> Self {
        if let Ok(mut state) = self.state.try_lock() {
            state.groups.insert(name.to_string(), gid);
        }
        self
    }

    /// Fail `set_hostname` with this message
    pub fn with_hostname_error(mut self, message: &str) -> Self {
        self.hostname_error = Some(message.to_string());
        self
    }

    /// Host name set so far
    pub async fn hostname(&self) -> Option<String> {
        self.state.lock().await.hostname.clone()
    }

    /// Names of accounts created through `create_user`, in order
    pub async fn created_users(&self) -> Vec<String> {
        self.state.lock().await.created.clone()
    }

    /// Ownership changes, in order
    pub async fn chowns(&self) -> Vec<Chown> {
        self.state.lock().await.chowns.clone()
    }
}

impl Default for MockHost {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Host for MockHost {
    async fn set_hostname(&self, hostname: &str) -> Result<(), RdInitError> {
        if let Some(message) = &self.hostname_error {
            return Err(RdInitError::os(
                "failed to set hostname",
                std::io::Error::other(message.clone()),
            ));
        }
        self.state.lock().await.hostname = Some(hostname.to_string());
        Ok(())
    }

    async fn create_user(&self, user: &UserConfig) -> Result<(), RdInitError> {
        let mut state = self.state.lock().await;

        let duplicate = state
            .accounts
            .iter()
            .any(|a| a.name == user.name || Some(a.uid) == user.uid);
        if duplicate {
            return Err(RdInitError::command(
                format!("useradd {}", user.name),
                "user or uid already exists (exit status: 9)",
            ));
        }

        let uid = match user.uid {
            Some(uid) => uid,
            None => {
                state.next_uid += 1;
                state.next_uid
            }
        };
        let home = user
            .homedir
            .clone()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("/home").join(&user.name));

        state.accounts.push(Account {
            name: user.name.clone(),
            uid,
            gid: uid,
            home,
        });
        state.groups.insert(user.name.clone(), uid);
        state.created.push(user.name.clone());
        Ok(())
    }

    async fn user_by_uid(&self, uid: u32) -> Result<Account, RdInitError> {
        self.state
            .lock()
            .await
            .accounts
            .iter()
            .find(|a| a.uid == uid)
            .cloned()
            .ok_or_else(|| RdInitError::UserGroup(format!("no user with uid {}", uid)))
    }

    async fn user_by_name(&self, name: &str) -> Result<Account, RdInitError> {
        self.state
            .lock()
            .await
            .accounts
            .iter()
            .find(|a| a.name == name)
            .cloned()
            .ok_or_else(|| RdInitError::UserGroup(format!("unknown user {}", name)))
    }

    async fn group_by_name(&self, name: &str) -> Result<u32, RdInitError> {
        self.state
            .lock()
            .await
            .groups
            .get(name)
            .copied()
            .ok_or_else(|| RdInitError::UserGroup(format!("unknown group {}", name)))
    }

    async fn chown(
        &self,
        path: &Path,
        uid: Option<u32>,
        gid: Option<u32>,
    ) -> Result<(), RdInitError> {
        self.state.lock().await.chowns.push(Chown {
            path: path.to_path_buf(),
            uid,
            gid,
        });
        Ok(())
    }
}
