//! rd-init library
//!
//! An early-boot provisioning agent. It reads the NoCloud seed volume
//! (`meta-data`, `user-data`, `network-config`), turns the documents into
//! systemd artifacts and direct OS changes, then brings systemd into the
//! configured state once per boot.
//!
//! # Design Principles
//!
//! - **Safety First**: No unsafe code (`unsafe_code = "forbid"`)
//! - **Fail Fast**: The first error stops the boot; nothing is retried
//! - **Testable**: OS and control-plane access sit behind traits with mocks

pub mod config;
pub mod datasources;
pub mod host;
pub mod modules;
pub mod network;
pub mod orchestrator;
pub mod paths;
pub mod stages;
pub mod systemd;

pub(crate) mod command;
mod error;

pub use error::RdInitError;
pub use orchestrator::{Orchestrator, Step};
pub use paths::Paths;
