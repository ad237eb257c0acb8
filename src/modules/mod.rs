//! Configuration modules
//!
//! Each module applies one kind of directive to the running system. They are
//! driven by the stages in a fixed order and stop at the first error.

pub mod hostname;
pub mod mounts;
pub mod resolv_conf;
pub mod ssh_keys;
pub mod users;
pub mod write_files;
