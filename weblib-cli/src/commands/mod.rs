//! CLI command implementations.

pub mod common;
pub mod init;
pub mod install;
pub mod restore;
pub mod search;
pub mod uninstall;
pub mod update;
