//! CLI command handlers that sit outside the build pass itself.

pub mod export;
pub mod init;
