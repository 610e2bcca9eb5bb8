//! CLI commands implementation

pub mod catalog;
pub mod init;
pub mod mirror;

pub use catalog::*;
pub use init::*;
pub use mirror::*;
