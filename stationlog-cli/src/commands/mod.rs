//! CLI subcommands.

pub mod common;
pub mod init;
pub mod run;
