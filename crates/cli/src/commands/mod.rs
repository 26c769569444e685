//! CLI subcommands

pub mod attempts;
pub mod status;
