//! CLI subcommand implementations.

pub mod cart;
pub mod migrate;
