//! Subcommand implementations.

pub mod catalog;
pub mod migrate;
pub mod vouchers;
