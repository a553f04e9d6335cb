//! Library components for the `rowmap` CLI.

pub mod commands;
pub mod logging;
pub mod output;
pub mod schema;
