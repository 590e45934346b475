//! Config loading and run-artifact registry behind the `modelscore` binary.

pub mod config;
pub mod registry;
