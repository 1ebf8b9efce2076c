//! CLI command implementations.

pub(crate) mod build;
pub(crate) mod config;

pub(crate) use build::BuildArgs;
pub(crate) use config::ConfigArgs;
