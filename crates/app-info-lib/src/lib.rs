//! The core library of app-info.
//!
//! An [`EnvironmentInfo`][env::EnvironmentInfo] is resolved from a set of
//! [config layers][config::Config] and handed to an
//! [`InfoReporter`][report::InfoReporter] which renders it.

pub mod config;
pub mod discover;
pub mod env;
pub mod fact;
pub mod report;

/// The name of this tool, used for the config file name and temporary
/// directories in tests.
pub const TOOL_NAME: &str = "app-info";
