//! Shared logic of the New Relic buildpack, used by the buildpack itself as well as its exec.d
//! and shell export programs.

pub mod config;
pub mod newrelic_env;
pub mod package_json;
pub mod shell;

// Suppress warnings due to the `unused_crate_dependencies` lint not handling integration tests well.
use libherokubuildpack as _;
#[cfg(test)]
use libcnb_test as _;
