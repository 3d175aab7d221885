//! Prints the New Relic env vars as shell `export` statements:
//!
//! ```sh
//! eval "$(/path/to/newrelic_export)"
//! ```
//!
//! Unlike the exec.d program this works outside of the CNB launcher, i.e. from a Cloud Foundry
//! style `.profile.d` script.

use libcnb::Env;
use newrelic_buildpack::config::service_selector_from_env;
use newrelic_buildpack::newrelic_env::resolve;
use newrelic_buildpack::shell::export_statements;
use std::io::Write;
use std::process::ExitCode;

// Suppress warnings due to the `unused_crate_dependencies` lint not handling integration tests well.
use libherokubuildpack as _;
use serde as _;
use serde_json as _;
use thiserror as _;
use toml as _;
use vcap_data as _;
#[cfg(test)]
use indoc as _;
#[cfg(test)]
use libcnb_test as _;
#[cfg(test)]
use tempfile as _;

fn main() -> ExitCode {
    let env = Env::from_current();

    let (selector, config_error) = service_selector_from_env(&env);
    if let Some(config_error) = config_error {
        eprintln!("newrelic_export: {config_error}");
    }

    let resolution = resolve(&env, &selector);
    for warning in &resolution.warnings {
        eprintln!("newrelic_export: {warning}");
    }

    let statements = export_statements(resolution.env.vars());

    let mut stdout = std::io::stdout().lock();
    match stdout
        .write_all(statements.as_bytes())
        .and_then(|()| stdout.flush())
    {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("newrelic_export: Could not write export statements: {error}");
            ExitCode::FAILURE
        }
    }
}
