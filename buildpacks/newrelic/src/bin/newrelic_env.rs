//! exec.d program that exports the New Relic env vars when the app container starts.
//!
//! Service bindings can change between builds and launches, so resolution happens against the
//! live environment rather than the build-time one.

use libcnb::data::exec_d::ExecDProgramOutputKey;
use libcnb::data::exec_d_program_output_key;
use libcnb::exec_d::write_exec_d_program_output;
use libcnb::Env;
use newrelic_buildpack::config::service_selector_from_env;
use newrelic_buildpack::newrelic_env::{resolve, NewRelicEnv};
use std::collections::HashMap;

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

fn main() {
    let env = Env::from_current();

    let (selector, config_error) = service_selector_from_env(&env);
    if let Some(config_error) = config_error {
        eprintln!("newrelic_env: {config_error}");
    }

    let resolution = resolve(&env, &selector);
    for warning in &resolution.warnings {
        eprintln!("newrelic_env: {warning}");
    }

    write_exec_d_program_output(env_vars(&resolution.env));
}

fn env_vars(newrelic_env: &NewRelicEnv) -> HashMap<ExecDProgramOutputKey, String> {
    let mut env_vars = HashMap::from([(
        exec_d_program_output_key!("NEW_RELIC_LICENSE_KEY"),
        newrelic_env.license_key.clone(),
    )]);

    if let Some(app_name) = &newrelic_env.app_name {
        env_vars.insert(
            exec_d_program_output_key!("NEW_RELIC_APP_NAME"),
            app_name.clone(),
        );
    }

    env_vars
}
