use crate::errors::on_newrelic_buildpack_error;
use libcnb::build::{BuildContext, BuildResult, BuildResultBuilder};
use libcnb::data::layer_name;
use libcnb::detect::{DetectContext, DetectResult, DetectResultBuilder};
use libcnb::generic::GenericPlatform;
use libcnb::layer::UncachedLayerDefinition;
use libcnb::layer_env::{LayerEnv, ModificationBehavior, Scope};
use libcnb::{additional_buildpack_binary_path, buildpack_main, Buildpack, Platform};
use libherokubuildpack::log::{log_header, log_info, log_warning};
use newrelic_buildpack::config::{NewRelicBuildpackMetadata, SERVICE_LABEL_ENV_VAR};
use newrelic_buildpack::newrelic_env::{self, LicenseKeySource, LICENSE_KEY_ENV_VAR};
use newrelic_buildpack::package_json::{PackageJson, PackageJsonError};

// Suppress warnings due to the `unused_crate_dependencies` lint not handling integration tests well.
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

mod errors;

pub(crate) struct NewRelicBuildpack;

impl Buildpack for NewRelicBuildpack {
    type Platform = GenericPlatform;
    type Metadata = NewRelicBuildpackMetadata;
    type Error = NewRelicBuildpackError;

    fn detect(&self, context: DetectContext<Self>) -> libcnb::Result<DetectResult, Self::Error> {
        let depends_on_newrelic = PackageJson::read(&context.app_dir)
            .map_err(NewRelicBuildpackError::PackageJson)?
            .is_some_and(|package_json| package_json.depends_on_newrelic());

        let selector = context.buildpack_descriptor.metadata.service_selector();

        if depends_on_newrelic || newrelic_env::is_configured(context.platform.env(), &selector) {
            DetectResultBuilder::pass().build()
        } else {
            DetectResultBuilder::fail().build()
        }
    }

    fn build(&self, context: BuildContext<Self>) -> libcnb::Result<BuildResult, Self::Error> {
        log_header("Installing NewRelic");

        let selector = context.buildpack_descriptor.metadata.service_selector();
        let resolution = newrelic_env::resolve(context.platform.env(), &selector);

        for warning in &resolution.warnings {
            log_warning(
                "Ignoring invalid service descriptor",
                format!("{warning}\nThe New Relic agent will start without settings from it."),
            );
        }

        match &resolution.env.license_key_source {
            source @ LicenseKeySource::NotFound => log_info(format!(
                "No New Relic license key at build time ({source}), {LICENSE_KEY_ENV_VAR} will be resolved when the app starts."
            )),
            source => log_info(format!("Found a New Relic license key in {source}.")),
        }

        if let Some(app_name) = &resolution.env.app_name {
            log_info(format!("The agent will report as '{app_name}'."));
        }

        let layer_ref = context.uncached_layer(
            layer_name!("newrelic"),
            UncachedLayerDefinition {
                build: false,
                launch: true,
            },
        )?;

        layer_ref.write_env(
            LayerEnv::new()
                .chainable_insert(
                    Scope::Launch,
                    ModificationBehavior::Default,
                    LICENSE_KEY_ENV_VAR,
                    "",
                )
                .chainable_insert(
                    Scope::Launch,
                    ModificationBehavior::Override,
                    SERVICE_LABEL_ENV_VAR,
                    selector.label(),
                ),
        )?;

        layer_ref.write_exec_d_programs([(
            "newrelic_env",
            additional_buildpack_binary_path!("newrelic_env"),
        )])?;

        BuildResultBuilder::new().build()
    }

    fn on_error(&self, error: libcnb::Error<Self::Error>) {
        libherokubuildpack::error::on_error(on_newrelic_buildpack_error, error);
    }
}

#[derive(Debug)]
pub(crate) enum NewRelicBuildpackError {
    PackageJson(PackageJsonError),
}

impl From<NewRelicBuildpackError> for libcnb::Error<NewRelicBuildpackError> {
    fn from(error: NewRelicBuildpackError) -> Self {
        Self::BuildpackError(error)
    }
}

buildpack_main!(NewRelicBuildpack);
