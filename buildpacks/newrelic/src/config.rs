use crate::newrelic_env::{ServiceSelector, DEFAULT_SERVICE_LABEL};
use libcnb::Env;
use serde::Deserialize;
use std::path::Path;

/// Carries the configured service label from the build into the launch environment.
pub const SERVICE_LABEL_ENV_VAR: &str = "NEWRELIC_BUILDPACK_SERVICE_LABEL";

/// Cloud Foundry's name for the buildpack root directory.
pub const BP_DIR_ENV_VAR: &str = "BP_DIR";

/// The `[metadata]` table of `buildpack.toml`.
#[derive(Deserialize, Debug, Clone, Eq, PartialEq)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct NewRelicBuildpackMetadata {
    pub service_label: String,
}

impl Default for NewRelicBuildpackMetadata {
    fn default() -> Self {
        Self {
            service_label: String::from(DEFAULT_SERVICE_LABEL),
        }
    }
}

impl NewRelicBuildpackMetadata {
    pub fn service_selector(&self) -> ServiceSelector {
        ServiceSelector::new(&self.service_label)
    }
}

#[derive(Deserialize)]
struct BuildpackDescriptor {
    #[serde(default)]
    metadata: NewRelicBuildpackMetadata,
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Could not read {0}: {1}")]
    ReadBuildpackDescriptor(String, #[source] std::io::Error),
    #[error("Could not parse {0}: {1}")]
    ParseBuildpackDescriptor(String, #[source] toml::de::Error),
}

/// Reads the metadata from the `buildpack.toml` in the given buildpack directory. A directory
/// without a `buildpack.toml` yields the defaults.
pub fn read_buildpack_metadata(
    buildpack_dir: impl AsRef<Path>,
) -> Result<NewRelicBuildpackMetadata, ConfigError> {
    let path = buildpack_dir.as_ref().join("buildpack.toml");

    if !path.exists() {
        return Ok(NewRelicBuildpackMetadata::default());
    }

    let contents = std::fs::read_to_string(&path)
        .map_err(|error| ConfigError::ReadBuildpackDescriptor(path.display().to_string(), error))?;

    toml::from_str::<BuildpackDescriptor>(&contents)
        .map(|descriptor| descriptor.metadata)
        .map_err(|error| ConfigError::ParseBuildpackDescriptor(path.display().to_string(), error))
}

/// Determines the service selector for programs running outside of libcnb, i.e. at launch.
///
/// `NEWRELIC_BUILDPACK_SERVICE_LABEL` takes precedence, followed by the `buildpack.toml` found via
/// `BP_DIR`. Errors reading the latter are returned together with the default selector.
pub fn service_selector_from_env(env: &Env) -> (ServiceSelector, Option<ConfigError>) {
    if let Some(label) = env
        .get_string_lossy(SERVICE_LABEL_ENV_VAR)
        .filter(|label| !label.trim().is_empty())
    {
        return (ServiceSelector::new(label), None);
    }

    match env.get_string_lossy(BP_DIR_ENV_VAR) {
        Some(buildpack_dir) => match read_buildpack_metadata(buildpack_dir) {
            Ok(metadata) => (metadata.service_selector(), None),
            Err(error) => (ServiceSelector::default(), Some(error)),
        },
        None => (ServiceSelector::default(), None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use std::fs;

    #[test]
    fn metadata_defaults() {
        let descriptor: BuildpackDescriptor = toml::from_str("").unwrap();
        assert_eq!(descriptor.metadata, NewRelicBuildpackMetadata::default());
        assert_eq!(descriptor.metadata.service_selector().label(), "newrelic");
    }

    #[test]
    fn metadata_service_label() {
        let descriptor: BuildpackDescriptor = toml::from_str(indoc! {r#"
            api = "0.10"

            [buildpack]
            id = "cloudfoundry/newrelic"
            version = "0.1.0"

            [metadata]
            service-label = "newrelic-enterprise"
        "#})
        .unwrap();

        assert_eq!(descriptor.metadata.service_label, "newrelic-enterprise");
    }

    #[test]
    fn metadata_rejects_unknown_keys() {
        assert!(toml::from_str::<BuildpackDescriptor>(indoc! {r#"
            [metadata]
            service_label = "typo"
        "#})
        .is_err());
    }

    #[test]
    fn read_buildpack_metadata_without_descriptor() {
        let buildpack_dir = tempfile::tempdir().unwrap();

        assert_eq!(
            read_buildpack_metadata(buildpack_dir.path()).unwrap(),
            NewRelicBuildpackMetadata::default()
        );
    }

    #[test]
    fn selector_from_label_env_var() {
        let mut env = Env::new();
        env.insert(SERVICE_LABEL_ENV_VAR, "custom");
        env.insert(BP_DIR_ENV_VAR, "/does/not/matter");

        let (selector, error) = service_selector_from_env(&env);
        assert_eq!(selector.label(), "custom");
        assert!(error.is_none());
    }

    #[test]
    fn selector_from_bp_dir() {
        let buildpack_dir = tempfile::tempdir().unwrap();
        fs::write(
            buildpack_dir.path().join("buildpack.toml"),
            "[metadata]\nservice-label = \"from-bp-dir\"\n",
        )
        .unwrap();

        let mut env = Env::new();
        env.insert(BP_DIR_ENV_VAR, buildpack_dir.path());

        let (selector, error) = service_selector_from_env(&env);
        assert_eq!(selector.label(), "from-bp-dir");
        assert!(error.is_none());
    }

    #[test]
    fn blank_service_label_in_bp_dir_uses_default() {
        let buildpack_dir = tempfile::tempdir().unwrap();
        fs::write(
            buildpack_dir.path().join("buildpack.toml"),
            "[metadata]\nservice-label = \"  \"\n",
        )
        .unwrap();

        let metadata = read_buildpack_metadata(buildpack_dir.path()).unwrap();
        assert_eq!(metadata.service_selector(), ServiceSelector::default());

        let mut env = Env::new();
        env.insert(BP_DIR_ENV_VAR, buildpack_dir.path());

        let (selector, error) = service_selector_from_env(&env);
        assert_eq!(selector.label(), "newrelic");
        assert!(error.is_none());
    }

    #[test]
    fn selector_from_broken_bp_dir_descriptor() {
        let buildpack_dir = tempfile::tempdir().unwrap();
        fs::write(buildpack_dir.path().join("buildpack.toml"), "[metadata").unwrap();

        let mut env = Env::new();
        env.insert(BP_DIR_ENV_VAR, buildpack_dir.path());

        let (selector, error) = service_selector_from_env(&env);
        assert_eq!(selector, ServiceSelector::default());
        assert!(matches!(
            error,
            Some(ConfigError::ParseBuildpackDescriptor(..))
        ));
    }

    #[test]
    fn selector_defaults() {
        let (selector, error) = service_selector_from_env(&Env::new());
        assert_eq!(selector, ServiceSelector::default());
        assert!(error.is_none());
    }
}
