//! Resolution of the environment variables the New Relic agent reads at startup.
//!
//! The license key is resolved in this order, the first hit wins:
//!
//! 1. A non-empty `NEW_RELIC_LICENSE_KEY` that is already set, i.e. via `cf set-env`.
//! 2. The first binding of the selected service label that carries a `licenseKey` credential.
//! 3. The first user-provided service matching the selected label that carries a `licenseKey`.
//!
//! If none of these exist, the license key resolves to the empty string. A missing binding is
//! never an error.

use libcnb::Env;
use std::fmt::{Display, Formatter};
use vcap_data::{ServiceBinding, VcapApplication, VcapApplicationError, VcapServices, VcapServicesError};

pub const LICENSE_KEY_ENV_VAR: &str = "NEW_RELIC_LICENSE_KEY";
pub const APP_NAME_ENV_VAR: &str = "NEW_RELIC_APP_NAME";
pub const VCAP_SERVICES_ENV_VAR: &str = "VCAP_SERVICES";
pub const VCAP_APPLICATION_ENV_VAR: &str = "VCAP_APPLICATION";

pub const LICENSE_KEY_CREDENTIAL: &str = "licenseKey";
pub const DEFAULT_SERVICE_LABEL: &str = "newrelic";

/// Selects the service bindings that are considered New Relic bindings.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ServiceSelector {
    label: String,
}

impl ServiceSelector {
    /// A blank label falls back to [`DEFAULT_SERVICE_LABEL`], it would otherwise match every
    /// user-provided service.
    pub fn new(label: impl Into<String>) -> Self {
        let label = label.into();

        if label.trim().is_empty() {
            Self::default()
        } else {
            Self { label }
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Whether the descriptor contains any binding this selector would consider, regardless of
    /// whether it carries a license key.
    pub fn is_bound(&self, services: &VcapServices) -> bool {
        !services.bindings(&self.label).is_empty()
            || services
                .user_provided()
                .iter()
                .any(|binding| binding.matches(&self.label))
    }

    /// Finds the first binding carrying a license key, together with that key.
    pub fn find_license_key<'a>(
        &self,
        services: &'a VcapServices,
    ) -> Option<(&'a ServiceBinding, &'a str)> {
        let with_license_key = |binding: &'a ServiceBinding| {
            binding
                .credential_str(LICENSE_KEY_CREDENTIAL)
                .map(|license_key| (binding, license_key))
        };

        services
            .bindings(&self.label)
            .iter()
            .find_map(with_license_key)
            .or_else(|| {
                services
                    .user_provided()
                    .iter()
                    .filter(|binding| binding.matches(&self.label))
                    .find_map(with_license_key)
            })
    }
}

impl Default for ServiceSelector {
    fn default() -> Self {
        Self {
            label: String::from(DEFAULT_SERVICE_LABEL),
        }
    }
}

/// Where the resolved license key came from. Used for reporting, so that the key itself never
/// needs to be logged.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum LicenseKeySource {
    Environment,
    ServiceBinding { label: String, name: Option<String> },
    NotFound,
}

impl Display for LicenseKeySource {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            LicenseKeySource::Environment => write!(f, "the {LICENSE_KEY_ENV_VAR} env var"),
            LicenseKeySource::ServiceBinding {
                label,
                name: Some(name),
            } => write!(f, "the '{name}' service binding ({label})"),
            LicenseKeySource::ServiceBinding { label, name: None } => {
                write!(f, "a service binding ({label})")
            }
            LicenseKeySource::NotFound => f.write_str("no env var or service binding"),
        }
    }
}

/// The resolved New Relic environment.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct NewRelicEnv {
    pub license_key: String,
    pub license_key_source: LicenseKeySource,
    pub app_name: Option<String>,
}

impl NewRelicEnv {
    /// The env vars to export. The license key is always present, even when empty.
    pub fn vars(&self) -> Vec<(&'static str, &str)> {
        let mut vars = vec![(LICENSE_KEY_ENV_VAR, self.license_key.as_str())];

        if let Some(app_name) = &self.app_name {
            vars.push((APP_NAME_ENV_VAR, app_name.as_str()));
        }

        vars
    }
}

/// A descriptor that could not be parsed. Resolution treats it as absent.
#[derive(thiserror::Error, Debug)]
pub enum DescriptorError {
    #[error(transparent)]
    Services(#[from] VcapServicesError),
    #[error(transparent)]
    Application(#[from] VcapApplicationError),
}

#[derive(Debug)]
pub struct Resolution {
    pub env: NewRelicEnv,
    pub warnings: Vec<DescriptorError>,
}

pub fn resolve(env: &Env, selector: &ServiceSelector) -> Resolution {
    let mut warnings = Vec::new();

    let services = read_descriptor::<VcapServices>(env, VCAP_SERVICES_ENV_VAR)
        .unwrap_or_else(|error| {
            warnings.push(DescriptorError::from(error));
            VcapServices::default()
        });

    let (license_key, license_key_source) = if let Some(license_key) =
        non_empty_var(env, LICENSE_KEY_ENV_VAR)
    {
        (license_key, LicenseKeySource::Environment)
    } else if let Some((binding, license_key)) = selector.find_license_key(&services) {
        (
            String::from(license_key),
            LicenseKeySource::ServiceBinding {
                label: binding
                    .label
                    .clone()
                    .unwrap_or_else(|| String::from(selector.label())),
                name: binding.name.clone(),
            },
        )
    } else {
        (String::new(), LicenseKeySource::NotFound)
    };

    let app_name = non_empty_var(env, APP_NAME_ENV_VAR).or_else(|| {
        read_descriptor::<VcapApplication>(env, VCAP_APPLICATION_ENV_VAR)
            .unwrap_or_else(|error| {
                warnings.push(DescriptorError::from(error));
                VcapApplication::default()
            })
            .application_name
            .filter(|name| !name.is_empty())
    });

    Resolution {
        env: NewRelicEnv {
            license_key,
            license_key_source,
            app_name,
        },
        warnings,
    }
}

/// Whether the environment carries anything that would make the agent report, used during
/// detection.
pub fn is_configured(env: &Env, selector: &ServiceSelector) -> bool {
    non_empty_var(env, LICENSE_KEY_ENV_VAR).is_some()
        || read_descriptor::<VcapServices>(env, VCAP_SERVICES_ENV_VAR)
            .is_ok_and(|services| selector.is_bound(&services))
}

fn read_descriptor<T>(env: &Env, key: &str) -> Result<T, T::Err>
where
    T: std::str::FromStr + Default,
{
    env.get_string_lossy(key)
        .map_or_else(|| Ok(T::default()), |value| value.parse())
}

fn non_empty_var(env: &Env, key: &str) -> Option<String> {
    env.get_string_lossy(key).filter(|value| !value.is_empty())
}
