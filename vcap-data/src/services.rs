use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Label Cloud Foundry uses for services created with `cf create-user-provided-service`.
pub const USER_PROVIDED_LABEL: &str = "user-provided";

/// The service-binding descriptor, as found in `VCAP_SERVICES`.
///
/// Maps a service label (i.e. `newrelic`) to the bindings of that service, in the order the
/// platform provided them.
///
/// # Examples
/// ```
/// use vcap_data::VcapServices;
///
/// let services: VcapServices = r#"{"newrelic":[{"credentials":{"licenseKey":"abc"}}]}"#
///     .parse()
///     .unwrap();
///
/// assert_eq!(services.bindings("newrelic").len(), 1);
/// assert!(services.bindings("redis").is_empty());
/// ```
#[derive(Debug, Default, Clone, Eq, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct VcapServices(BTreeMap<String, Vec<ServiceBinding>>);

impl VcapServices {
    /// Bindings for the given label, empty if the label isn't bound.
    pub fn bindings(&self, label: impl AsRef<str>) -> &[ServiceBinding] {
        self.0
            .get(label.as_ref())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Bindings of services created with `cf create-user-provided-service`.
    pub fn user_provided(&self) -> &[ServiceBinding] {
        self.bindings(USER_PROVIDED_LABEL)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[ServiceBinding])> {
        self.0
            .iter()
            .map(|(label, bindings)| (label.as_str(), bindings.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(Vec::is_empty)
    }
}

impl FromStr for VcapServices {
    type Err = VcapServicesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Some platforms export an empty string instead of leaving the variable unset.
        if s.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_json::from_str(s).map_err(VcapServicesError)
    }
}

#[derive(thiserror::Error, Debug)]
#[error("Invalid VCAP_SERVICES: {0}")]
pub struct VcapServicesError(#[source] pub serde_json::Error);

/// A single service binding record.
#[derive(Debug, Default, Clone, Eq, PartialEq, Deserialize)]
pub struct ServiceBinding {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub plan: Option<String>,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub instance_name: Option<String>,
    #[serde(default)]
    pub binding_name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_nullable")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "deserialize_nullable")]
    pub credentials: Credentials,
}

/// Free-form credentials of a binding. Their shape is defined by the service broker.
pub type Credentials = Map<String, Value>;

impl ServiceBinding {
    /// Returns the credential `key` if it exists and is a JSON string.
    pub fn credential_str(&self, key: impl AsRef<str>) -> Option<&str> {
        self.credentials.get(key.as_ref()).and_then(Value::as_str)
    }

    /// Whether the name, label or any of the tags of this binding contain `needle`, ignoring
    /// ASCII case. A blank needle matches nothing.
    pub fn matches(&self, needle: impl AsRef<str>) -> bool {
        let needle = needle.as_ref().trim().to_ascii_lowercase();
        if needle.is_empty() {
            return false;
        }

        self.name
            .iter()
            .chain(self.label.iter())
            .chain(self.tags.iter())
            .any(|candidate| candidate.to_ascii_lowercase().contains(&needle))
    }
}

// Brokers aren't consistent about omitting a field versus sending `null`.
fn deserialize_nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}
