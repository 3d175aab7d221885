use serde::Deserialize;
use std::str::FromStr;

/// The application descriptor, as found in `VCAP_APPLICATION`.
///
/// Only the application name is modelled, everything else the platform sends is ignored.
#[derive(Debug, Default, Clone, Eq, PartialEq, Deserialize)]
pub struct VcapApplication {
    #[serde(default)]
    pub application_name: Option<String>,
}

impl FromStr for VcapApplication {
    type Err = VcapApplicationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_json::from_str(s).map_err(VcapApplicationError)
    }
}

#[derive(thiserror::Error, Debug)]
#[error("Invalid VCAP_APPLICATION: {0}")]
pub struct VcapApplicationError(#[source] pub serde_json::Error);
