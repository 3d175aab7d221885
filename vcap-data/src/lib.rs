//! Low-level representations for the Cloud Foundry service-binding and application
//! descriptors (`VCAP_SERVICES` and `VCAP_APPLICATION`).

pub mod application;
pub mod services;

pub use application::{VcapApplication, VcapApplicationError};
pub use services::{Credentials, ServiceBinding, VcapServices, VcapServicesError};
