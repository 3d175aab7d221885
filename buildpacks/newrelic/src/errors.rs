use crate::NewRelicBuildpackError;
use libherokubuildpack::log::log_error;
use newrelic_buildpack::package_json::PackageJsonError;

pub(crate) fn on_newrelic_buildpack_error(error: NewRelicBuildpackError) {
    match error {
        NewRelicBuildpackError::PackageJson(PackageJsonError::Read(io_error)) => log_error(
            "Unable to read package.json",
            format!("The buildpack could not read your app's package.json file.\n\nDetails: {io_error}"),
        ),
        NewRelicBuildpackError::PackageJson(PackageJsonError::Parse(json_error)) => log_error(
            "Invalid package.json",
            format!(
                "The buildpack could not parse your app's package.json file. Make sure it is \
                valid JSON.\n\nDetails: {json_error}"
            ),
        ),
    }
}
