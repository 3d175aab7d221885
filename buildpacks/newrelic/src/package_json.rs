use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Name of the New Relic Node.js agent package on npm.
pub const NEWRELIC_PACKAGE: &str = "newrelic";

#[derive(Deserialize, Debug, Default)]
pub struct PackageJson {
    #[serde(default)]
    pub dependencies: BTreeMap<String, serde_json::Value>,
}

#[derive(thiserror::Error, Debug)]
pub enum PackageJsonError {
    #[error("Could not read package.json: {0}")]
    Read(#[source] std::io::Error),
    #[error("Could not parse package.json: {0}")]
    Parse(#[source] serde_json::Error),
}

impl PackageJson {
    /// Reads `package.json` from the app directory, `None` if the app doesn't have one.
    pub fn read(app_dir: impl AsRef<Path>) -> Result<Option<Self>, PackageJsonError> {
        let path = app_dir.as_ref().join("package.json");

        if !path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(path).map_err(PackageJsonError::Read)?;
        serde_json::from_str(&contents)
            .map(Some)
            .map_err(PackageJsonError::Parse)
    }

    pub fn depends_on_newrelic(&self) -> bool {
        self.dependencies.contains_key(NEWRELIC_PACKAGE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use std::fs;

    fn app_dir_with_package_json(contents: &str) -> tempfile::TempDir {
        let app_dir = tempfile::tempdir().unwrap();
        fs::write(app_dir.path().join("package.json"), contents).unwrap();
        app_dir
    }

    #[test]
    fn missing_package_json() {
        let app_dir = tempfile::tempdir().unwrap();
        assert!(PackageJson::read(app_dir.path()).unwrap().is_none());
    }

    #[test]
    fn package_json_with_newrelic() {
        let app_dir = app_dir_with_package_json(indoc! {r#"
            {
              "name": "node_web_app_with_newrelic",
              "version": "0.0.1",
              "engines": {"node": "22.x"},
              "dependencies": {
                "express": "^4.21.0",
                "newrelic": "^12.0.0"
              }
            }
        "#});

        let package_json = PackageJson::read(app_dir.path()).unwrap().unwrap();
        assert!(package_json.depends_on_newrelic());
    }

    #[test]
    fn package_json_without_newrelic() {
        let app_dir = app_dir_with_package_json(indoc! {r#"
            {
              "name": "plain_node_app",
              "dependencies": {"express": "^4.21.0"},
              "devDependencies": {"newrelic": "^12.0.0"}
            }
        "#});

        let package_json = PackageJson::read(app_dir.path()).unwrap().unwrap();
        assert!(!package_json.depends_on_newrelic());
    }

    #[test]
    fn package_json_without_dependencies() {
        let app_dir = app_dir_with_package_json("{}");

        let package_json = PackageJson::read(app_dir.path()).unwrap().unwrap();
        assert!(!package_json.depends_on_newrelic());
    }

    #[test]
    fn malformed_package_json() {
        let app_dir = app_dir_with_package_json("{\"dependencies\": ");

        assert!(matches!(
            PackageJson::read(app_dir.path()),
            Err(PackageJsonError::Parse(_))
        ));
    }
}
