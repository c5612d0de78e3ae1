//! Exchange credentials, loaded once at startup and owned immutably
//! thereafter by the `AuthSession`.

use std::path::Path;

use serde::Deserialize;

use crate::environment::Environment;
use crate::error::Error;

/// Login credentials for one exchange environment. Immutable after load.
#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub advanced_api: bool,
}

#[derive(Debug, Deserialize)]
struct CredentialsFile {
    demo: Option<Credentials>,
    prod: Option<Credentials>,
}

/// Load credentials for `env` from `path` (normally `./credentials.yaml`).
pub fn load_credentials(path: &Path, env: Environment) -> Result<Credentials, Error> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        Error::config(format!(
            "could not read credentials file {}: {e}",
            path.display()
        ))
    })?;

    let file: CredentialsFile = serde_yaml::from_str(&contents)?;

    let creds = match env {
        Environment::Demo => file.demo,
        Environment::Prod => file.prod,
    };

    creds.ok_or_else(|| {
        Error::config(format!(
            "no credentials block for environment {env:?} in {}",
            path.display()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_demo_block() {
        let mut file = tempfile_with(
            "demo:\n  email: a@b.com\n  password: hunter2\n  advanced_api: true\nprod:\n  email: c@d.com\n  password: x\n  advanced_api: false\n",
        );
        let path = file.path().to_path_buf();
        file.flush().unwrap();

        let creds = load_credentials(&path, Environment::Demo).unwrap();
        assert_eq!(creds.email, "a@b.com");
        assert!(creds.advanced_api);
    }

    #[test]
    fn missing_environment_block_is_config_error() {
        let mut file = tempfile_with("demo:\n  email: a@b.com\n  password: hunter2\n");
        let path = file.path().to_path_buf();
        file.flush().unwrap();

        let err = load_credentials(&path, Environment::Prod).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn missing_file_is_config_error() {
        let err = load_credentials(Path::new("/nonexistent/credentials.yaml"), Environment::Demo)
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    fn tempfile_with(contents: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        f
    }
}
