//! Client settings loading and validation
//!
//! Settings files are YAML or JSON. `${NAME}` references are replaced with
//! environment variable values before parsing.

mod env;
mod error;
mod schema;
mod secrets;
mod validator;

pub use env::interpolate_env_vars;
pub use error::{ConfigError, ConfigResult, ValidationError, ValidationErrorKind};
pub use schema::{ClientSettings, ConfiguredClient, ProviderKind};
pub use secrets::{SafeLogging, SecretString};
pub use validator::ConfigValidator;

use std::fs;
use std::path::Path;
use tracing::debug;

fn read_interpolated(path: &Path) -> ConfigResult<String> {
    let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
        path: path.to_string_lossy().to_string(),
        source: e,
    })?;

    env::interpolate_env_vars(&content)
}

fn finish(mut settings: ClientSettings, path: &Path) -> ConfigResult<ClientSettings> {
    env::interpolate_settings_env_vars(&mut settings)?;

    ConfigValidator::new().validate(&settings)?;
    debug!(
        "Loaded client settings from {}: {}",
        path.display(),
        settings.safe_for_logging()
    );
    Ok(settings)
}

/// Load client settings from a YAML file
pub fn load_from_yaml<P: AsRef<Path>>(path: P) -> ConfigResult<ClientSettings> {
    let path = path.as_ref();
    let interpolated = read_interpolated(path)?;

    let settings: ClientSettings =
        serde_yaml::from_str(&interpolated).map_err(|e| ConfigError::ParseError {
            path: path.to_string_lossy().to_string(),
            line: e.location().map(|l| l.line()),
            column: e.location().map(|l| l.column()),
            message: e.to_string(),
        })?;

    finish(settings, path)
}

/// Load client settings from a JSON file
pub fn load_from_json<P: AsRef<Path>>(path: P) -> ConfigResult<ClientSettings> {
    let path = path.as_ref();
    let interpolated = read_interpolated(path)?;

    let settings: ClientSettings =
        serde_json::from_str(&interpolated).map_err(|e| ConfigError::ParseError {
            path: path.to_string_lossy().to_string(),
            line: Some(e.line()),
            column: Some(e.column()),
            message: e.to_string(),
        })?;

    finish(settings, path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file() {
        let result = load_from_yaml("/nonexistent/oairelay.yaml");
        assert!(matches!(result, Err(ConfigError::IoError { .. })));
    }

    #[test]
    fn test_parse_azure_yaml() {
        let yaml = r#"
provider: azure
domain: contoso.openai.azure.com
api_key: azure-key
deployment: gpt-4o-mini
api_version: "2024-06-01"
max_retries: 1
retry_after_ms: 250
"#;
        let settings: ClientSettings = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(settings.provider, ProviderKind::Azure);
        assert_eq!(settings.api_version.as_deref(), Some("2024-06-01"));
        assert!(ConfigValidator::new().validate(&settings).is_ok());
    }
}
