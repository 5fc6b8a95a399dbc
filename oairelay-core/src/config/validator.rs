//! Extended settings validation

use super::env::referenced_vars;
use super::error::ValidationError;
use super::schema::ClientSettings;
use regex::Regex;

/// Runs [`ClientSettings::validate`] plus format checks on the domain,
/// the key and the resulting base URL
pub struct ConfigValidator {
    /// Matches a host with an optional port
    domain_pattern: Regex,
}

impl Default for ConfigValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigValidator {
    pub fn new() -> Self {
        Self {
            domain_pattern: Regex::new(r"^[A-Za-z0-9.\-\[\]:]+$").unwrap(),
        }
    }

    pub fn validate(&self, settings: &ClientSettings) -> Result<(), ValidationError> {
        settings.validate()?;

        self.validate_domain(&settings.domain)?;
        self.validate_api_key(settings)?;
        self.validate_base_url(settings)?;

        Ok(())
    }

    fn validate_domain(&self, domain: &str) -> Result<(), ValidationError> {
        if domain.contains("://") {
            return Err(ValidationError::invalid_format(
                "domain",
                "must not include a scheme",
            )
            .with_context("use the `scheme` field instead"));
        }

        if domain.contains('/') {
            return Err(ValidationError::invalid_format(
                "domain",
                "must not include a path",
            ));
        }

        if !self.domain_pattern.is_match(domain) {
            return Err(ValidationError::invalid_format(
                "domain",
                format!("'{}' is not a host name", domain),
            ));
        }

        Ok(())
    }

    fn validate_api_key(&self, settings: &ClientSettings) -> Result<(), ValidationError> {
        let key = settings.api_key.expose_secret();
        if key.trim().is_empty() {
            return Err(ValidationError::required("api_key"));
        }

        if let Some(var) = referenced_vars(key).first() {
            return Err(ValidationError::invalid_format(
                "api_key",
                format!("unresolved environment variable '{}'", var),
            ));
        }

        Ok(())
    }

    fn validate_base_url(&self, settings: &ClientSettings) -> Result<(), ValidationError> {
        let base_url = settings.base_url();
        match url::Url::parse(&base_url) {
            Ok(url) if url.host_str().is_some() => Ok(()),
            Ok(_) => Err(ValidationError::invalid_url("domain", "URL has no host")),
            Err(e) => Err(ValidationError::invalid_url("domain", e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::error::ValidationErrorKind;

    #[test]
    fn test_accepts_host_and_port() {
        let validator = ConfigValidator::new();
        assert!(validator
            .validate(&ClientSettings::openai("api.openai.com", "sk-test"))
            .is_ok());
        assert!(validator
            .validate(&ClientSettings::openai("127.0.0.1:8080", "sk-test"))
            .is_ok());
    }

    #[test]
    fn test_rejects_scheme_or_path_in_domain() {
        let validator = ConfigValidator::new();

        let err = validator
            .validate(&ClientSettings::openai("https://api.openai.com", "sk-test"))
            .unwrap_err();
        assert_eq!(err.field_path, "domain");
        assert!(matches!(err.kind, ValidationErrorKind::InvalidFormat { .. }));

        let err = validator
            .validate(&ClientSettings::openai("api.openai.com/v1", "sk-test"))
            .unwrap_err();
        assert_eq!(err.field_path, "domain");
    }

    #[test]
    fn test_rejects_unresolved_key_reference() {
        let validator = ConfigValidator::new();
        let err = validator
            .validate(&ClientSettings::openai("api.openai.com", "${OPENAI_API_KEY}"))
            .unwrap_err();
        assert_eq!(err.field_path, "api_key");
    }

    #[test]
    fn test_rejects_blank_key() {
        let validator = ConfigValidator::new();
        let err = validator
            .validate(&ClientSettings::openai("api.openai.com", "   "))
            .unwrap_err();
        assert!(matches!(err.kind, ValidationErrorKind::RequiredFieldMissing));
    }
}
