//! Credential config validation.

use super::model::CredentialConfig;

/// Validation error for a credential configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Email address is empty.
    EmptyEmail,
    /// Email address format is invalid.
    InvalidEmail,
    /// Gmail API host is empty.
    EmptyApiHost,
    /// Gmail API port is zero.
    InvalidApiPort,
    /// SMTP port is zero while an SMTP host is set.
    InvalidSmtpPort,
}

impl ValidationError {
    /// Get human-readable error message.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::EmptyEmail => "Email address is required",
            Self::InvalidEmail => "Invalid email address format",
            Self::EmptyApiHost => "API host is required",
            Self::InvalidApiPort => "API port must be 1-65535",
            Self::InvalidSmtpPort => "SMTP port must be 1-65535",
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ValidationError {}

/// Result of validating a credential configuration.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

fn validate_email(email: &str, errors: &mut Vec<ValidationError>) {
    if email.is_empty() {
        errors.push(ValidationError::EmptyEmail);
    } else if !email.contains('@') || email.starts_with('@') || email.ends_with('@') {
        errors.push(ValidationError::InvalidEmail);
    }
}

/// Validate a credential configuration.
///
/// # Errors
///
/// Returns all validation errors found, or `Ok(())` if valid.
pub fn validate_config(config: &CredentialConfig) -> ValidationResult {
    let mut errors = Vec::new();

    match config {
        CredentialConfig::MsGraph(cfg) => {
            validate_email(&cfg.email_address, &mut errors);
            if cfg.smtp_host.is_some() && cfg.smtp_port == Some(0) {
                errors.push(ValidationError::InvalidSmtpPort);
            }
        }
        CredentialConfig::GoogleApi(cfg) => {
            validate_email(&cfg.email_address, &mut errors);
            if cfg.host.is_empty() {
                errors.push(ValidationError::EmptyApiHost);
            }
            if cfg.port == 0 {
                errors.push(ValidationError::InvalidApiPort);
            }
        }
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;
    use crate::credential::{GoogleApiConfig, MsGraphConfig};

    #[test]
    fn valid_ms_graph_config() {
        let cfg = MsGraphConfig::new("a@example.com").into();
        assert!(validate_config(&cfg).is_ok());
    }

    #[test]
    fn empty_email_rejected() {
        let cfg = MsGraphConfig::new("").into();
        let errors = validate_config(&cfg).unwrap_err();
        assert!(errors.contains(&ValidationError::EmptyEmail));
    }

    #[test]
    fn email_without_at_rejected() {
        let cfg = MsGraphConfig::new("not-an-address").into();
        let errors = validate_config(&cfg).unwrap_err();
        assert!(errors.contains(&ValidationError::InvalidEmail));
    }

    #[test]
    fn google_config_requires_host_and_port() {
        let mut google = GoogleApiConfig::new("a@example.com");
        google.host = String::new();
        google.port = 0;
        let errors = validate_config(&google.into()).unwrap_err();
        assert!(errors.contains(&ValidationError::EmptyApiHost));
        assert!(errors.contains(&ValidationError::InvalidApiPort));
    }

    #[test]
    fn smtp_port_zero_rejected_when_host_set() {
        let mut cfg = MsGraphConfig::new("a@example.com");
        cfg.smtp_host = Some("smtp.example.com".into());
        cfg.smtp_port = Some(0);
        let errors = validate_config(&cfg.into()).unwrap_err();
        assert_eq!(errors, vec![ValidationError::InvalidSmtpPort]);
    }
}
