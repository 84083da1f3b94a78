//! Email configuration

use secrecy::SecretString;
use serde::Deserialize;

use super::error::ValidationError;

/// Email configuration (Resend)
#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    /// Resend API key
    pub resend_api_key: String,

    /// From email address
    #[serde(default = "default_from_email")]
    pub from_email: String,

    /// From name
    #[serde(default = "default_from_name")]
    pub from_name: String,

    /// Public application URL used for links in email bodies
    #[serde(default = "default_app_url")]
    pub app_url: String,

    /// Resend API base URL
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
}

impl EmailConfig {
    /// Get formatted "From" header value
    pub fn from_header(&self) -> String {
        format!("{} <{}>", self.from_name, self.from_email)
    }

    pub fn api_key(&self) -> SecretString {
        SecretString::new(self.resend_api_key.clone())
    }

    /// Validate email configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.resend_api_key.is_empty() {
            return Err(ValidationError::MissingRequired("EMAIL__RESEND_API_KEY"));
        }
        if !self.resend_api_key.starts_with("re_") {
            return Err(ValidationError::InvalidResendKey);
        }
        if !self.from_email.contains('@') {
            return Err(ValidationError::InvalidFromEmail);
        }
        if !self.app_url.starts_with("http://") && !self.app_url.starts_with("https://") {
            return Err(ValidationError::InvalidUrl("EMAIL__APP_URL"));
        }
        Ok(())
    }
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            resend_api_key: String::new(),
            from_email: default_from_email(),
            from_name: default_from_name(),
            app_url: default_app_url(),
            api_base_url: default_api_base_url(),
        }
    }
}

fn default_from_email() -> String {
    "noreply@aionyx.ai".to_string()
}

fn default_from_name() -> String {
    "Aionyx".to_string()
}

fn default_app_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_api_base_url() -> String {
    "https://api.resend.com".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_config_defaults() {
        let config = EmailConfig::default();
        assert_eq!(config.from_email, "noreply@aionyx.ai");
        assert_eq!(config.from_header(), "Aionyx <noreply@aionyx.ai>");
        assert_eq!(config.app_url, "http://localhost:3000");
    }

    #[test]
    fn test_validation_missing_api_key() {
        assert_eq!(
            EmailConfig::default().validate(),
            Err(ValidationError::MissingRequired("EMAIL__RESEND_API_KEY"))
        );
    }

    #[test]
    fn test_validation_invalid_api_key_prefix() {
        let config = EmailConfig {
            resend_api_key: "sk_xxx".to_string(),
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidResendKey));
    }

    #[test]
    fn test_validation_invalid_from_email() {
        let config = EmailConfig {
            resend_api_key: "re_xxx".to_string(),
            from_email: "invalid-email".to_string(),
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidFromEmail));
    }

    #[test]
    fn test_validation_app_url_scheme() {
        let config = EmailConfig {
            resend_api_key: "re_xxx".to_string(),
            app_url: "aionyx.ai".to_string(),
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::InvalidUrl("EMAIL__APP_URL"))
        );
    }
}
