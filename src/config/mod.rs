//! Service configuration.
//!
//! Everything is read from the process environment (plus an optional `.env`)
//! through the `config` and `dotenvy` crates. Variables carry the `AIONYX` prefix and
//! nested values are separated by a double underscore.
//!
//! # Example
//!
//! ```no_run
//! use aionyx_billing::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod database;
mod email;
mod error;
mod identity;
mod payment;
mod server;

pub use database::DatabaseConfig;
pub use email::EmailConfig;
pub use error::{ConfigError, ValidationError};
pub use identity::IdentityConfig;
pub use payment::PaymentConfig;
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

/// Every setting the billing service reads at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    pub database: DatabaseConfig,

    /// Stripe API and webhook credentials.
    pub payment: PaymentConfig,

    /// Clerk credentials. Optional so local runs can skip identity.
    #[serde(default)]
    pub identity: IdentityConfig,

    pub email: EmailConfig,
}

impl AppConfig {
    /// Reads `AIONYX__<SECTION>__<KEY>` variables, after loading `.env` if one exists.
    ///
    /// `AIONYX__SERVER__PORT=8080` becomes `server.port`, and
    /// `AIONYX__PAYMENT__STRIPE_WEBHOOK_SECRET` becomes `payment.stripe_webhook_secret`.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::Environment::default().prefix("AIONYX").separator("__"))
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Checks each section; identity rules depend on the environment.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.database.validate()?;
        self.payment.validate()?;
        self.identity.validate(&self.server.environment)?;
        self.email.validate()?;
        Ok(())
    }

    /// Load and validate in one step.
    pub fn load_validated() -> Result<Self, ConfigError> {
        let config = Self::load()?;
        config.validate()?;
        Ok(config)
    }

    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // env vars are process-global
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: &[&str] = &[
        "AIONYX__DATABASE__URL",
        "AIONYX__PAYMENT__STRIPE_API_KEY",
        "AIONYX__PAYMENT__STRIPE_WEBHOOK_SECRET",
        "AIONYX__EMAIL__RESEND_API_KEY",
        "AIONYX__IDENTITY__CLERK_WEBHOOK_SECRET",
        "AIONYX__SERVER__PORT",
        "AIONYX__SERVER__ENVIRONMENT",
    ];

    fn set_minimal_env() {
        env::set_var("AIONYX__DATABASE__URL", "postgresql://test@localhost/test");
        env::set_var("AIONYX__PAYMENT__STRIPE_API_KEY", "sk_test_xxx");
        env::set_var("AIONYX__PAYMENT__STRIPE_WEBHOOK_SECRET", "whsec_xxx");
        env::set_var("AIONYX__EMAIL__RESEND_API_KEY", "re_xxx");
    }

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn loads_sections_from_prefixed_variables() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        let config = result.expect("config should load");
        assert_eq!(config.database.url, "postgresql://test@localhost/test");
        assert_eq!(config.payment.stripe_webhook_secret, "whsec_xxx");
        assert!(config.identity.webhook_secret().is_none());
    }

    #[test]
    fn minimal_environment_passes_validation() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load_validated();
        clear_env();

        assert!(result.is_ok(), "{:?}", result.err());
    }

    #[test]
    fn server_section_falls_back_to_defaults() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.environment, Environment::Development);
        assert!(!config.is_production());
    }

    #[test]
    fn prefixed_variables_override_defaults() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        env::set_var("AIONYX__SERVER__PORT", "3000");
        env::set_var("AIONYX__SERVER__ENVIRONMENT", "production");
        env::set_var("AIONYX__IDENTITY__CLERK_WEBHOOK_SECRET", "whsec_abc");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.server.port, 3000);
        assert!(config.is_production());
        assert!(config.identity.webhook_secret().is_some());
    }

    #[test]
    fn missing_payment_and_email_sections_fail_load() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        env::set_var("AIONYX__DATABASE__URL", "postgresql://test@localhost/test");
        let result = AppConfig::load();
        clear_env();

        assert!(matches!(result, Err(ConfigError::LoadError(_))));
    }
}
