//! Aionyx billing service entry point.
//!
//! Loads configuration, connects to Postgres, wires the adapters into the
//! billing handlers and serves the HTTP API.

use std::sync::Arc;

use aionyx_billing::adapters::auth::ClerkSessionValidator;
use aionyx_billing::adapters::clerk::{ClerkConfig, ClerkIdentityAdapter};
use aionyx_billing::adapters::email::{ResendConfig, ResendEmailSender};
use aionyx_billing::adapters::http::{api_router, BillingAppState, HttpSettings};
use aionyx_billing::adapters::postgres::{
    PostgresPaymentRepository, PostgresSubscriptionRepository, PostgresUserRepository, MIGRATOR,
};
use aionyx_billing::adapters::stripe::{StripeConfig, StripePaymentAdapter};
use aionyx_billing::config::AppConfig;
use aionyx_billing::domain::billing::{StripeWebhookVerifier, SvixWebhookVerifier};
use aionyx_billing::ports::{IdentityProvider, SessionValidator};
use secrecy::ExposeSecret;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let config = AppConfig::load_validated()?;
    init_tracing(&config);

    tracing::info!(
        environment = ?config.server.environment,
        stripe_test_mode = config.payment.is_test_mode(),
        "Starting aionyx-billing"
    );

    let pool = config
        .database
        .pool_options()
        .connect(&config.database.url)
        .await?;
    tracing::info!("Database connection established");

    if config.database.run_migrations {
        MIGRATOR.run(&pool).await?;
        tracing::info!("Migrations applied");
    }

    let state = build_state(&config, pool)?;
    let settings = HttpSettings {
        cors_origins: config.server.cors_origins_list(),
        request_timeout: config.server.request_timeout(),
    };
    let app = api_router(state, &settings);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));
    let registry = tracing_subscriber::registry().with(filter);

    if config.is_production() {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer().pretty()).init();
    }
}

fn build_state(config: &AppConfig, pool: sqlx::PgPool) -> Result<BillingAppState, BoxError> {
    let stripe_verifier = Arc::new(StripeWebhookVerifier::new(
        config.payment.webhook_secret().expose_secret().as_str(),
    ));

    let clerk_verifier = match config.identity.webhook_secret() {
        Some(secret) => Some(Arc::new(SvixWebhookVerifier::new(secret.expose_secret())?)),
        None => {
            tracing::warn!("No Clerk webhook secret configured; identity webhooks will fail");
            None
        }
    };

    let session_validator: Arc<dyn SessionValidator> = match config.identity.jwt_key() {
        Some(pem) => Arc::new(ClerkSessionValidator::from_pem(
            &pem,
            config.identity.authorized_parties_list(),
        )?),
        None => {
            tracing::warn!("No Clerk JWT key configured; authenticated routes are disabled");
            Arc::new(ClerkSessionValidator::disabled())
        }
    };

    let identity_provider: Arc<dyn IdentityProvider> = match config.identity.secret_key() {
        Some(key) => Arc::new(ClerkIdentityAdapter::new(
            ClerkConfig::new(key).with_base_url(&config.identity.api_base_url),
        )?),
        None => Arc::new(ClerkIdentityAdapter::unconfigured()),
    };

    let payment_provider = StripePaymentAdapter::new(
        StripeConfig::new(config.payment.api_key())
            .with_base_url(&config.payment.api_base_url)
            .with_timeout(config.payment.request_timeout()),
    )?;

    let email_sender = ResendEmailSender::new(
        ResendConfig::new(
            config.email.api_key(),
            config.email.from_header(),
            &config.email.app_url,
        )
        .with_base_url(&config.email.api_base_url),
    )?;

    Ok(BillingAppState {
        stripe_verifier,
        clerk_verifier,
        user_repository: Arc::new(PostgresUserRepository::new(pool.clone())),
        subscription_repository: Arc::new(PostgresSubscriptionRepository::new(pool.clone())),
        payment_repository: Arc::new(PostgresPaymentRepository::new(pool)),
        payment_provider: Arc::new(payment_provider),
        identity_provider,
        email_sender: Arc::new(email_sender),
        session_validator,
    })
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown signal received"),
        Err(e) => tracing::error!("Failed to listen for shutdown signal: {}", e),
    }
}
