//! Webhook error types shared by the payment and identity webhooks.
//!
//! Every failure a webhook delivery can hit maps to exactly one HTTP status,
//! and the status is what drives the sender's retry policy:
//! - 2xx: acknowledged, no retry
//! - 4xx: malformed or unauthenticated input, no retry
//! - 5xx: downstream failure, the sender re-delivers

use axum::http::StatusCode;
use thiserror::Error;

use crate::domain::foundation::{DomainError, ErrorCode};

/// Errors that occur during webhook processing.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// A required signature header was not sent.
    #[error("Missing header: {0}")]
    MissingHeaders(&'static str),

    /// Webhook signature verification failed.
    #[error("Invalid signature")]
    InvalidSignature,

    /// Signed timestamp is older than the replay window.
    #[error("Timestamp out of range")]
    TimestampOutOfRange,

    /// Signed timestamp is unparseable or too far in the future.
    #[error("Invalid timestamp")]
    InvalidTimestamp,

    /// Failed to parse the signature header or the JSON body.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// A field the event kind cannot be processed without is absent.
    #[error("Missing field: {0}")]
    MissingField(&'static str),

    /// Event was intentionally ignored (not an error condition).
    #[error("Event ignored: {0}")]
    Ignored(String),

    /// The shared secret for this sender is not configured.
    #[error("Webhook not configured: {0}")]
    Misconfigured(&'static str),

    /// Persistence failed.
    #[error("Database error: {0}")]
    Database(String),

    /// The payment processor could not be reached or rejected a request.
    #[error("Provider error: {0}")]
    Provider(String),
}

impl WebhookError {
    /// Returns true if the sender should retry delivering this webhook.
    pub fn is_retryable(&self) -> bool {
        matches!(self, WebhookError::Database(_) | WebhookError::Provider(_))
    }

    /// Maps the error to an HTTP status code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            WebhookError::MissingHeaders(_)
            | WebhookError::InvalidSignature
            | WebhookError::TimestampOutOfRange
            | WebhookError::InvalidTimestamp
            | WebhookError::ParseError(_)
            | WebhookError::MissingField(_) => StatusCode::BAD_REQUEST,

            WebhookError::Ignored(_) => StatusCode::OK,

            WebhookError::Misconfigured(_)
            | WebhookError::Database(_)
            | WebhookError::Provider(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code for response bodies.
    pub fn code(&self) -> &'static str {
        match self {
            WebhookError::MissingHeaders(_) => "MISSING_HEADERS",
            WebhookError::InvalidSignature => "INVALID_SIGNATURE",
            WebhookError::TimestampOutOfRange => "TIMESTAMP_OUT_OF_RANGE",
            WebhookError::InvalidTimestamp => "INVALID_TIMESTAMP",
            WebhookError::ParseError(_) => "PARSE_ERROR",
            WebhookError::MissingField(_) => "MISSING_FIELD",
            WebhookError::Ignored(_) => "IGNORED",
            WebhookError::Misconfigured(_) => "MISCONFIGURED",
            WebhookError::Database(_) => "DATABASE_ERROR",
            WebhookError::Provider(_) => "PROVIDER_ERROR",
        }
    }
}

impl From<DomainError> for WebhookError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::ValidationFailed | ErrorCode::EmptyField | ErrorCode::InvalidFormat => {
                WebhookError::ParseError(err.message)
            }
            ErrorCode::PaymentProviderError | ErrorCode::IdentityProviderError => {
                WebhookError::Provider(err.to_string())
            }
            _ => WebhookError::Database(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ══════════════════════════════════════════════════════════════
    // Error Display Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn missing_headers_displays_header_name() {
        let err = WebhookError::MissingHeaders("svix-id");
        assert_eq!(format!("{}", err), "Missing header: svix-id");
    }

    #[test]
    fn invalid_signature_displays_correctly() {
        assert_eq!(format!("{}", WebhookError::InvalidSignature), "Invalid signature");
    }

    #[test]
    fn missing_field_displays_field_name() {
        let err = WebhookError::MissingField("data.id");
        assert_eq!(format!("{}", err), "Missing field: data.id");
    }

    // ══════════════════════════════════════════════════════════════
    // Status Code Mapping Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn verification_failures_are_bad_request() {
        for err in [
            WebhookError::MissingHeaders("Stripe-Signature"),
            WebhookError::InvalidSignature,
            WebhookError::TimestampOutOfRange,
            WebhookError::InvalidTimestamp,
        ] {
            assert_eq!(err.status_code(), StatusCode::BAD_REQUEST, "{}", err);
        }
    }

    #[test]
    fn malformed_body_is_bad_request() {
        assert_eq!(
            WebhookError::ParseError("eof".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            WebhookError::MissingField("type").status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn ignored_is_ok() {
        let err = WebhookError::Ignored("unknown".into());
        assert_eq!(err.status_code(), StatusCode::OK);
    }

    #[test]
    fn downstream_failures_are_server_errors() {
        assert_eq!(
            WebhookError::Database("pool timeout".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            WebhookError::Provider("503".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            WebhookError::Misconfigured("clerk webhook secret").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    // ══════════════════════════════════════════════════════════════
    // Retryability Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn only_downstream_failures_are_retryable() {
        assert!(WebhookError::Database("x".into()).is_retryable());
        assert!(WebhookError::Provider("x".into()).is_retryable());
        assert!(!WebhookError::InvalidSignature.is_retryable());
        assert!(!WebhookError::Misconfigured("x").is_retryable());
        assert!(!WebhookError::Ignored("x".into()).is_retryable());
    }

    // ══════════════════════════════════════════════════════════════
    // Conversion Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn database_domain_error_becomes_database() {
        let err: WebhookError = DomainError::database("connection reset").into();
        assert!(matches!(err, WebhookError::Database(_)));
    }

    #[test]
    fn missing_user_becomes_retryable_database_error() {
        let err: WebhookError =
            DomainError::new(ErrorCode::ReferencedUserMissing, "no user u1").into();
        assert!(err.is_retryable());
    }

    #[test]
    fn validation_domain_error_becomes_parse_error() {
        let err: WebhookError = DomainError::validation("user_id", "empty").into();
        assert!(matches!(err, WebhookError::ParseError(_)));
    }

    #[test]
    fn provider_domain_error_becomes_provider() {
        let err: WebhookError =
            DomainError::new(ErrorCode::PaymentProviderError, "timeout").into();
        assert!(matches!(err, WebhookError::Provider(_)));
    }
}
