//! Identity-provider session token validation.
//!
//! Session tokens are short-lived RS256 JWTs. They are verified offline
//! against the instance's PEM public key, so no network call is made per
//! request. Validated claims:
//! - **Signature** against the configured key
//! - **Expiry (exp)** and **not-before (nbf)** with a small leeway
//! - **Authorized party (azp)** when a list of allowed origins is configured

use async_trait::async_trait;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{AuthError, AuthenticatedUser, UserId};
use crate::ports::SessionValidator;

/// Allowed clock drift when checking exp/nbf.
const LEEWAY_SECS: u64 = 5;

/// Claims read from a session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    pub exp: u64,
    #[serde(default)]
    pub nbf: Option<u64>,
    #[serde(default)]
    pub sid: Option<String>,
    #[serde(default)]
    pub azp: Option<String>,
}

/// `SessionValidator` backed by a PEM public key.
pub struct ClerkSessionValidator {
    key: Option<DecodingKey>,
    authorized_parties: Vec<String>,
}

impl ClerkSessionValidator {
    /// Creates a validator from a PEM-encoded RSA public key.
    pub fn from_pem(pem: &str, authorized_parties: Vec<String>) -> Result<Self, AuthError> {
        let key = DecodingKey::from_rsa_pem(pem.as_bytes()).map_err(|e| {
            tracing::error!(error = %e, "Session JWT key is not a valid RSA PEM");
            AuthError::service_unavailable("invalid session key")
        })?;
        Ok(Self {
            key: Some(key),
            authorized_parties,
        })
    }

    /// A validator that rejects every token because no key is configured.
    pub fn disabled() -> Self {
        Self {
            key: None,
            authorized_parties: Vec::new(),
        }
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.leeway = LEEWAY_SECS;
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.set_required_spec_claims(&["exp", "sub"]);
        validation
    }
}

#[async_trait]
impl SessionValidator for ClerkSessionValidator {
    async fn validate(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        let key = self
            .key
            .as_ref()
            .ok_or_else(|| AuthError::service_unavailable("session key not configured"))?;

        let data = decode::<SessionClaims>(token, key, &self.validation()).map_err(|e| {
            use jsonwebtoken::errors::ErrorKind;
            match e.kind() {
                ErrorKind::ExpiredSignature => {
                    tracing::debug!("Session token expired");
                    AuthError::TokenExpired
                }
                _ => {
                    tracing::warn!(error = %e, "Session token validation failed");
                    AuthError::InvalidToken
                }
            }
        })?;
        let claims = data.claims;

        if !self.authorized_parties.is_empty() {
            let allowed = claims
                .azp
                .as_ref()
                .is_some_and(|azp| self.authorized_parties.iter().any(|p| p == azp));
            if !allowed {
                tracing::warn!(azp = ?claims.azp, "Session token from unauthorized party");
                return Err(AuthError::InvalidToken);
            }
        }

        let user_id = UserId::new(&claims.sub).map_err(|_| AuthError::InvalidToken)?;
        Ok(AuthenticatedUser::new(user_id, claims.sid))
    }
}

impl std::fmt::Debug for ClerkSessionValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClerkSessionValidator")
            .field("configured", &self.key.is_some())
            .field("authorized_parties", &self.authorized_parties)
            .finish()
    }
}
