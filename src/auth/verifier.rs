//! Core token verifier implementation

use crate::config::AuthConfig;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Claims carried by a verified credential
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the stable caller identity
    pub sub: String,
    /// Expiration timestamp (unix seconds)
    pub exp: u64,
    /// Issued-at timestamp (unix seconds)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<u64>,
    /// Issuer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
}

/// Reason a credential was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Credential is not a decodable token
    Malformed,
    /// Signature does not match the trusted secret
    InvalidSignature,
    /// Token expiry has passed
    Expired,
    /// A required claim is absent
    MissingClaim,
    /// Issuer claim does not match the expected issuer
    WrongIssuer,
    /// Subject claim is present but empty
    EmptySubject,
}

impl RejectReason {
    /// Stable reason code for error responses and logs
    pub fn code(&self) -> &'static str {
        match self {
            RejectReason::Malformed => "malformed_token",
            RejectReason::InvalidSignature => "invalid_signature",
            RejectReason::Expired => "token_expired",
            RejectReason::MissingClaim => "missing_claim",
            RejectReason::WrongIssuer => "wrong_issuer",
            RejectReason::EmptySubject => "empty_subject",
        }
    }
}

/// Verifies bearer credentials against the trusted secret
///
/// Verification is a pure function of the credential, the current time, and
/// the configured key material; no network calls and no per-request state.
#[derive(Clone)]
pub struct TokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenVerifier")
            .field("algorithm", &Algorithm::HS256)
            .field("decoding_key", &"[REDACTED]")
            .finish()
    }
}

impl TokenVerifier {
    /// Create a new verifier from the auth configuration
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = config.leeway_secs;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp", "sub"]);
        if let Some(issuer) = &config.issuer {
            validation.set_issuer(&[issuer]);
        }

        Self {
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
        }
    }

    /// Verify a credential and extract its claims
    ///
    /// Checks structure, signature, expiry (with configured leeway), and
    /// required claims, in that order inside the decoder. Any failure is
    /// terminal; there is no partial success.
    pub fn verify(&self, token: &str) -> Result<Claims, RejectReason> {
        let token_data =
            decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
                let reason = match e.kind() {
                    ErrorKind::InvalidSignature => RejectReason::InvalidSignature,
                    ErrorKind::ExpiredSignature => RejectReason::Expired,
                    ErrorKind::MissingRequiredClaim(_) => RejectReason::MissingClaim,
                    ErrorKind::InvalidIssuer => RejectReason::WrongIssuer,
                    _ => RejectReason::Malformed,
                };
                warn!("Credential rejected: {} ({})", reason.code(), e);
                reason
            })?;

        if token_data.claims.sub.is_empty() {
            warn!("Credential rejected: {}", RejectReason::EmptySubject.code());
            return Err(RejectReason::EmptySubject);
        }

        debug!("Credential verified for subject {}", token_data.claims.sub);
        Ok(token_data.claims)
    }
}
