//! Bearer credential validation.
//!
//! Credentials are compact JWS strings (`header.claims.signature`) signed with
//! a secret shared between the issuer and the gateway. Only the symmetric
//! HMAC family is accepted:
//!
//! ```text
//! HS256 | HS384 | HS512      -> signature, exp and nbf are checked
//! none | RS* | ES* | PS* ... -> rejected before any signature work
//! ```
//!
//! The declared algorithm is read from the raw header before the token is
//! handed to `jsonwebtoken`, so a token announcing `none` or an asymmetric
//! scheme fails with [`AuthError::UnexpectedAlgorithm`] even when its
//! signature happens to be an HMAC over the secret.
//!
//! # Example
//!
//! ```rust
//! use cue_rest_gateway::auth::{AuthError, TokenValidator};
//!
//! let validator = TokenValidator::from_secret("my-secret").unwrap();
//! let result = validator.validate("not-a-token");
//! assert!(matches!(result, Err(AuthError::Malformed(_))));
//! ```

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use jsonwebtoken::{errors::ErrorKind, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::ConfigError;

/// Signing algorithms a credential may declare.
pub const ACCEPTED_ALGORITHMS: [Algorithm; 3] =
    [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

// =============================================================================
// Secret
// =============================================================================

/// Shared HMAC secret used to verify credentials.
///
/// Loaded once at startup and shared read-only by every request. The bytes
/// never appear in `Debug` output.
#[derive(Clone)]
pub struct SigningSecret(Arc<[u8]>);

impl SigningSecret {
    pub fn new(bytes: impl AsRef<[u8]>) -> Self {
        Self(Arc::from(bytes.as_ref()))
    }

    /// Raw secret bytes.
    pub fn expose(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningSecret(<redacted>)")
    }
}

impl From<String> for SigningSecret {
    fn from(value: String) -> Self {
        Self(Arc::from(value.into_bytes()))
    }
}

// =============================================================================
// Claims and errors
// =============================================================================

/// Claims carried by a validated credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user or service identity)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    /// Expiry (Unix epoch seconds). Presence is enforced by the validator.
    #[serde(default)]
    pub exp: u64,

    /// Issued-at (Unix epoch seconds)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<u64>,

    /// Not-before (Unix epoch seconds)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<u64>,

    /// Issuer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
}

impl Claims {
    /// Whether the claims are internally consistent.
    ///
    /// A present subject must be non-empty and a present issued-at must not
    /// be later than the expiry.
    pub fn is_consistent(&self) -> bool {
        if matches!(self.sub.as_deref(), Some("")) {
            return false;
        }
        match self.iat {
            Some(iat) => iat <= self.exp,
            None => true,
        }
    }
}

/// Why a well-formed HMAC token was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invalidity {
    BadSignature,
    Expired,
    NotYetValid,
    MissingClaim(String),
    Other(String),
}

impl fmt::Display for Invalidity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Invalidity::BadSignature => write!(f, "signature is invalid"),
            Invalidity::Expired => write!(f, "token has expired"),
            Invalidity::NotYetValid => write!(f, "token is not valid yet"),
            Invalidity::MissingClaim(claim) => write!(f, "missing required claim '{}'", claim),
            Invalidity::Other(reason) => write!(f, "{}", reason),
        }
    }
}

/// Authentication failures. Every variant maps to HTTP 401.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// No `Authorization` header, or an empty one
    #[error("missing credential")]
    MissingCredential,

    /// Header does not use the `Bearer` scheme (strict policy only)
    #[error("credential must use the Bearer scheme")]
    UnsupportedScheme,

    /// Token is not a three-part JWS with a readable header
    #[error("malformed credential: {0}")]
    Malformed(String),

    /// Declared algorithm is outside the HMAC family
    #[error("unexpected signing method: {0}")]
    UnexpectedAlgorithm(String),

    /// Signature or time-based checks failed
    #[error("token is invalid or expired: {0}")]
    InvalidOrExpired(Invalidity),

    /// Token verified but its claims are inconsistent
    #[error("invalid credential")]
    InvalidCredential,
}

impl AuthError {
    /// Stable identifier used in log records.
    pub fn error_type(&self) -> &'static str {
        match self {
            AuthError::MissingCredential => "missing_credential",
            AuthError::UnsupportedScheme => "unsupported_scheme",
            AuthError::Malformed(_) => "malformed_credential",
            AuthError::UnexpectedAlgorithm(_) => "unexpected_algorithm",
            AuthError::InvalidOrExpired(Invalidity::Expired) => "credential_expired",
            AuthError::InvalidOrExpired(Invalidity::BadSignature) => "invalid_signature",
            AuthError::InvalidOrExpired(_) => "invalid_or_expired",
            AuthError::InvalidCredential => "invalid_credential",
        }
    }

    /// Whether the failure looks like tampering rather than an expected lapse.
    pub fn is_suspicious(&self) -> bool {
        matches!(
            self,
            AuthError::UnexpectedAlgorithm(_)
                | AuthError::InvalidOrExpired(Invalidity::BadSignature)
        )
    }
}

// =============================================================================
// Validator
// =============================================================================

/// Verifies credentials against one secret.
///
/// Cheap to clone; the key material is shared behind an `Arc`.
#[derive(Clone)]
pub struct TokenValidator {
    inner: Arc<ValidatorInner>,
}

struct ValidatorInner {
    key: DecodingKey,
    validation: Validation,
}

impl fmt::Debug for TokenValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenValidator")
            .field("algorithms", &self.inner.validation.algorithms)
            .finish_non_exhaustive()
    }
}

impl TokenValidator {
    /// Build a validator for the given secret. The secret must be non-empty.
    pub fn new(secret: &SigningSecret) -> Result<Self, ConfigError> {
        Self::from_secret(secret.expose())
    }

    /// Build a validator from raw secret bytes.
    pub fn from_secret(secret: impl AsRef<[u8]>) -> Result<Self, ConfigError> {
        let secret = secret.as_ref();
        if secret.is_empty() {
            return Err(ConfigError::MissingSecret);
        }

        Ok(Self {
            inner: Arc::new(ValidatorInner {
                key: DecodingKey::from_secret(secret),
                validation: hmac_validation(),
            }),
        })
    }

    /// Validate a raw token (no scheme prefix) and return its claims.
    pub fn validate(&self, token: &str) -> Result<Claims, AuthError> {
        if token.is_empty() {
            return Err(AuthError::Malformed("empty token".to_string()));
        }

        let declared = declared_algorithm(token)?;
        confine_algorithm(&declared)?;

        jsonwebtoken::decode::<Claims>(token, &self.inner.key, &self.inner.validation)
            .map(|data| data.claims)
            .map_err(classify)
    }
}

/// Validate `token` against `secret` in one call.
///
/// An empty secret never validates anything and yields
/// [`AuthError::InvalidCredential`].
pub fn validate_token(token: &str, secret: &[u8]) -> Result<Claims, AuthError> {
    let validator = TokenValidator::from_secret(secret).map_err(|_| AuthError::InvalidCredential)?;
    validator.validate(token)
}

fn hmac_validation() -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.algorithms = ACCEPTED_ALGORITHMS.to_vec();
    validation.leeway = 0;
    validation.validate_exp = true;
    validation.validate_nbf = true;
    validation.validate_aud = false;
    validation.set_required_spec_claims(&["exp"]);
    validation
}

#[derive(Deserialize)]
struct DeclaredHeader {
    alg: String,
}

/// Read the `alg` field from the token header without verifying anything.
fn declared_algorithm(token: &str) -> Result<String, AuthError> {
    let mut segments = token.split('.');
    let (Some(header), Some(_), Some(_), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(AuthError::Malformed(
            "expected three dot-separated segments".to_string(),
        ));
    };

    let raw = URL_SAFE_NO_PAD
        .decode(header)
        .map_err(|_| AuthError::Malformed("header is not base64url".to_string()))?;
    let header: DeclaredHeader = serde_json::from_slice(&raw)
        .map_err(|_| AuthError::Malformed("header has no alg field".to_string()))?;

    Ok(header.alg)
}

fn confine_algorithm(declared: &str) -> Result<Algorithm, AuthError> {
    match Algorithm::from_str(declared) {
        Ok(algorithm) if ACCEPTED_ALGORITHMS.contains(&algorithm) => Ok(algorithm),
        _ => Err(AuthError::UnexpectedAlgorithm(declared.to_string())),
    }
}

fn classify(err: jsonwebtoken::errors::Error) -> AuthError {
    match err.kind() {
        ErrorKind::InvalidSignature => AuthError::InvalidOrExpired(Invalidity::BadSignature),
        ErrorKind::ExpiredSignature => AuthError::InvalidOrExpired(Invalidity::Expired),
        ErrorKind::ImmatureSignature => AuthError::InvalidOrExpired(Invalidity::NotYetValid),
        ErrorKind::MissingRequiredClaim(claim) => {
            AuthError::InvalidOrExpired(Invalidity::MissingClaim(claim.clone()))
        }
        ErrorKind::InvalidToken
        | ErrorKind::Base64(_)
        | ErrorKind::Json(_)
        | ErrorKind::Utf8(_) => AuthError::Malformed(err.to_string()),
        _ => AuthError::InvalidOrExpired(Invalidity::Other(err.to_string())),
    }
}

// =============================================================================
// Tests
// =============================================================================
