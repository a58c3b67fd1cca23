//! Credential checking for inbound requests.
//!
//! - [`token`] validates signed JWT credentials against the shared secret
//! - [`gate`] wraps the combined handler so only authenticated requests reach it

pub mod gate;
pub mod token;

pub use gate::{AuthGate, AuthGateLayer, BearerPolicy};
pub use token::{
    validate_token, AuthError, Claims, Invalidity, SigningSecret, TokenValidator,
    ACCEPTED_ALGORITHMS,
};
