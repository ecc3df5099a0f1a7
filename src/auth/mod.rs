//! Credential verification
//!
//! Stateless JWT verification that turns a bearer credential into the caller
//! identity used for all rate-limiting decisions.

mod verifier;

pub use verifier::{Claims, RejectReason, TokenVerifier};
