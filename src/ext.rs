//! Extension contracts for presenting tokens to resource servers.
//!
//! [`RequestSignerExt`] keeps the signing step independent of the HTTP client type;
//! [`AuthorizationSigner`] covers `http` and reqwest requests.

pub mod request_signer;

pub use request_signer::*;
