//! Request authentication for the Atmosphere allocation service
//!
//! The service authenticates callers with AWS Signature Version 4. This crate
//! supplies the pieces the client needs to sign an outgoing request, without
//! knowing anything about allocations:
//!
//! 1. `default_chain()` loads the standard AWS credential chain (environment,
//!    shared profiles and SSO, web identity, container and instance metadata);
//!    `static_provider()` wraps a fixed set handed in by the host
//! 2. `SigV4Signer` binds a provider to a signing scope (region + service)
//! 3. The client calls `RequestSigner::sign()` on every `reqwest::Request`
//!    just before sending it

pub mod credentials;
pub mod error;
pub mod signer;

pub use credentials::{
    Credentials, ProvideCredentials, SharedCredentialsProvider, default_chain, static_provider,
};
pub use error::{Error, Result};
pub use signer::{RequestSigner, SigV4Signer, SigningScope};
