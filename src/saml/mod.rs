//! SAML 2.0 Service Provider plumbing
//!
//! `strategy` holds the per-request handshake configuration (AuthnRequest
//! generation and response verification); `metadata` publishes this
//! gateway's SP descriptor for IdP-side configuration.

pub mod metadata;
pub mod strategy;

pub use metadata::generate_sp_metadata;
pub use strategy::{LoginRedirect, SamlAssertionData, SamlStrategy, StrategyError};
