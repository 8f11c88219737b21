//! Unified testing utilities for SamlGate
//!
//! Consolidates test fixtures shared between unit tests and the
//! integration suite.
//!
//! ## Organization
//!
//! - [`fixtures`] - Pre-built test data (settings, providers, users, tokens)

pub mod fixtures;

// Re-export commonly used items for convenience
pub use fixtures::TestFixtures;

/// Common test constants
pub mod constants {
    /// Default test email address
    pub const TEST_EMAIL: &str = "test@example.com";

    /// Default test IdP entity ID
    pub const TEST_IDP_ENTITY_ID: &str = "https://idp.example.com";

    /// Default test IdP SSO URL
    pub const TEST_IDP_SSO_URL: &str = "https://idp.example.com/sso";

    /// Session secret used by test settings
    pub const TEST_SESSION_SECRET: &str = "test-session-secret-for-samlgate-tests";
}
