#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![deny(warnings)]
#![allow(clippy::multiple_crate_versions)]

/// Version of the samlgate application
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod errors;
pub mod handlers;
pub mod models;
pub mod registry;
pub mod saml;
pub mod session;
pub mod settings;
pub mod users;
pub mod utils;
pub mod validation;

// Make test utilities available for both unit tests and integration tests
#[cfg(any(test, feature = "testing"))]
pub mod testing;

/// Re-export commonly used items
pub use errors::ServiceError;
pub use handlers::configure_routes;
pub use models::{IdentityProvider, User, UserRole};
pub use registry::{MemoryProviderStore, ProviderStore, SharedProviderStore};
pub use session::TokenIssuer;
pub use settings::SamlGateSettings;
pub use users::{MemoryUserStore, SharedUserStore, UserStore};
