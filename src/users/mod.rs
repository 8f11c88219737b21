//! Local user accounts: the store seam and JIT identity resolution

pub mod resolver;
pub mod store;

pub use resolver::{find_or_create_user, ResolvedUser, ResolverError};
pub use store::{MemoryUserStore, NewUser, SharedUserStore, UserStore, UserStoreError};
