pub mod cookies;
pub mod crypto;
pub mod error_handler;
pub mod responses;
