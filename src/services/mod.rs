pub mod identity_api;
pub mod session;
