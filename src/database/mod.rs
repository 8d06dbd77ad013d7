pub mod connector;
pub mod models;

#[allow(unused_imports)]
pub use connector::{connect_with_settings, ping, DB};
