pub mod context;
pub mod db;
pub mod health;
pub mod middleware;
pub mod proxy;
pub mod session;
