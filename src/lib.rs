pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod flags;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod server;
pub mod store;
pub mod users;
pub mod validation;

#[cfg(test)]
pub mod testing;

pub use api::{ApiRequest, ApiResponse};
pub use router::{FlagRouter, RouterOptions};
