//! Exchange adapter: credentials and REST dispatch.

pub mod auth;
pub mod client;
pub mod types;

pub use auth::{webhook_secret_from_env, ExchangeCredentials};
pub use client::ExchangeRestClient;
