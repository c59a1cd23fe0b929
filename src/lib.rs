pub mod cache;
pub mod cache_keys;
pub mod cli;
pub mod configuration;
pub mod controller;
pub mod error;
pub mod helpers;
pub mod model;
pub mod month;
pub mod palette;
pub mod provider;
pub mod query;
pub mod server;
pub mod types;
