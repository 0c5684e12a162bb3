pub mod config;
pub mod logging;

pub mod cleanup;
pub mod control;
pub mod expiry;
pub mod fetch;
pub mod manager;
pub mod progress;
pub mod store;
