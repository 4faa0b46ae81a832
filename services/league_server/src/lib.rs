pub mod auth;
pub mod config;
pub mod export;
pub mod integrity;
pub mod metrics;
pub mod report;
pub mod results;
pub mod scorers;
pub mod standings;
pub mod store;
pub mod types;
pub mod utils;
pub mod web;
