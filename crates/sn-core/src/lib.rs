pub mod auth;
pub mod config;
pub mod db;
pub mod http;
pub mod logging;
pub mod metrics;
pub mod migrations;
pub mod password;
pub mod rate_limit;
pub mod server;
