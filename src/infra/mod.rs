pub mod bank;
pub mod config;
