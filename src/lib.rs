pub mod auth;
pub mod cli;
pub mod client;
pub mod config;
pub mod crypto;
pub mod errors;
pub mod logging;
pub mod storage;
pub mod vault;
