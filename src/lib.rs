pub mod auth;
pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod gateway;
pub mod queue;
pub mod server;
pub mod services;
pub mod storage;
pub mod types;
pub mod worker;

#[cfg(test)]
pub mod testing;
