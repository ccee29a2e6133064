//! Link sharing GraphQL service
//! Re-exports modules for testing and integration

pub mod config;
pub mod context;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod schema;
