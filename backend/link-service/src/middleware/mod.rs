//! Link service middleware

pub mod jwt;

pub use jwt::{BearerAuth, Viewer};
