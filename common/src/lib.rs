//! Shared building blocks for the service catalog.
//!
//! Holds the data models, the error type, configuration loading, request
//! extractors and middleware used by the catalog service.

pub mod config;
pub mod errors;
pub mod extract;
pub mod middleware;
pub mod models;
pub mod response;
pub mod utils;
