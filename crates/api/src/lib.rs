//! Library root for the `formcheck-api` crate.
//!
//! Exposes the HTTP building blocks (config, error handling, state, job
//! tracking, routes) so integration tests and the binary entrypoint can
//! both access them.

pub mod config;
pub mod error;
pub mod handlers;
pub mod jobs;
pub mod response;
pub mod router;
pub mod routes;
pub mod state;
pub mod upload;
