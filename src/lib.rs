//! pitchside — football schedule and highlights backend.
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod api;
pub mod config;
pub mod error;
pub mod proxy;
pub mod store;
pub mod sync;
pub mod types;
pub mod upstream;
pub mod window;
