//! Core types and trait definitions for the deepfake trainer store.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod artifact;
pub mod deployment;
pub mod error;
pub mod filter;
pub mod scope;
pub mod settings;
pub mod stats;
pub mod store;
pub mod trainer;

pub use error::{Error, Result};
