//! Core types and trait definitions for the Docket inward/outward register.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod entry;
pub mod error;
pub mod linkage;
pub mod notify;
pub mod reference;
pub mod stats;
pub mod status;
pub mod store;
pub mod team;

pub use error::{DomainError, Error, Result};
