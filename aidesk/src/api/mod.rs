//! REST backend access
//!
//! A single configured client shared by every store.

pub mod client;

pub use client::{ApiClient, NO_QUERY};
