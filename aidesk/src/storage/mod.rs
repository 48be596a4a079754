//! Storage module
//!
//! Durable client-local storage for selection state and user activity.

pub mod local_store;

pub use local_store::{LocalStorage, Persist};
