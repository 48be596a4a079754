//! Domain models
//!
//! Rust structs mirroring the backend's JSON resources.
//! All models use serde; timestamps are UTC.

pub mod activity;
pub mod project;
pub mod provider;
pub mod session;
pub mod settings;
pub mod template;

pub use activity::*;
pub use project::*;
pub use provider::*;
pub use session::*;
pub use settings::*;
pub use template::*;
