//! aidesk library
//!
//! Client-side state layer of the aidesk AI chat assistant: a shared REST
//! client, six observable stores, and the commands that orchestrate them.

pub mod api;
pub mod app;
pub mod commands;
pub mod config;
pub mod error;
pub mod models;
pub mod secret;
pub mod storage;
pub mod stores;
