// ABOUTME: Library root for the conducto launcher - exposes public modules.
// ABOUTME: The main binary is in main.rs.

pub mod api;
pub mod config;
pub mod error;
pub mod launch;
pub mod pipeline;
pub mod platform;
pub mod runtime;
pub mod types;
