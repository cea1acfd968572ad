// ABOUTME: Library root for bluegreen - exposes the coordinator and supporting types.
// ABOUTME: The main binary is in main.rs.

pub mod config;
pub mod coordinator;
pub mod diagnostics;
pub mod error;
pub mod output;
pub mod types;
