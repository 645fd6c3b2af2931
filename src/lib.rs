// ABOUTME: Library root for deployd - exposes the deployer core and server for testing.
// ABOUTME: The main binary is in main.rs.

pub mod config;
pub mod deployer;
pub mod error;
pub mod runtime;
pub mod server;
