//! Server module for Onsa
//!
//! # Module Structure
//!
//! - `config`: Configuration structures
//! - `loader`: Configuration loading from files and environment
//! - `validation`: Production configuration warnings
//! - `shutdown`: SIGINT/SIGTERM handling
//! - `init`: Agent registration, server startup and run loop

pub mod config;
mod init;
mod loader;
mod shutdown;
mod validation;

pub use init::run;
pub use loader::load_config;
