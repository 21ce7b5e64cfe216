//! # casemap common library
//!
//! Shared code for the casemap services:
//! - Error type
//! - TOML configuration and config file resolution
//! - Logging initialization
//! - SQLite database initialization and reference catalogs

pub mod config;
pub mod db;
pub mod error;
pub mod logging;

pub use error::{Error, Result};
