//! # Resonance Common Library
//!
//! Shared code for the Resonance services:
//! - Error and result types
//! - Bootstrap configuration (TOML file, environment, built-in defaults)
//! - The `SongRecord` model exchanged with the presentation layer

pub mod config;
pub mod error;
pub mod models;

pub use error::{Error, Result};
pub use models::SongRecord;
