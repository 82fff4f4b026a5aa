//! HTTP API handlers for resonance-pg

pub mod generate;
pub mod health;

pub use generate::playlist_routes;
pub use health::health_routes;
