//! Persistent storage for extracted project records

pub mod database;

pub use database::{InsightRow, InsightsDb};
