// src/lib.rs

// Re-export or define the top-level modules you need
pub mod chart;
pub mod config;
pub mod models;
pub mod services;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;
