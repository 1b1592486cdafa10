// src/services/mod.rs
pub mod request;
pub mod upload;
