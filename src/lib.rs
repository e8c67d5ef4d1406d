pub mod aggregate;
pub mod cache;
pub mod classify;
pub mod config;
pub mod engine;
pub mod horizon;
pub mod library;
pub mod render;
pub mod report;
pub mod scoring;
pub mod spotify;

/// Application name for XDG paths
pub const APP_NAME: &str = "deepcut";
