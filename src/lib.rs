//! ghfolio library
//!
//! A terminal portfolio page backed by a cache-first GitHub fetcher that
//! serves stale data when a refresh fails.

pub mod analytics;
pub mod app;
pub mod cache;
pub mod cli;
pub mod config;
pub mod github;
pub mod logging;
pub mod ui;
pub mod view;
