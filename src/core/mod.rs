//! Core business logic module
//!
//! This module contains the playlist models, the sync pipeline from remote
//! fetch to local store, and the presentation and launch logic on top of it.

pub mod config;
pub mod fetcher;
pub mod launcher;
pub mod mapping;
pub mod models;
pub mod presenter;
pub mod runtime;
pub mod status;
pub mod store;
pub mod sync;

#[cfg(test)]
mod test_support;


// Re-export commonly used types
pub use config::AppConfig;
pub use sync::SyncCoordinator;
