//! Core types for ShelfSync — error taxonomy, configuration, credential codec.

pub mod codec;
pub mod config;
pub mod error;

pub use config::ShelfSyncConfig;
pub use error::{Error, Result};
