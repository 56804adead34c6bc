//! Brix Core Library
//!
//! This crate provides the domain models, error types, configuration, and
//! document access policy shared across all Brix components.

pub mod config;
pub mod error;
pub mod models;
pub mod policy;
pub mod storage_types;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use policy::{
    classify, is_file_type_allowed, policy_for, select_preset, FileClass, FileTypePolicy,
    ImageOptions, ImageOutputFormat, OptimizePreset,
};
pub use storage_types::StorageStrategy;
