//! Brix Processing Library
//!
//! Image resize/re-encode pipeline applied to image uploads before they are
//! persisted by a storage backend.

pub mod image;

pub use crate::image::{optimize, OptimizedImage, ProcessingError};
