//! Brix DB Library
//!
//! Postgres repositories for projects, project documents, and document view
//! audit records.

pub mod db;

pub use db::document::{DocumentFilter, DocumentRepository, NewDocument};
pub use db::project::ProjectRepository;
pub use db::view::DocumentViewRepository;
