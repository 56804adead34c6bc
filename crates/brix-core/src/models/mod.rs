pub mod document;
pub mod project;
pub mod view;

pub use document::{
    AccessLevel, DocumentMetadata, DocumentType, DocumentWithProject, ProjectDocument,
    SecurityLevel, SignedAccess, StoredFile,
};
pub use project::Project;
pub use view::DocumentView;
