use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Brix API",
        description = "Project document storage and secure access for the Brix co-investment platform"
    ),
    paths(
        crate::handlers::health::health,
        crate::handlers::document_upload::upload_document,
        crate::handlers::document_list::list_documents,
        crate::handlers::document_get::get_document,
        crate::handlers::document_delete::delete_document,
        crate::handlers::document_access::document_access,
        crate::handlers::secure_file::secure_file,
    ),
    components(schemas(
        brix_core::models::ProjectDocument,
        brix_core::models::Project,
        brix_core::models::DocumentView,
        brix_core::models::DocumentWithProject,
        brix_core::models::SignedAccess,
        brix_core::models::DocumentType,
        brix_core::models::AccessLevel,
        brix_core::models::SecurityLevel,
        crate::handlers::document_upload::UploadResponse,
        crate::handlers::document_list::ListResponse,
        crate::handlers::document_get::GetResponse,
        crate::handlers::document_delete::DeleteResponse,
        crate::handlers::document_access::AccessResponse,
        crate::error::ErrorResponse,
    )),
    tags(
        (name = "documents", description = "Project document management and delivery"),
        (name = "system", description = "Service health")
    )
)]
pub struct ApiDoc;
