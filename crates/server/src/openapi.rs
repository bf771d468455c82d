use std::collections::BTreeMap;

use utoipa::OpenApi;
use utoipa::ToSchema;

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String }

/// Any stored record: `id` plus arbitrary fields.
#[derive(ToSchema)]
pub struct DocumentDoc {
    pub id: String,
    #[schema(value_type = Object)]
    pub fields: BTreeMap<String, String>,
}

#[derive(ToSchema)]
#[schema(rename_all = "camelCase")]
pub struct PaginationDoc {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u64,
    pub has_next: bool,
    pub has_prev: bool,
}

#[derive(ToSchema)]
pub struct PageDoc {
    pub data: Vec<DocumentDoc>,
    pub pagination: PaginationDoc,
}

#[derive(ToSchema)]
pub struct MutationDoc { pub success: bool, pub data: DocumentDoc }

#[derive(ToSchema)]
pub struct DeleteDoc { pub success: bool, pub message: String }

#[derive(ToSchema)]
pub struct CountDoc { pub count: u64 }

#[derive(ToSchema)]
pub struct ErrorDoc { pub error: String }

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::services::list,
        crate::routes::services::count,
        crate::routes::services::get,
        crate::routes::services::create,
        crate::routes::services::update,
        crate::routes::services::delete,
        crate::routes::prices::list,
        crate::routes::prices::count,
        crate::routes::prices::get,
        crate::routes::prices::create,
        crate::routes::prices::update,
        crate::routes::prices::delete,
        crate::routes::collections::list,
        crate::routes::collections::documents,
        crate::routes::jacto_users::list,
        crate::routes::jacto_users::get,
        crate::routes::jacto_users::update,
        crate::routes::jacto_users::delete,
    ),
    components(
        schemas(
            HealthResponse,
            DocumentDoc,
            PaginationDoc,
            PageDoc,
            MutationDoc,
            DeleteDoc,
            CountDoc,
            ErrorDoc,
        )
    ),
    tags(
        (name = "health"),
        (name = "services"),
        (name = "prices"),
        (name = "collections"),
        (name = "users")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_resource_path() {
        let doc = ApiDoc::openapi();
        for path in ["/services", "/services/{id}", "/prices/count", "/collections/{id}", "/jacto-users"] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
