use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get},
    Json, Router,
};
use serde_json::json;

use hrms_core::CompanyAdminId;

use crate::app::dto::{self, CompanyFilter, GrantAdminRequest};
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::context::ActorContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_company_admins).post(grant_admin))
        .route("/:id", delete(revoke_admin))
}

pub async fn list_company_admins(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
    Query(filter): Query<CompanyFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let items = services
        .guarded(&ctx)
        .await
        .list_company_admins(filter.company_id)
        .await?;
    Ok(Json(json!({ "items": items })))
}

pub async fn grant_admin(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
    Json(body): Json<GrantAdminRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let grant = services
        .guarded(&ctx)
        .await
        .grant_admin(body.user_id, body.company_id)
        .await?;
    Ok((StatusCode::CREATED, Json(grant)))
}

pub async fn revoke_admin(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id: CompanyAdminId = dto::parse_id(&id)?;
    services.guarded(&ctx).await.revoke_admin(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
