use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch},
    Json, Router,
};
use serde_json::json;

use hrms_core::HierarchyId;

use crate::app::dto::{self, CompanyFilter, CreateEdgeRequest, UpdateEdgeRequest};
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::context::ActorContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_hierarchy).post(create_edge))
        .route("/:id", patch(update_edge).delete(delete_edge))
}

pub async fn list_hierarchy(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
    Query(filter): Query<CompanyFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let items = services
        .guarded(&ctx)
        .await
        .list_hierarchy(filter.company_id)
        .await?;
    Ok(Json(json!({ "items": items })))
}

pub async fn create_edge(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
    Json(body): Json<CreateEdgeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let edge = services
        .guarded(&ctx)
        .await
        .create_edge(body.employee_id, body.manager_id, body.company_id)
        .await?;
    Ok((StatusCode::CREATED, Json(edge)))
}

pub async fn update_edge(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
    Path(id): Path<String>,
    Json(body): Json<UpdateEdgeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let id: HierarchyId = dto::parse_id(&id)?;
    let edge = services.guarded(&ctx).await.update_edge(id, body.into()).await?;
    Ok(Json(edge))
}

pub async fn delete_edge(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id: HierarchyId = dto::parse_id(&id)?;
    services.guarded(&ctx).await.delete_edge(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
