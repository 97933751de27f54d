use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::json;

use hrms_core::DepartmentId;

use crate::app::dto::{self, CompanyFilter, CreateDepartmentRequest, RenameDepartmentRequest};
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::context::ActorContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_departments).post(create_department))
        .route(
            "/:id",
            get(get_department)
                .patch(rename_department)
                .delete(delete_department),
        )
}

pub async fn list_departments(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
    Query(filter): Query<CompanyFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let items = services
        .guarded(&ctx)
        .await
        .list_departments(filter.company_id)
        .await?;
    Ok(Json(json!({ "items": items })))
}

pub async fn get_department(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id: DepartmentId = dto::parse_id(&id)?;
    let department = services.guarded(&ctx).await.department(id).await?;
    Ok(Json(department))
}

pub async fn create_department(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
    Json(body): Json<CreateDepartmentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let department = services
        .guarded(&ctx)
        .await
        .create_department(body.company_id, &body.name)
        .await?;
    Ok((StatusCode::CREATED, Json(department)))
}

pub async fn rename_department(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
    Path(id): Path<String>,
    Json(body): Json<RenameDepartmentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let id: DepartmentId = dto::parse_id(&id)?;
    let department = services
        .guarded(&ctx)
        .await
        .rename_department(id, &body.name)
        .await?;
    Ok(Json(department))
}

pub async fn delete_department(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id: DepartmentId = dto::parse_id(&id)?;
    services.guarded(&ctx).await.delete_department(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
