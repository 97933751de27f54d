use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::json;

use hrms_core::CompanyId;

use crate::app::dto::{self, CreateCompanyRequest, UpdateCompanyRequest};
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::context::ActorContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_companies).post(create_company))
        .route(
            "/:id",
            get(get_company).patch(update_company).delete(delete_company),
        )
}

pub async fn list_companies(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
) -> Result<impl IntoResponse, ApiError> {
    let items = services.guarded(&ctx).await.list_companies().await?;
    Ok(Json(json!({ "items": items })))
}

pub async fn get_company(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id: CompanyId = dto::parse_id(&id)?;
    let company = services.guarded(&ctx).await.company(id).await?;
    Ok(Json(company))
}

pub async fn create_company(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
    Json(body): Json<CreateCompanyRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let company = services
        .guarded(&ctx)
        .await
        .create_company(&body.name, body.access_time)
        .await?;
    Ok((StatusCode::CREATED, Json(company)))
}

pub async fn update_company(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
    Path(id): Path<String>,
    Json(body): Json<UpdateCompanyRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let id: CompanyId = dto::parse_id(&id)?;
    let company = services
        .guarded(&ctx)
        .await
        .update_company(id, body.into())
        .await?;
    Ok(Json(company))
}

pub async fn delete_company(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id: CompanyId = dto::parse_id(&id)?;
    services.guarded(&ctx).await.delete_company(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
