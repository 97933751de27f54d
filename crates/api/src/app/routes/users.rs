use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::json;

use hrms_core::{ProfileUpdate, UserId};

use crate::app::dto::{self, CompanyFilter};
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::context::ActorContext;

/// Users are created by the identity provider (seeded), never over HTTP.
pub fn router() -> Router {
    Router::new()
        .route("/", get(list_users))
        .route("/:id", get(get_user).patch(update_profile))
}

pub async fn list_users(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
    Query(filter): Query<CompanyFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let items = services.guarded(&ctx).await.list_users(filter.company_id).await?;
    Ok(Json(json!({ "items": items })))
}

pub async fn get_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id: UserId = dto::parse_id(&id)?;
    let user = services.guarded(&ctx).await.user(id).await?;
    Ok(Json(user))
}

pub async fn update_profile(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
    Path(id): Path<String>,
    Json(body): Json<ProfileUpdate>,
) -> Result<impl IntoResponse, ApiError> {
    let id: UserId = dto::parse_id(&id)?;
    let user = services.guarded(&ctx).await.update_profile(id, &body).await?;
    Ok(Json(user))
}
