use std::sync::Arc;

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};

use hrms_auth::authorize::ActorState;

use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::context::ActorContext;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

/// The caller as the row policies see them, plus their own profile row
/// (`null` when it does not exist; store failures are a 500).
pub async fn me(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
) -> Result<impl IntoResponse, ApiError> {
    let guarded = services.guarded(&ctx).await;
    let profile = guarded.own_profile().await?;

    Ok(Json(serde_json::json!({
        "actor": ActorState::from(guarded.actor()),
        "profile": profile,
    })))
}
