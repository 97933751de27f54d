use std::sync::Arc;

use axum::{
    extract::{Extension, Query},
    http::header,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::json;

use hrms_auth::{explain_named, POLICIES};
use hrms_infra::rls;

use crate::app::dto::ExplainQuery;
use crate::app::services::AppServices;
use crate::context::ActorContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_policies))
        .route("/sql", get(policies_sql))
}

pub async fn list_policies() -> impl IntoResponse {
    Json(json!({ "items": POLICIES }))
}

pub async fn policies_sql() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        rls::render_policies(),
    )
}

/// Would the caller be allowed `action` on a row with these attributes?
///
/// Evaluated against a hypothetical row; the store is never read, so the
/// answer says nothing about whether such a row exists.
pub async fn explain(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
    Query(query): Query<ExplainQuery>,
) -> impl IntoResponse {
    let guarded = services.guarded(&ctx).await;
    Json(explain_named(guarded.actor(), &query.table, &query.action, &query.attrs()))
}
