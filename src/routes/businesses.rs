use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};

use crate::{
    error::{AppError, AppResult},
    models::Business,
    response::ApiResponse,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/{slug}", get(get_business_by_slug))
}

/// Terminal boot: resolve the tenant behind a slug or subdomain label.
#[utoipa::path(
    get,
    path = "/api/businesses/{slug}",
    params(
        ("slug" = String, Path, description = "Business slug")
    ),
    responses(
        (status = 200, description = "Business", body = ApiResponse<Business>),
        (status = 404, description = "Unknown slug"),
    ),
    tag = "Businesses"
)]
pub async fn get_business_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<Json<ApiResponse<Business>>> {
    let business = sqlx::query_as::<_, Business>("SELECT * FROM businesses WHERE slug = $1")
        .bind(slug)
        .fetch_optional(&state.pool)
        .await?;

    let business = match business {
        Some(b) => b,
        None => return Err(AppError::NotFound),
    };

    Ok(Json(ApiResponse::success("Business", business, None)))
}
