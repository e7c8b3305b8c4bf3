use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, MeResponse, RegisterRequest},
        extractors::AuthUser,
    },
    error::AppResult,
    response::ApiResponse,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/me", get(get_me))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> AppResult<ApiResponse<AuthResponse>> {
    let Json(payload) = payload?;
    payload.validate()?;
    let result = state.auth.register(payload).await?;
    Ok(ApiResponse::created(result, "User registered successfully"))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> AppResult<ApiResponse<AuthResponse>> {
    let Json(payload) = payload?;
    payload.validate()?;
    let result = state.auth.login(&payload.email, &payload.password).await?;
    Ok(ApiResponse::ok(result, "Login successful"))
}

#[instrument(skip_all)]
pub async fn get_me(AuthUser(user): AuthUser) -> ApiResponse<MeResponse> {
    ApiResponse::ok(
        MeResponse { user },
        "User profile retrieved successfully",
    )
}
