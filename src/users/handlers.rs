use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    routing::get,
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::extractors::{authorize, AdminUser, AuthUser},
    crud::Page,
    error::{parse_id, AppResult},
    response::ApiResponse,
    state::AppState,
    users::{
        dto::{CreateUserRequest, ListUsersQuery},
        repo_types::{Role, User, UserPatch},
    },
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route(
            "/users/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
}

#[instrument(skip(state, _caller, query))]
pub async fn list_users(
    State(state): State<AppState>,
    _caller: AuthUser,
    query: Result<Query<ListUsersQuery>, QueryRejection>,
) -> AppResult<ApiResponse<Page<User>>> {
    let Query(query) = query?;
    let page = state
        .users
        .list(&query.filter(), query.page_request(), query.sort())
        .await?;
    Ok(ApiResponse::ok(page, "Users retrieved successfully"))
}

#[instrument(skip(state, _caller))]
pub async fn get_user(
    State(state): State<AppState>,
    _caller: AuthUser,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<User>> {
    let user = state.users.get_by_id(parse_id(&id)?).await?;
    Ok(ApiResponse::ok(user, "User retrieved successfully"))
}

#[instrument(skip(state, _admin, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    _admin: AdminUser,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> AppResult<ApiResponse<User>> {
    let Json(payload) = payload?;
    let user = state.users.create_user(payload.into()).await?;
    Ok(ApiResponse::created(user, "User created successfully"))
}

/// Users may edit their own profile; anything else, and any change to
/// role or active flag, needs an admin.
#[instrument(skip(state, caller, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(id): Path<String>,
    payload: Result<Json<UserPatch>, JsonRejection>,
) -> AppResult<ApiResponse<User>> {
    let id = parse_id(&id)?;
    let Json(patch) = payload?;
    if caller.id != id || patch.touches_privileges() {
        authorize(&caller, &[Role::Admin])?;
    }
    let user = state.users.update_by_id(id, patch).await?;
    Ok(ApiResponse::ok(user, "User updated successfully"))
}

#[instrument(skip(state, _admin))]
pub async fn delete_user(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<()>> {
    state.users.delete_by_id(parse_id(&id)?).await?;
    Ok(ApiResponse::empty("User deleted successfully"))
}
