use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use tracing::{debug, warn};

use crate::error::AppError;
use crate::state::AppState;
use crate::users::repo_types::{Role, User};

const MISSING_TOKEN: &str = "Not authorized to access this route. Please login.";
const INVALID_TOKEN: &str = "Not authorized. Invalid or expired token.";

/// Authenticated, active account behind the request's bearer token.
pub struct AuthUser(pub User);

/// `AuthUser` that also holds the admin role.
pub struct AdminUser(pub User);

/// Token from `Authorization: Bearer <token>`, if present.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))?
        .trim();
    (!token.is_empty()).then_some(token)
}

/// Role gate; must run after authentication.
pub fn authorize(user: &User, roles: &[Role]) -> Result<(), AppError> {
    if roles.contains(&user.role) {
        Ok(())
    } else {
        warn!(user_id = %user.id, role = %user.role, "role not authorized");
        Err(AppError::Forbidden(format!(
            "User role '{}' is not authorized to access this route",
            user.role
        )))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)
            .ok_or_else(|| AppError::Unauthorized(MISSING_TOKEN.into()))?;

        let claims = state
            .auth
            .verify_token(token)
            .map_err(|_| AppError::Unauthorized(INVALID_TOKEN.into()))?;

        let user = state
            .auth
            .load_user(claims.sub)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))?;

        if !user.is_active {
            warn!(user_id = %user.id, "deactivated account used a valid token");
            return Err(AppError::Forbidden("Account is deactivated".into()));
        }

        debug!(user_id = %user.id, "request authenticated");
        Ok(AuthUser(user))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let AuthUser(user) = AuthUser::from_request_parts(parts, state).await?;
        authorize(&user, &[Role::Admin])?;
        Ok(AdminUser(user))
    }
}
