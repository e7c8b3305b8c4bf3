use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::claims::Claims;
use super::dto::{AuthResponse, RegisterRequest};
use super::jwt::JwtKeys;
use super::password::verify_password;
use crate::crud::Repository;
use crate::error::{AppError, AppResult};
use crate::users::repo_types::User;
use crate::users::services::UserService;

const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Registration, login and token handling.
#[derive(Clone)]
pub struct AuthService {
    users: UserService,
    keys: JwtKeys,
}

impl AuthService {
    pub fn new(users: UserService, keys: JwtKeys) -> Self {
        Self { users, keys }
    }

    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn register(&self, request: RegisterRequest) -> AppResult<AuthResponse> {
        let user = self.users.create_user(request.into_new_user()).await?;
        let token = self.generate_token(user.id)?;
        info!(user_id = %user.id, "user registered");
        Ok(AuthResponse { user, token })
    }

    /// Checks the password before the active flag: a wrong password on a
    /// deactivated account gets the same 401 as an unknown email.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> AppResult<AuthResponse> {
        let Some(user) = self.users.get_user_by_email(email).await? else {
            warn!("login unknown email");
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
        };

        if !verify_password(password, &user.password_hash)? {
            warn!(user_id = %user.id, "login invalid password");
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
        }

        if !user.is_active {
            warn!(user_id = %user.id, "login on deactivated account");
            return Err(AppError::Forbidden("Account is deactivated".into()));
        }

        let token = self.generate_token(user.id)?;
        info!(user_id = %user.id, "user logged in");
        Ok(AuthResponse { user, token })
    }

    pub fn generate_token(&self, user_id: Uuid) -> AppResult<String> {
        self.keys.sign(user_id)
    }

    pub fn verify_token(&self, token: &str) -> AppResult<Claims> {
        self.keys.verify(token)
    }

    /// Loads the account a verified token points at.
    pub async fn load_user(&self, user_id: Uuid) -> AppResult<Option<User>> {
        self.users.repository().find_by_id(&user_id).await
    }
}
