use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::response::FieldError;
use crate::users::repo_types::{is_valid_email, NewUser, User, BIO_MAX_CHARS};

pub const NAME_MIN_CHARS: usize = 3;
pub const PASSWORD_MIN_CHARS: usize = 8;

/// Request body for user registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    pub age: Option<i32>,
    pub bio: Option<String>,
}

impl RegisterRequest {
    pub fn validate(&self) -> AppResult<()> {
        let mut errors = Vec::new();

        if self.name.trim().chars().count() < NAME_MIN_CHARS {
            errors.push(FieldError::new(
                "name",
                "Name must be at least 3 characters long",
            ));
        }
        if !is_valid_email(self.email.trim()) {
            errors.push(FieldError::new("email", "Please provide a valid email"));
        }
        if !is_strong_password(&self.password) {
            errors.push(FieldError::new(
                "password",
                "Password must be at least 8 characters and contain an uppercase letter, a lowercase letter and a number",
            ));
        }
        if matches!(self.age, Some(a) if a < 0) {
            errors.push(FieldError::new("age", "Age must be a positive number"));
        }
        if matches!(&self.bio, Some(b) if b.chars().count() > BIO_MAX_CHARS) {
            errors.push(FieldError::new("bio", "Bio cannot exceed 500 characters"));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::validation(errors))
        }
    }

    pub fn into_new_user(self) -> NewUser {
        let mut user = NewUser::new(&self.name, &self.email, &self.password);
        user.age = self.age;
        user.bio = self.bio;
        user
    }
}

fn is_strong_password(password: &str) -> bool {
    password.chars().count() >= PASSWORD_MIN_CHARS
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_digit())
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl LoginRequest {
    pub fn validate(&self) -> AppResult<()> {
        let mut errors = Vec::new();
        if !is_valid_email(self.email.trim()) {
            errors.push(FieldError::new("email", "Please provide a valid email"));
        }
        if self.password.is_empty() {
            errors.push(FieldError::new("password", "Password is required"));
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::validation(errors))
        }
    }
}

/// Returned after register and login.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: User,
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: User,
}
