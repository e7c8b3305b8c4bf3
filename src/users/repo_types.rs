use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::response::FieldError;

pub const BIO_MAX_CHARS: usize = 500;

pub fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^\S+@\S+\.\S+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => f.write_str("user"),
            Self::Admin => f.write_str("admin"),
        }
    }
}

/// User record in the database.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // argon2 PHC string, never exposed
    pub age: Option<i32>,
    pub bio: Option<String>,
    pub role: Role,
    pub is_active: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Data for a new record. `password` is plain text; the store hashes it.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
    pub age: Option<i32>,
    pub bio: Option<String>,
    pub role: Role,
    pub is_active: bool,
}

impl NewUser {
    pub fn new(name: &str, email: &str, password: &str) -> Self {
        Self {
            name: name.trim().to_string(),
            email: normalize_email(email),
            password: password.to_string(),
            age: None,
            bio: None,
            role: Role::User,
            is_active: true,
        }
    }

    /// Schema rules checked before every insert.
    pub fn validate(&self) -> AppResult<()> {
        let mut errors = Vec::new();
        if self.name.trim().is_empty() {
            errors.push(FieldError::new("name", "Name is required"));
        }
        check_email(Some(&self.email), &mut errors);
        if self.password.is_empty() {
            errors.push(FieldError::new("password", "Password is required"));
        }
        check_profile(self.age, self.bio.as_deref(), &mut errors);
        finish(errors)
    }
}

/// Partial update. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    /// `Some(None)` clears the stored value.
    #[serde(default, deserialize_with = "nullable")]
    pub age: Option<Option<i32>>,
    #[serde(default, deserialize_with = "nullable")]
    pub bio: Option<Option<String>>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
}

/// Keeps an explicit `null` apart from an absent field.
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl UserPatch {
    pub fn normalized(mut self) -> Self {
        self.name = self.name.map(|n| n.trim().to_string());
        self.email = self.email.map(|e| normalize_email(&e));
        self
    }

    pub fn touches_privileges(&self) -> bool {
        self.role.is_some() || self.is_active.is_some()
    }

    pub fn validate(&self) -> AppResult<()> {
        let mut errors = Vec::new();
        if matches!(self.name.as_deref(), Some(n) if n.trim().is_empty()) {
            errors.push(FieldError::new("name", "Name is required"));
        }
        if self.email.is_some() {
            check_email(self.email.as_deref(), &mut errors);
        }
        if matches!(self.password.as_deref(), Some("")) {
            errors.push(FieldError::new("password", "Password is required"));
        }
        check_profile(
            self.age.flatten(),
            self.bio.as_ref().and_then(|b| b.as_deref()),
            &mut errors,
        );
        finish(errors)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UserFilter {
    pub email: Option<String>,
    pub role: Option<Role>,
    pub active: Option<bool>,
}

impl UserFilter {
    pub fn by_email(email: &str) -> Self {
        Self {
            email: Some(normalize_email(email)),
            ..Self::default()
        }
    }

    pub fn matches(&self, user: &User) -> bool {
        self.email.as_deref().map_or(true, |e| user.email == e)
            && self.role.map_or(true, |r| user.role == r)
            && self.active.map_or(true, |a| user.is_active == a)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UserSort {
    #[default]
    CreatedAt,
    Name,
    Email,
    Age,
}

impl UserSort {
    pub fn column(self) -> &'static str {
        match self {
            Self::CreatedAt => "created_at",
            Self::Name => "name",
            Self::Email => "email",
            Self::Age => "age",
        }
    }
}

fn check_email(email: Option<&str>, errors: &mut Vec<FieldError>) {
    match email {
        None | Some("") => errors.push(FieldError::new("email", "Email is required")),
        Some(e) if !is_valid_email(e) => {
            errors.push(FieldError::new("email", "Please provide a valid email"))
        }
        Some(_) => {}
    }
}

fn check_profile(age: Option<i32>, bio: Option<&str>, errors: &mut Vec<FieldError>) {
    if matches!(age, Some(a) if a < 0) {
        errors.push(FieldError::new("age", "Age must be a positive number"));
    }
    if matches!(bio, Some(b) if b.chars().count() > BIO_MAX_CHARS) {
        errors.push(FieldError::new("bio", "Bio cannot exceed 500 characters"));
    }
}

fn finish(errors: Vec<FieldError>) -> AppResult<()> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::validation(errors))
    }
}
