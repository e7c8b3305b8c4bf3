use serde::Deserialize;

use crate::crud::{PageRequest, SortOrder};
use crate::users::repo_types::{NewUser, Role, UserFilter, UserSort};

/// Query string of `GET /users`.
#[derive(Debug, Default, Deserialize)]
pub struct ListUsersQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub role: Option<Role>,
    pub active: Option<bool>,
    pub sort: Option<UserSort>,
    pub order: Option<SortOrder>,
}

impl ListUsersQuery {
    pub fn page_request(&self) -> PageRequest {
        PageRequest {
            page: self.page,
            limit: self.limit,
        }
    }

    pub fn filter(&self) -> UserFilter {
        UserFilter {
            email: None,
            role: self.role,
            active: self.active,
        }
    }

    pub fn sort(&self) -> Option<(UserSort, SortOrder)> {
        self.sort.map(|key| (key, self.order.unwrap_or_default()))
    }
}

/// Body of `POST /users` (admin create).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    pub age: Option<i32>,
    pub bio: Option<String>,
    #[serde(default)]
    pub role: Role,
    pub is_active: Option<bool>,
}

impl From<CreateUserRequest> for NewUser {
    fn from(req: CreateUserRequest) -> Self {
        let mut user = NewUser::new(&req.name, &req.email, &req.password);
        user.age = req.age;
        user.bio = req.bio;
        user.role = req.role;
        user.is_active = req.is_active.unwrap_or(true);
        user
    }
}
