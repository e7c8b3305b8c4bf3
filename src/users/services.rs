use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::crud::{CrudService, Page, PageRequest, SortOrder, UpdateOptions};
use crate::error::{AppError, AppResult};
use crate::users::repo::UserRepository;
use crate::users::repo_types::{NewUser, User, UserFilter, UserPatch, UserSort};

/// User rules on top of the generic CRUD service.
#[derive(Clone)]
pub struct UserService {
    crud: CrudService<dyn UserRepository>,
}

impl UserService {
    pub fn new(repo: Arc<dyn UserRepository>) -> Self {
        Self {
            crud: CrudService::new(repo),
        }
    }

    pub fn repository(&self) -> &dyn UserRepository {
        self.crud.repository()
    }

    pub async fn get_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        self.repository().find_by_email(email).await
    }

    pub async fn create_user(&self, data: NewUser) -> AppResult<User> {
        if self.get_user_by_email(&data.email).await?.is_some() {
            warn!(email = %data.email, "email already registered");
            return Err(AppError::Conflict(
                "User with this email already exists".into(),
            ));
        }
        let user = self.crud.create(data).await?;
        info!(user_id = %user.id, "user created");
        Ok(user)
    }

    pub async fn list(
        &self,
        filter: &UserFilter,
        page: PageRequest,
        sort: Option<(UserSort, SortOrder)>,
    ) -> AppResult<Page<User>> {
        self.crud.get_all(filter, page, sort).await
    }

    pub async fn get_by_id(&self, id: Uuid) -> AppResult<User> {
        self.crud.get_by_id(&id).await
    }

    pub async fn update_by_id(&self, id: Uuid, patch: UserPatch) -> AppResult<User> {
        let user = self
            .crud
            .update_by_id(&id, patch, UpdateOptions::default())
            .await?;
        info!(user_id = %user.id, "user updated");
        Ok(user)
    }

    pub async fn delete_by_id(&self, id: Uuid) -> AppResult<User> {
        let user = self.crud.delete_by_id(&id).await?;
        info!(user_id = %user.id, "user deleted");
        Ok(user)
    }

    pub async fn exists(&self, filter: &UserFilter) -> AppResult<bool> {
        self.crud.exists(filter).await
    }

    pub async fn count(&self, filter: &UserFilter) -> AppResult<i64> {
        self.crud.count(filter).await
    }
}
