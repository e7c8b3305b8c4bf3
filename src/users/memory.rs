//! In-memory user repository used by tests

use std::cmp::Ordering;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::auth::password::hash_password;
use crate::crud::{QueryOptions, Repository, SortOrder, UpdateOptions};
use crate::error::{AppError, AppResult};
use crate::users::repo::UserRepository;
use crate::users::repo_types::{NewUser, User, UserFilter, UserPatch, UserSort};

/// Keeps insertion order so unsorted reads are deterministic.
#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    users: RwLock<Vec<User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn compare(a: &User, b: &User, key: UserSort) -> Ordering {
    match key {
        UserSort::CreatedAt => a.created_at.cmp(&b.created_at),
        UserSort::Name => a.name.cmp(&b.name),
        UserSort::Email => a.email.cmp(&b.email),
        UserSort::Age => a.age.cmp(&b.age),
    }
}

fn email_taken(users: &[User], email: &str, except: Option<Uuid>) -> bool {
    users
        .iter()
        .any(|u| Some(u.id) != except && u.email.eq_ignore_ascii_case(email))
}

#[async_trait]
impl Repository for InMemoryUserRepository {
    type Entity = User;
    type Id = Uuid;
    type Create = NewUser;
    type Update = UserPatch;
    type Filter = UserFilter;
    type SortKey = UserSort;

    async fn create(&self, data: NewUser) -> AppResult<User> {
        data.validate()?;
        let mut users = self.users.write().await;
        if email_taken(&users, &data.email, None) {
            return Err(AppError::Conflict("email already exists".into()));
        }
        let now = OffsetDateTime::now_utc();
        let user = User {
            id: Uuid::new_v4(),
            name: data.name,
            email: data.email,
            password_hash: hash_password(&data.password)?,
            age: data.age,
            bio: data.bio,
            role: data.role,
            is_active: data.is_active,
            created_at: now,
            updated_at: now,
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn find_all(
        &self,
        filter: &UserFilter,
        options: &QueryOptions<UserSort>,
    ) -> AppResult<Vec<User>> {
        let users = self.users.read().await;
        let mut matched: Vec<User> = users.iter().filter(|u| filter.matches(u)).cloned().collect();

        if let Some((key, order)) = options.sort {
            matched.sort_by(|a, b| match order {
                SortOrder::Asc => compare(a, b, key),
                SortOrder::Desc => compare(b, a, key),
            });
        }

        let skip = options.skip.unwrap_or(0).max(0) as usize;
        let limit = options.limit.map_or(usize::MAX, |l| l.max(0) as usize);
        Ok(matched.into_iter().skip(skip).take(limit).collect())
    }

    async fn find_by_id(&self, id: &Uuid) -> AppResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.id == *id).cloned())
    }

    async fn find_one(&self, filter: &UserFilter) -> AppResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| filter.matches(u)).cloned())
    }

    async fn update_by_id(
        &self,
        id: &Uuid,
        data: UserPatch,
        options: UpdateOptions,
    ) -> AppResult<Option<User>> {
        let data = data.normalized();
        if options.run_validators {
            data.validate()?;
        }
        let password_hash = data.password.as_deref().map(hash_password).transpose()?;

        let mut users = self.users.write().await;
        if let Some(email) = data.email.as_deref() {
            if email_taken(&users, email, Some(*id)) {
                return Err(AppError::Conflict("email already exists".into()));
            }
        }
        let Some(user) = users.iter_mut().find(|u| u.id == *id) else {
            return Ok(None);
        };

        let previous = user.clone();
        if let Some(name) = data.name {
            user.name = name;
        }
        if let Some(email) = data.email {
            user.email = email;
        }
        if let Some(hash) = password_hash {
            user.password_hash = hash;
        }
        if let Some(age) = data.age {
            user.age = age;
        }
        if let Some(bio) = data.bio {
            user.bio = bio;
        }
        if let Some(role) = data.role {
            user.role = role;
        }
        if let Some(active) = data.is_active {
            user.is_active = active;
        }
        user.updated_at = OffsetDateTime::now_utc();

        Ok(Some(if options.return_new { user.clone() } else { previous }))
    }

    async fn delete_by_id(&self, id: &Uuid) -> AppResult<Option<User>> {
        let mut users = self.users.write().await;
        let idx = users.iter().position(|u| u.id == *id);
        Ok(idx.map(|i| users.remove(i)))
    }

    async fn count(&self, filter: &UserFilter) -> AppResult<i64> {
        let users = self.users.read().await;
        Ok(users.iter().filter(|u| filter.matches(u)).count() as i64)
    }
}

impl UserRepository for InMemoryUserRepository {}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(name: &str, email: &str) -> NewUser {
        NewUser::new(name, email, "Password123")
    }

    #[tokio::test]
    async fn create_hashes_password() {
        let repo = InMemoryUserRepository::new();
        let user = repo.create(new_user("Ahmed", "ahmed@example.com")).await.unwrap();
        assert_ne!(user.password_hash, "Password123");
        assert!(crate::auth::password::verify_password("Password123", &user.password_hash).unwrap());
    }

    #[tokio::test]
    async fn duplicate_email_conflicts_regardless_of_case() {
        let repo = InMemoryUserRepository::new();
        repo.create(new_user("Ahmed", "ahmed@example.com")).await.unwrap();
        let err = repo
            .create(new_user("Other", "AHMED@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(repo.count(&UserFilter::default()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn find_by_email_ignores_case() {
        let repo = InMemoryUserRepository::new();
        let created = repo.create(new_user("Sara", "sara@example.com")).await.unwrap();
        let found = repo.find_by_email("Sara@Example.com").await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
        assert!(repo.find_by_email("nobody@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn find_all_sorts_skips_and_limits() {
        let repo = InMemoryUserRepository::new();
        for name in ["carol", "alice", "bob", "dave"] {
            repo.create(new_user(name, &format!("{name}@example.com")))
                .await
                .unwrap();
        }
        let options = QueryOptions::default()
            .sorted(UserSort::Name, SortOrder::Asc)
            .page(1, 2);
        let names: Vec<_> = repo
            .find_all(&UserFilter::default(), &options)
            .await
            .unwrap()
            .into_iter()
            .map(|u| u.name)
            .collect();
        assert_eq!(names, ["bob", "carol"]);
    }

    #[tokio::test]
    async fn update_can_return_previous_version() {
        let repo = InMemoryUserRepository::new();
        let user = repo.create(new_user("Old", "old@example.com")).await.unwrap();
        let patch = UserPatch {
            name: Some("New".into()),
            ..UserPatch::default()
        };
        let options = UpdateOptions {
            return_new: false,
            ..UpdateOptions::default()
        };
        let before = repo.update_by_id(&user.id, patch, options).await.unwrap().unwrap();
        assert_eq!(before.name, "Old");
        let after = repo.find_by_id(&user.id).await.unwrap().unwrap();
        assert_eq!(after.name, "New");
    }

    #[tokio::test]
    async fn update_skips_validation_when_asked() {
        let repo = InMemoryUserRepository::new();
        let user = repo.create(new_user("Kim", "kim@example.com")).await.unwrap();
        let patch = UserPatch {
            age: Some(Some(-5)),
            ..UserPatch::default()
        };
        assert!(repo
            .update_by_id(&user.id, patch.clone(), UpdateOptions::default())
            .await
            .is_err());
        let relaxed = UpdateOptions {
            run_validators: false,
            ..UpdateOptions::default()
        };
        let updated = repo.update_by_id(&user.id, patch, relaxed).await.unwrap().unwrap();
        assert_eq!(updated.age, Some(-5));
    }

    #[tokio::test]
    async fn delete_returns_removed_entity_once() {
        let repo = InMemoryUserRepository::new();
        let user = repo.create(new_user("Gone", "gone@example.com")).await.unwrap();
        assert!(repo.delete_by_id(&user.id).await.unwrap().is_some());
        assert!(repo.delete_by_id(&user.id).await.unwrap().is_none());
        assert!(!repo.exists(&UserFilter::by_email("gone@example.com")).await.unwrap());
    }
}
