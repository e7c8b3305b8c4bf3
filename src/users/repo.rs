use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::debug;
use uuid::Uuid;

use crate::auth::password::hash_password;
use crate::crud::{QueryOptions, Repository, SortOrder, UpdateOptions};
use crate::error::AppResult;
use crate::users::repo_types::{NewUser, User, UserFilter, UserPatch, UserSort};

/// User collection access. The email lookup is the only specialization over
/// the generic contract.
#[async_trait]
pub trait UserRepository:
    Repository<
    Entity = User,
    Id = Uuid,
    Create = NewUser,
    Update = UserPatch,
    Filter = UserFilter,
    SortKey = UserSort,
>
{
    /// Case-insensitive lookup.
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        self.find_one(&UserFilter::by_email(email)).await
    }
}

const SELECT_USERS: &str = r#"
    SELECT id, name, email, password_hash, age, bio, role, is_active, created_at, updated_at
    FROM users
"#;

pub struct PgUserRepository {
    db: PgPool,
}

impl PgUserRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &UserFilter) {
    qb.push(" WHERE TRUE");
    if let Some(email) = &filter.email {
        qb.push(" AND lower(email) = lower(").push_bind(email.clone()).push(")");
    }
    if let Some(role) = filter.role {
        qb.push(" AND role = ").push_bind(role);
    }
    if let Some(active) = filter.active {
        qb.push(" AND is_active = ").push_bind(active);
    }
}

#[async_trait]
impl Repository for PgUserRepository {
    type Entity = User;
    type Id = Uuid;
    type Create = NewUser;
    type Update = UserPatch;
    type Filter = UserFilter;
    type SortKey = UserSort;

    async fn create(&self, data: NewUser) -> AppResult<User> {
        data.validate()?;
        let hash = hash_password(&data.password)?;
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, password_hash, age, bio, role, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, name, email, password_hash, age, bio, role, is_active, created_at, updated_at
            "#,
        )
        .bind(&data.name)
        .bind(&data.email)
        .bind(&hash)
        .bind(data.age)
        .bind(&data.bio)
        .bind(data.role)
        .bind(data.is_active)
        .fetch_one(&self.db)
        .await?;
        debug!(user_id = %user.id, "user row inserted");
        Ok(user)
    }

    async fn find_all(
        &self,
        filter: &UserFilter,
        options: &QueryOptions<UserSort>,
    ) -> AppResult<Vec<User>> {
        let (key, order) = options
            .sort
            .unwrap_or((UserSort::CreatedAt, SortOrder::Desc));

        let mut qb = QueryBuilder::<Postgres>::new(SELECT_USERS);
        push_filter(&mut qb, filter);
        qb.push(format!(" ORDER BY {} {}, id", key.column(), order.as_sql()));
        if let Some(limit) = options.limit {
            qb.push(" LIMIT ").push_bind(limit);
        }
        if let Some(skip) = options.skip {
            qb.push(" OFFSET ").push_bind(skip);
        }

        let users = qb.build_query_as::<User>().fetch_all(&self.db).await?;
        Ok(users)
    }

    async fn find_by_id(&self, id: &Uuid) -> AppResult<Option<User>> {
        let mut qb = QueryBuilder::<Postgres>::new(SELECT_USERS);
        qb.push(" WHERE id = ").push_bind(*id);
        let user = qb.build_query_as::<User>().fetch_optional(&self.db).await?;
        Ok(user)
    }

    async fn find_one(&self, filter: &UserFilter) -> AppResult<Option<User>> {
        let mut qb = QueryBuilder::<Postgres>::new(SELECT_USERS);
        push_filter(&mut qb, filter);
        qb.push(" LIMIT 1");
        let user = qb.build_query_as::<User>().fetch_optional(&self.db).await?;
        Ok(user)
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

        let previous = if options.return_new {
            None
        } else {
            match self.find_by_id(id).await? {
                Some(user) => Some(user),
                None => return Ok(None),
            }
        };

        let password_hash = data.password.as_deref().map(hash_password).transpose()?;
        let updated = sqlx::query_as::<_, User>(
            r#"
            UPDATE users SET
                name = COALESCE($2, name),
                email = COALESCE($3, email),
                password_hash = COALESCE($4, password_hash),
                age = CASE WHEN $5 THEN $6 ELSE age END,
                bio = CASE WHEN $7 THEN $8 ELSE bio END,
                role = COALESCE($9, role),
                is_active = COALESCE($10, is_active),
                updated_at = now()
            WHERE id = $1
            RETURNING id, name, email, password_hash, age, bio, role, is_active, created_at, updated_at
            "#,
        )
        .bind(*id)
        .bind(data.name)
        .bind(data.email)
        .bind(password_hash)
        .bind(data.age.is_some())
        .bind(data.age.flatten())
        .bind(data.bio.is_some())
        .bind(data.bio.flatten())
        .bind(data.role)
        .bind(data.is_active)
        .fetch_optional(&self.db)
        .await?;

        if options.return_new {
            Ok(updated)
        } else {
            Ok(updated.and(previous))
        }
    }

    async fn delete_by_id(&self, id: &Uuid) -> AppResult<Option<User>> {
        let deleted = sqlx::query_as::<_, User>(
            r#"
            DELETE FROM users
            WHERE id = $1
            RETURNING id, name, email, password_hash, age, bio, role, is_active, created_at, updated_at
            "#,
        )
        .bind(*id)
        .fetch_optional(&self.db)
        .await?;
        Ok(deleted)
    }

    async fn count(&self, filter: &UserFilter) -> AppResult<i64> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM users");
        push_filter(&mut qb, filter);
        let total = qb.build_query_scalar::<i64>().fetch_one(&self.db).await?;
        Ok(total)
    }
}

impl UserRepository for PgUserRepository {}
