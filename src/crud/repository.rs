use async_trait::async_trait;
use serde::Deserialize;

use crate::error::AppResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Recognized options for `find_all`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryOptions<K> {
    pub sort: Option<(K, SortOrder)>,
    pub limit: Option<i64>,
    pub skip: Option<i64>,
}

impl<K> Default for QueryOptions<K> {
    fn default() -> Self {
        Self {
            sort: None,
            limit: None,
            skip: None,
        }
    }
}

impl<K> QueryOptions<K> {
    pub fn sorted(mut self, key: K, order: SortOrder) -> Self {
        self.sort = Some((key, order));
        self
    }

    pub fn page(mut self, skip: i64, limit: i64) -> Self {
        self.skip = Some(skip);
        self.limit = Some(limit);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateOptions {
    /// Return the entity as it is after the update instead of before it.
    pub return_new: bool,
    pub run_validators: bool,
}

impl Default for UpdateOptions {
    fn default() -> Self {
        Self {
            return_new: true,
            run_validators: true,
        }
    }
}

/// CRUD over a single entity collection. Every method is one independent
/// store operation.
#[async_trait]
pub trait Repository: Send + Sync {
    type Entity: Send + Sync;
    type Id: Send + Sync;
    type Create: Send;
    type Update: Send;
    type Filter: Default + Send + Sync;
    type SortKey: Copy + Send + Sync;

    async fn create(&self, data: Self::Create) -> AppResult<Self::Entity>;

    async fn find_all(
        &self,
        filter: &Self::Filter,
        options: &QueryOptions<Self::SortKey>,
    ) -> AppResult<Vec<Self::Entity>>;

    async fn find_by_id(&self, id: &Self::Id) -> AppResult<Option<Self::Entity>>;

    async fn find_one(&self, filter: &Self::Filter) -> AppResult<Option<Self::Entity>>;

    async fn update_by_id(
        &self,
        id: &Self::Id,
        data: Self::Update,
        options: UpdateOptions,
    ) -> AppResult<Option<Self::Entity>>;

    async fn delete_by_id(&self, id: &Self::Id) -> AppResult<Option<Self::Entity>>;

    async fn count(&self, filter: &Self::Filter) -> AppResult<i64>;

    async fn exists(&self, filter: &Self::Filter) -> AppResult<bool> {
        Ok(self.count(filter).await? > 0)
    }
}
