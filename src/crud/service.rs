use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::repository::{QueryOptions, Repository, SortOrder, UpdateOptions};
use crate::error::{AppError, AppResult};

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageRequest {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl PageRequest {
    pub fn new(page: i64, limit: i64) -> Self {
        Self {
            page: Some(page),
            limit: Some(limit),
        }
    }

    /// Non-positive or missing values fall back to page 1 / 10 items.
    pub fn resolve(self) -> (i64, i64) {
        let page = self.page.filter(|p| *p > 0).unwrap_or(1);
        let limit = self
            .limit
            .filter(|l| *l > 0)
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .min(MAX_PAGE_SIZE);
        (page, limit)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub pages: i64,
}

impl Pagination {
    pub fn new(page: i64, limit: i64, total: i64) -> Self {
        let pages = if total == 0 { 0 } else { (total + limit - 1) / limit };
        Self {
            page,
            limit,
            total,
            pages,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub pagination: Pagination,
}

/// Business-rule layer over any [`Repository`]: pagination and uniform
/// "not found" handling.
pub struct CrudService<R: ?Sized> {
    repo: Arc<R>,
}

impl<R: ?Sized> Clone for CrudService<R> {
    fn clone(&self) -> Self {
        Self {
            repo: Arc::clone(&self.repo),
        }
    }
}

impl<R: Repository + ?Sized> CrudService<R> {
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub async fn create(&self, data: R::Create) -> AppResult<R::Entity> {
        self.repo.create(data).await
    }

    pub async fn get_all(
        &self,
        filter: &R::Filter,
        request: PageRequest,
        sort: Option<(R::SortKey, SortOrder)>,
    ) -> AppResult<Page<R::Entity>> {
        let (page, limit) = request.resolve();
        let options = QueryOptions {
            sort,
            ..QueryOptions::default()
        }
        .page((page - 1).saturating_mul(limit), limit);

        let (data, total) = tokio::try_join!(
            self.repo.find_all(filter, &options),
            self.repo.count(filter)
        )?;

        Ok(Page {
            data,
            pagination: Pagination::new(page, limit, total),
        })
    }

    pub async fn get_by_id(&self, id: &R::Id) -> AppResult<R::Entity> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(AppError::not_found)
    }

    pub async fn get_one(&self, filter: &R::Filter) -> AppResult<Option<R::Entity>> {
        self.repo.find_one(filter).await
    }

    pub async fn update_by_id(
        &self,
        id: &R::Id,
        data: R::Update,
        options: UpdateOptions,
    ) -> AppResult<R::Entity> {
        self.repo
            .update_by_id(id, data, options)
            .await?
            .ok_or_else(AppError::not_found)
    }

    pub async fn delete_by_id(&self, id: &R::Id) -> AppResult<R::Entity> {
        self.repo
            .delete_by_id(id)
            .await?
            .ok_or_else(AppError::not_found)
    }

    pub async fn exists(&self, filter: &R::Filter) -> AppResult<bool> {
        self.repo.exists(filter).await
    }

    pub async fn count(&self, filter: &R::Filter) -> AppResult<i64> {
        self.repo.count(filter).await
    }
}
