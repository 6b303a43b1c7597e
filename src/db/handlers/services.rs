//! Database repository for the service directory.

use std::collections::HashMap;

use sqlx::PgConnection;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    db::{
        errors::{DbError, Result},
        handlers::repository::Repository,
        models::services::{ServiceCreateDBRequest, ServiceDBResponse, ServiceUpdateDBRequest},
    },
    types::{abbrev_uuid, ServiceId},
};

#[derive(Debug, Clone)]
pub struct ServiceFilter {
    pub skip: i64,
    pub limit: i64,
    pub active_only: bool,
}

impl ServiceFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self {
            skip,
            limit,
            active_only: true,
        }
    }
}

pub struct Services<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Services<'c> {
    type CreateRequest = ServiceCreateDBRequest;
    type UpdateRequest = ServiceUpdateDBRequest;
    type Response = ServiceDBResponse;
    type Id = ServiceId;
    type Filter = ServiceFilter;

    #[instrument(skip(self, request), fields(slug = %request.slug), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let service = sqlx::query_as::<_, ServiceDBResponse>(
            r#"
            INSERT INTO services (id, name, slug, description)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&request.name)
        .bind(&request.slug)
        .bind(&request.description)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(service)
    }

    #[instrument(skip(self), fields(service_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let service = sqlx::query_as::<_, ServiceDBResponse>("SELECT * FROM services WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(service)
    }

    #[instrument(skip(self, ids), fields(count = ids.len()), err)]
    async fn get_bulk(&mut self, ids: Vec<Self::Id>) -> Result<HashMap<Self::Id, Self::Response>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let services = sqlx::query_as::<_, ServiceDBResponse>("SELECT * FROM services WHERE id = ANY($1)")
            .bind(&ids)
            .fetch_all(&mut *self.db)
            .await?;

        Ok(services.into_iter().map(|s| (s.id, s)).collect())
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let query = if filter.active_only {
            "SELECT * FROM services WHERE is_active = TRUE ORDER BY name ASC LIMIT $1 OFFSET $2"
        } else {
            "SELECT * FROM services ORDER BY name ASC LIMIT $1 OFFSET $2"
        };

        let services = sqlx::query_as::<_, ServiceDBResponse>(query)
            .bind(filter.limit)
            .bind(filter.skip)
            .fetch_all(&mut *self.db)
            .await?;

        Ok(services)
    }

    #[instrument(skip(self), fields(service_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM services WHERE id = $1").bind(id).execute(&mut *self.db).await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(service_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let service = sqlx::query_as::<_, ServiceDBResponse>(
            r#"
            UPDATE services SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                is_active = COALESCE($4, is_active)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.name)
        .bind(&request.description)
        .bind(request.is_active)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(service)
    }
}

impl<'c> Services<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }
}

#[cfg(test)]
mod tests {
    use super::super::repository::Repository;
    use super::*;
    use sqlx::PgPool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_inactive_services_hidden_from_default_listing(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Services::new(&mut conn);

        let created = repo
            .create(&ServiceCreateDBRequest {
                name: "Airtime Topup".to_string(),
                slug: "airtime-topup".to_string(),
                description: None,
            })
            .await
            .unwrap();

        repo.update(
            created.id,
            &ServiceUpdateDBRequest {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let listed = repo.list(&ServiceFilter::new(0, 10)).await.unwrap();
        assert!(listed.is_empty());

        let mut all = ServiceFilter::new(0, 10);
        all.active_only = false;
        assert_eq!(repo.list(&all).await.unwrap().len(), 1);
    }
}
