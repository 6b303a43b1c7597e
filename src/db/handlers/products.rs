//! Database repository for marketplace products.

use std::collections::HashMap;

use sqlx::PgConnection;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    db::{
        errors::{DbError, Result},
        handlers::repository::Repository,
        models::products::{ProductCreateDBRequest, ProductDBResponse, ProductUpdateDBRequest},
    },
    types::{abbrev_uuid, CategoryId, ProductId},
};

/// Filter for listing products
#[derive(Debug, Clone)]
pub struct ProductFilter {
    pub skip: i64,
    pub limit: i64,
    pub category_id: Option<CategoryId>,
    /// Case-insensitive substring match against name and description
    pub search: Option<String>,
    /// When set, only active products are returned. Admin listings pass false.
    pub active_only: bool,
}

impl ProductFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self {
            skip,
            limit,
            category_id: None,
            search: None,
            active_only: true,
        }
    }

    pub fn with_category(mut self, category_id: CategoryId) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    pub fn include_inactive(mut self) -> Self {
        self.active_only = false;
        self
    }
}

pub struct Products<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Products<'c> {
    type CreateRequest = ProductCreateDBRequest;
    type UpdateRequest = ProductUpdateDBRequest;
    type Response = ProductDBResponse;
    type Id = ProductId;
    type Filter = ProductFilter;

    #[instrument(skip(self, request), fields(slug = %request.slug), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let product = sqlx::query_as::<_, ProductDBResponse>(
            r#"
            INSERT INTO products (id, category_id, name, slug, description, image_url, min_price, currency, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(request.category_id)
        .bind(&request.name)
        .bind(&request.slug)
        .bind(&request.description)
        .bind(&request.image_url)
        .bind(request.min_price)
        .bind(&request.currency)
        .bind(request.created_by)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(product)
    }

    #[instrument(skip(self), fields(product_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let product = sqlx::query_as::<_, ProductDBResponse>("SELECT * FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(product)
    }

    #[instrument(skip(self, ids), fields(count = ids.len()), err)]
    async fn get_bulk(&mut self, ids: Vec<Self::Id>) -> Result<HashMap<Self::Id, Self::Response>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let products = sqlx::query_as::<_, ProductDBResponse>("SELECT * FROM products WHERE id = ANY($1)")
            .bind(&ids)
            .fetch_all(&mut *self.db)
            .await?;

        Ok(products.into_iter().map(|p| (p.id, p)).collect())
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = String::from("SELECT * FROM products WHERE 1=1");
        let mut conditions = Vec::new();
        let mut bind_count = 0;

        if filter.category_id.is_some() {
            bind_count += 1;
            conditions.push(format!("category_id = ${bind_count}"));
        }
        if filter.search.is_some() {
            bind_count += 1;
            conditions.push(format!("(name ILIKE ${bind_count} OR description ILIKE ${bind_count})"));
        }
        if filter.active_only {
            conditions.push("is_active = TRUE".to_string());
        }

        if !conditions.is_empty() {
            query.push_str(" AND ");
            query.push_str(&conditions.join(" AND "));
        }

        query.push_str(&format!(" ORDER BY created_at DESC LIMIT {} OFFSET {}", filter.limit, filter.skip));

        let mut sql_query = sqlx::query_as::<_, ProductDBResponse>(&query);

        if let Some(category_id) = filter.category_id {
            sql_query = sql_query.bind(category_id);
        }
        if let Some(search) = &filter.search {
            sql_query = sql_query.bind(format!("%{search}%"));
        }

        let products = sql_query.fetch_all(&mut *self.db).await?;
        Ok(products)
    }

    #[instrument(skip(self), fields(product_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1").bind(id).execute(&mut *self.db).await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(product_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let product = sqlx::query_as::<_, ProductDBResponse>(
            r#"
            UPDATE products SET
                category_id = COALESCE($2, category_id),
                name = COALESCE($3, name),
                description = COALESCE($4, description),
                image_url = COALESCE($5, image_url),
                min_price = COALESCE($6, min_price),
                is_active = COALESCE($7, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(request.category_id)
        .bind(&request.name)
        .bind(&request.description)
        .bind(&request.image_url)
        .bind(request.min_price)
        .bind(request.is_active)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(product)
    }
}

impl<'c> Products<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, slug), err)]
    pub async fn get_by_slug(&mut self, slug: &str) -> Result<Option<ProductDBResponse>> {
        let product = sqlx::query_as::<_, ProductDBResponse>("SELECT * FROM products WHERE slug = $1")
            .bind(slug)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(product)
    }
}

#[cfg(test)]
mod tests {
    use super::super::repository::Repository;
    use super::*;
    use rust_decimal_macros::dec;
    use sqlx::PgPool;

    fn create_request(slug: &str, min_price: rust_decimal::Decimal) -> ProductCreateDBRequest {
        ProductCreateDBRequest {
            category_id: None,
            name: format!("Product {slug}"),
            slug: slug.to_string(),
            description: None,
            image_url: None,
            min_price,
            currency: "USD".to_string(),
            created_by: None,
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_and_get_product(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Products::new(&mut conn);

        let created = repo.create(&create_request("mug", dec!(9.99))).await.unwrap();
        assert_eq!(created.min_price, dec!(9.99));
        assert!(created.is_active);

        let fetched = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.slug, "mug");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_negative_min_price_rejected(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Products::new(&mut conn);

        let err = repo.create(&create_request("bad", dec!(-1.00))).await.unwrap_err();
        assert!(matches!(err, DbError::CheckViolation { .. }), "got: {err:?}");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_filters_by_category_and_active(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();

        let category = super::super::categories::Categories::new(&mut conn)
            .create(&crate::db::models::categories::CategoryCreateDBRequest {
                name: "Cards".to_string(),
                slug: "cards".to_string(),
                description: None,
            })
            .await
            .unwrap();

        let mut repo = Products::new(&mut conn);

        let mut in_category = create_request("in-cat", dec!(5.00));
        in_category.category_id = Some(category.id);
        let in_category = repo.create(&in_category).await.unwrap();

        let other = repo.create(&create_request("other", dec!(5.00))).await.unwrap();

        // Deactivate the uncategorized product
        repo.update(
            other.id,
            &ProductUpdateDBRequest {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let by_category = repo.list(&ProductFilter::new(0, 10).with_category(category.id)).await.unwrap();
        assert_eq!(by_category.len(), 1);
        assert_eq!(by_category[0].id, in_category.id);

        let active = repo.list(&ProductFilter::new(0, 10)).await.unwrap();
        assert_eq!(active.len(), 1);

        let all = repo.list(&ProductFilter::new(0, 10).include_inactive()).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_searches_name_and_description(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Products::new(&mut conn);

        let mut basket = create_request("gift-basket", dec!(25.00));
        basket.name = "Gift Basket".to_string();
        let basket = repo.create(&basket).await.unwrap();

        let mut mug = create_request("mug", dec!(9.99));
        mug.name = "Mug".to_string();
        mug.description = Some("Ceramic, holds a basketful of coffee".to_string());
        let mug = repo.create(&mug).await.unwrap();

        repo.create(&create_request("socks", dec!(4.00))).await.unwrap();

        let found = repo.list(&ProductFilter::new(0, 10).with_search("BASKET")).await.unwrap();
        assert_eq!(found.len(), 2);
        let ids: Vec<_> = found.iter().map(|p| p.id).collect();
        assert!(ids.contains(&basket.id));
        assert!(ids.contains(&mug.id));

        let none = repo.list(&ProductFilter::new(0, 10).with_search("lamp")).await.unwrap();
        assert!(none.is_empty());
    }
}
