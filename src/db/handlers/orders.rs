//! Database repository for orders.
//!
//! Orders and their items are written in a single transaction, so a failed
//! item insert never leaves a headless order behind. The idempotency key is
//! enforced by a unique constraint; resubmissions surface as a unique
//! violation that callers resolve via [`Orders::get_by_idempotency_key`].

use std::collections::HashMap;

use sqlx::{Connection, PgConnection};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    api::models::orders::OrderStatus,
    db::{
        errors::{DbError, Result},
        handlers::repository::Repository,
        models::orders::{OrderCreateDBRequest, OrderDBResponse, OrderItemDBResponse, OrderRow, OrderUpdateDBRequest},
    },
    types::{abbrev_uuid, OrderId, UserId},
};

/// Filter for listing orders
#[derive(Debug, Clone)]
pub struct OrderFilter {
    pub skip: i64,
    pub limit: i64,
    /// Restrict to a single customer. Non-admin listings always set this.
    pub user_id: Option<UserId>,
    pub status: Option<OrderStatus>,
}

impl OrderFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self {
            skip,
            limit,
            user_id: None,
            status: None,
        }
    }

    pub fn for_user(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn with_status(mut self, status: OrderStatus) -> Self {
        self.status = Some(status);
        self
    }
}

pub struct Orders<'c> {
    db: &'c mut PgConnection,
}

async fn items_for_order(conn: &mut PgConnection, order_id: OrderId) -> Result<Vec<OrderItemDBResponse>> {
    let items = sqlx::query_as::<_, OrderItemDBResponse>("SELECT * FROM order_items WHERE order_id = $1 ORDER BY id")
        .bind(order_id)
        .fetch_all(conn)
        .await?;

    Ok(items)
}

#[async_trait::async_trait]
impl<'c> Repository for Orders<'c> {
    type CreateRequest = OrderCreateDBRequest;
    type UpdateRequest = OrderUpdateDBRequest;
    type Response = OrderDBResponse;
    type Id = OrderId;
    type Filter = OrderFilter;

    #[instrument(skip(self, request), fields(items = request.items.len()), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let mut tx = self.db.begin().await?;

        let order = sqlx::query_as::<_, OrderRow>(
            r#"
            INSERT INTO orders (
                id, user_id, customer_name, customer_email, customer_phone,
                shipping_address, payment_reference, idempotency_key,
                total_amount, currency
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(request.user_id)
        .bind(&request.customer_name)
        .bind(&request.customer_email)
        .bind(&request.customer_phone)
        .bind(&request.shipping_address)
        .bind(&request.payment_reference)
        .bind(&request.idempotency_key)
        .bind(request.total_amount)
        .bind(&request.currency)
        .fetch_one(&mut *tx)
        .await?;

        let mut items = Vec::with_capacity(request.items.len());
        for item in &request.items {
            let inserted = sqlx::query_as::<_, OrderItemDBResponse>(
                r#"
                INSERT INTO order_items (id, order_id, product_id, product_name, unit_price, quantity, line_total)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING *
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(order.id)
            .bind(item.product_id)
            .bind(&item.product_name)
            .bind(item.unit_price)
            .bind(item.quantity)
            .bind(item.line_total)
            .fetch_one(&mut *tx)
            .await?;

            items.push(inserted);
        }

        tx.commit().await?;

        Ok(OrderDBResponse { order, items })
    }

    #[instrument(skip(self), fields(order_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let order = sqlx::query_as::<_, OrderRow>("SELECT * FROM orders WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        match order {
            Some(order) => {
                let items = items_for_order(self.db, order.id).await?;
                Ok(Some(OrderDBResponse { order, items }))
            }
            None => Ok(None),
        }
    }

    #[instrument(skip(self, ids), fields(count = ids.len()), err)]
    async fn get_bulk(&mut self, ids: Vec<Self::Id>) -> Result<HashMap<Self::Id, Self::Response>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let orders = sqlx::query_as::<_, OrderRow>("SELECT * FROM orders WHERE id = ANY($1)")
            .bind(&ids)
            .fetch_all(&mut *self.db)
            .await?;

        let mut result = HashMap::new();
        for order in orders {
            let items = items_for_order(self.db, order.id).await?;
            result.insert(order.id, OrderDBResponse { order, items });
        }

        Ok(result)
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = String::from("SELECT * FROM orders WHERE 1=1");
        let mut conditions = Vec::new();

        if filter.user_id.is_some() {
            conditions.push(format!("user_id = ${}", conditions.len() + 1));
        }
        if filter.status.is_some() {
            conditions.push(format!("status = ${}", conditions.len() + 1));
        }

        if !conditions.is_empty() {
            query.push_str(" AND ");
            query.push_str(&conditions.join(" AND "));
        }

        query.push_str(&format!(" ORDER BY created_at DESC LIMIT {} OFFSET {}", filter.limit, filter.skip));

        let mut sql_query = sqlx::query_as::<_, OrderRow>(&query);

        if let Some(user_id) = filter.user_id {
            sql_query = sql_query.bind(user_id);
        }
        if let Some(status) = filter.status {
            sql_query = sql_query.bind(status);
        }

        let orders = sql_query.fetch_all(&mut *self.db).await?;

        let mut result = Vec::with_capacity(orders.len());
        for order in orders {
            let items = items_for_order(self.db, order.id).await?;
            result.push(OrderDBResponse { order, items });
        }

        Ok(result)
    }

    #[instrument(skip(self), fields(order_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        // Items go with the order via ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM orders WHERE id = $1").bind(id).execute(&mut *self.db).await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(order_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let order = sqlx::query_as::<_, OrderRow>(
            r#"
            UPDATE orders SET
                status = COALESCE($2, status),
                shipping_address = COALESCE($3, shipping_address),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(request.status)
        .bind(&request.shipping_address)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        let items = items_for_order(self.db, order.id).await?;
        Ok(OrderDBResponse { order, items })
    }
}

impl<'c> Orders<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, key), err)]
    pub async fn get_by_idempotency_key(&mut self, key: &str) -> Result<Option<OrderDBResponse>> {
        let order = sqlx::query_as::<_, OrderRow>("SELECT * FROM orders WHERE idempotency_key = $1")
            .bind(key)
            .fetch_optional(&mut *self.db)
            .await?;

        match order {
            Some(order) => {
                let items = items_for_order(self.db, order.id).await?;
                Ok(Some(OrderDBResponse { order, items }))
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::repository::Repository;
    use super::*;
    use crate::db::models::orders::OrderItemDBRequest;
    use crate::db::models::products::ProductCreateDBRequest;
    use crate::types::ProductId;
    use rust_decimal_macros::dec;
    use sqlx::PgPool;

    async fn seed_product(conn: &mut PgConnection, slug: &str) -> ProductId {
        let mut products = super::super::products::Products::new(conn);
        products
            .create(&ProductCreateDBRequest {
                category_id: None,
                name: format!("Product {slug}"),
                slug: slug.to_string(),
                description: None,
                image_url: None,
                min_price: dec!(10.00),
                currency: "USD".to_string(),
                created_by: None,
            })
            .await
            .unwrap()
            .id
    }

    fn create_request(product_id: ProductId, key: &str) -> OrderCreateDBRequest {
        OrderCreateDBRequest {
            user_id: None,
            customer_name: "Kofi Annor".to_string(),
            customer_email: "kofi@example.com".to_string(),
            customer_phone: None,
            shipping_address: Some("12 High St, Accra".to_string()),
            payment_reference: Some("tok_abc123".to_string()),
            idempotency_key: key.to_string(),
            total_amount: dec!(20.00),
            currency: "USD".to_string(),
            items: vec![OrderItemDBRequest {
                product_id,
                product_name: "Gift Basket".to_string(),
                unit_price: dec!(10.00),
                quantity: 2,
                line_total: dec!(20.00),
            }],
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_order_with_items(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let product_id = seed_product(&mut conn, "basket").await;

        let mut repo = Orders::new(&mut conn);
        let created = repo.create(&create_request(product_id, "key-1")).await.unwrap();

        assert_eq!(created.order.status, OrderStatus::Pending);
        assert_eq!(created.items.len(), 1);
        assert_eq!(created.items[0].line_total, dec!(20.00));

        let fetched = repo.get_by_id(created.order.id).await.unwrap().unwrap();
        assert_eq!(fetched.items.len(), 1);
        assert_eq!(fetched.order.total_amount, dec!(20.00));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_duplicate_idempotency_key_rejected(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let product_id = seed_product(&mut conn, "basket").await;

        let mut repo = Orders::new(&mut conn);
        let first = repo.create(&create_request(product_id, "same-key")).await.unwrap();

        let err = repo.create(&create_request(product_id, "same-key")).await.unwrap_err();
        assert!(err.is_unique_violation_on("orders_idempotency_key_unique"), "got: {err:?}");

        // The original is still retrievable by key
        let existing = repo.get_by_idempotency_key("same-key").await.unwrap().unwrap();
        assert_eq!(existing.order.id, first.order.id);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_failed_item_insert_rolls_back_order(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let product_id = seed_product(&mut conn, "basket").await;

        let mut request = create_request(product_id, "rollback-key");
        // References a product that does not exist
        request.items.push(OrderItemDBRequest {
            product_id: Uuid::new_v4(),
            product_name: "Ghost".to_string(),
            unit_price: dec!(1.00),
            quantity: 1,
            line_total: dec!(1.00),
        });

        let mut repo = Orders::new(&mut conn);
        let err = repo.create(&request).await.unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }), "got: {err:?}");

        // The whole order is gone, not just the bad item
        assert!(repo.get_by_idempotency_key("rollback-key").await.unwrap().is_none());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_delete_cascades_to_items(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let product_id = seed_product(&mut conn, "basket").await;

        let mut repo = Orders::new(&mut conn);
        let created = repo.create(&create_request(product_id, "delete-key")).await.unwrap();

        assert!(repo.delete(created.order.id).await.unwrap());

        let leftover = sqlx::query_as::<_, OrderItemDBResponse>("SELECT * FROM order_items WHERE order_id = $1")
            .bind(created.order.id)
            .fetch_all(&mut *conn)
            .await
            .unwrap();
        assert!(leftover.is_empty());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_update_status(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let product_id = seed_product(&mut conn, "basket").await;

        let mut repo = Orders::new(&mut conn);
        let created = repo.create(&create_request(product_id, "status-key")).await.unwrap();

        let updated = repo
            .update(
                created.order.id,
                &OrderUpdateDBRequest {
                    status: Some(OrderStatus::Paid),
                    shipping_address: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.order.status, OrderStatus::Paid);
        assert_eq!(updated.items.len(), 1);
    }
}
