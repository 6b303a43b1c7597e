//! Database repository for money transfers.

use std::collections::HashMap;

use sqlx::PgConnection;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    api::models::transfers::TransferStatus,
    db::{
        errors::{DbError, Result},
        handlers::repository::Repository,
        models::transfers::{TransferCreateDBRequest, TransferDBResponse, TransferUpdateDBRequest},
    },
    types::{abbrev_uuid, TransferId, UserId},
};

/// Filter for listing transfers
#[derive(Debug, Clone)]
pub struct TransferFilter {
    pub skip: i64,
    pub limit: i64,
    /// Restrict to a single sender. Non-admin listings always set this.
    pub user_id: Option<UserId>,
    pub status: Option<TransferStatus>,
}

impl TransferFilter {
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

    pub fn with_status(mut self, status: TransferStatus) -> Self {
        self.status = Some(status);
        self
    }
}

pub struct Transfers<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Transfers<'c> {
    type CreateRequest = TransferCreateDBRequest;
    type UpdateRequest = TransferUpdateDBRequest;
    type Response = TransferDBResponse;
    type Id = TransferId;
    type Filter = TransferFilter;

    #[instrument(skip(self, request), fields(user_id = %abbrev_uuid(&request.user_id)), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let transfer = sqlx::query_as::<_, TransferDBResponse>(
            r#"
            INSERT INTO transfers (
                id, user_id, recipient_name, recipient_country,
                source_currency, destination_currency,
                send_amount, fee_amount, rate, received_amount
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(request.user_id)
        .bind(&request.recipient_name)
        .bind(&request.recipient_country)
        .bind(&request.source_currency)
        .bind(&request.destination_currency)
        .bind(request.send_amount)
        .bind(request.fee_amount)
        .bind(request.rate)
        .bind(request.received_amount)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(transfer)
    }

    #[instrument(skip(self), fields(transfer_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let transfer = sqlx::query_as::<_, TransferDBResponse>("SELECT * FROM transfers WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(transfer)
    }

    #[instrument(skip(self, ids), fields(count = ids.len()), err)]
    async fn get_bulk(&mut self, ids: Vec<Self::Id>) -> Result<HashMap<Self::Id, Self::Response>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let transfers = sqlx::query_as::<_, TransferDBResponse>("SELECT * FROM transfers WHERE id = ANY($1)")
            .bind(&ids)
            .fetch_all(&mut *self.db)
            .await?;

        Ok(transfers.into_iter().map(|t| (t.id, t)).collect())
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = String::from("SELECT * FROM transfers WHERE 1=1");
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

        let mut sql_query = sqlx::query_as::<_, TransferDBResponse>(&query);

        if let Some(user_id) = filter.user_id {
            sql_query = sql_query.bind(user_id);
        }
        if let Some(status) = filter.status {
            sql_query = sql_query.bind(status);
        }

        let transfers = sql_query.fetch_all(&mut *self.db).await?;
        Ok(transfers)
    }

    #[instrument(skip(self), fields(transfer_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM transfers WHERE id = $1").bind(id).execute(&mut *self.db).await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(transfer_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let transfer = sqlx::query_as::<_, TransferDBResponse>(
            r#"
            UPDATE transfers SET
                status = COALESCE($2, status),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(request.status)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(transfer)
    }
}

impl<'c> Transfers<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }
}

#[cfg(test)]
mod tests {
    use super::super::repository::Repository;
    use super::*;
    use crate::db::models::users::UserCreateDBRequest;
    use rust_decimal_macros::dec;
    use sqlx::PgPool;

    async fn seed_user(conn: &mut PgConnection) -> UserId {
        let mut users = super::super::users::Users::new(conn);
        users
            .create(&UserCreateDBRequest {
                username: "sender".to_string(),
                email: "sender@example.com".to_string(),
                display_name: None,
                phone: None,
                is_admin: false,
                password_hash: None,
            })
            .await
            .unwrap()
            .id
    }

    fn create_request(user_id: UserId) -> TransferCreateDBRequest {
        TransferCreateDBRequest {
            user_id,
            recipient_name: "Ama Mensah".to_string(),
            recipient_country: "GH".to_string(),
            source_currency: "USD".to_string(),
            destination_currency: "GHS".to_string(),
            send_amount: dec!(200.00),
            fee_amount: dec!(5.00),
            rate: dec!(15.80),
            received_amount: dec!(3160.00),
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_transfer_defaults_to_pending(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let user_id = seed_user(&mut conn).await;

        let mut repo = Transfers::new(&mut conn);
        let transfer = repo.create(&create_request(user_id)).await.unwrap();

        assert_eq!(transfer.status, TransferStatus::Pending);
        assert_eq!(transfer.received_amount, dec!(3160.00));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_status_transition(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let user_id = seed_user(&mut conn).await;

        let mut repo = Transfers::new(&mut conn);
        let transfer = repo.create(&create_request(user_id)).await.unwrap();

        let updated = repo
            .update(
                transfer.id,
                &TransferUpdateDBRequest {
                    status: Some(TransferStatus::Completed),
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.status, TransferStatus::Completed);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_filters_by_user_and_status(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let user_id = seed_user(&mut conn).await;

        let mut repo = Transfers::new(&mut conn);
        let first = repo.create(&create_request(user_id)).await.unwrap();
        repo.create(&create_request(user_id)).await.unwrap();

        repo.update(
            first.id,
            &TransferUpdateDBRequest {
                status: Some(TransferStatus::Completed),
            },
        )
        .await
        .unwrap();

        let mine = repo.list(&TransferFilter::new(0, 10).for_user(user_id)).await.unwrap();
        assert_eq!(mine.len(), 2);

        let completed = repo
            .list(&TransferFilter::new(0, 10).for_user(user_id).with_status(TransferStatus::Completed))
            .await
            .unwrap();
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].id, first.id);

        let nobody = repo.list(&TransferFilter::new(0, 10).for_user(Uuid::new_v4())).await.unwrap();
        assert!(nobody.is_empty());
    }
}
