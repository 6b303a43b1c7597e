use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use rust_decimal::Decimal;
use sqlx::PgConnection;

use crate::{
    api::models::{
        pagination::PaginatedResponse,
        transfers::{ListTransfersQuery, QuoteRequest, QuoteResponse, TransferCreate, TransferResponse, TransferUpdate},
        users::CurrentUser,
    },
    auth::permissions::require_admin,
    db::{
        handlers::{transfers::TransferFilter, ExchangeRates, Repository, Transfers},
        models::transfers::{TransferCreateDBRequest, TransferUpdateDBRequest},
    },
    errors::{Error, Result},
    quote::{quote_transfer, FeeSchedule, QuoteError, TransferQuote},
    types::{Operation, Resource, TransferId},
    AppState,
};

impl From<QuoteError> for Error {
    fn from(err: QuoteError) -> Self {
        Error::BadRequest { message: err.to_string() }
    }
}

/// Look up the stored rate for a pair and compute a quote from it.
async fn quote_for_pair(
    conn: &mut PgConnection,
    state: &AppState,
    send_amount: Decimal,
    source: &str,
    destination: &str,
) -> Result<TransferQuote> {
    let source = source.trim().to_uppercase();
    let destination = destination.trim().to_uppercase();

    let mut rates = ExchangeRates::new(conn);
    let rate = rates.get_pair(&source, &destination).await?.ok_or_else(|| Error::NotFound {
        resource: "exchange rate".to_string(),
        id: format!("{source}/{destination}"),
    })?;

    let schedule = FeeSchedule::from(&state.config.fees);
    Ok(quote_transfer(send_amount, rate.rate, &schedule)?)
}

/// Estimate the cost of a transfer (public). Nothing is persisted.
#[utoipa::path(
    post,
    path = "/transfers/quote",
    request_body = QuoteRequest,
    tag = "transfers",
    responses(
        (status = 200, description = "Cost estimate", body = QuoteResponse),
        (status = 400, description = "Invalid amount"),
        (status = 404, description = "No rate stored for this pair"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn quote(State(state): State<AppState>, Json(request): Json<QuoteRequest>) -> Result<Json<QuoteResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let quote = quote_for_pair(
        &mut conn,
        &state,
        request.send_amount,
        &request.source_currency,
        &request.destination_currency,
    )
    .await?;

    Ok(Json(QuoteResponse::from_quote(
        quote,
        request.source_currency.trim().to_uppercase(),
        request.destination_currency.trim().to_uppercase(),
    )))
}

/// Create a transfer. The fee, rate, and received amount are computed
/// server-side at creation time, never taken from the client.
#[utoipa::path(
    post,
    path = "/transfers",
    request_body = TransferCreate,
    tag = "transfers",
    responses(
        (status = 201, description = "Transfer created", body = TransferResponse),
        (status = 400, description = "Invalid amount"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "No rate stored for this pair"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_transfer(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(request): Json<TransferCreate>,
) -> Result<(StatusCode, Json<TransferResponse>)> {
    if request.recipient_name.trim().is_empty() {
        return Err(Error::BadRequest {
            message: "Recipient name is required".to_string(),
        });
    }
    if request.send_amount <= Decimal::ZERO {
        return Err(Error::BadRequest {
            message: "Send amount must be positive".to_string(),
        });
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let quote = quote_for_pair(
        &mut conn,
        &state,
        request.send_amount,
        &request.source_currency,
        &request.destination_currency,
    )
    .await?;

    let create_request = TransferCreateDBRequest {
        user_id: current_user.id,
        recipient_name: request.recipient_name,
        recipient_country: request.recipient_country.trim().to_uppercase(),
        source_currency: request.source_currency.trim().to_uppercase(),
        destination_currency: request.destination_currency.trim().to_uppercase(),
        send_amount: quote.send_amount,
        fee_amount: quote.fee_amount,
        rate: quote.rate,
        received_amount: quote.received_amount,
    };

    let mut repo = Transfers::new(&mut conn);
    let transfer = repo.create(&create_request).await?;

    Ok((StatusCode::CREATED, Json(TransferResponse::from(transfer))))
}

/// List transfers. Admins see everyone's; everyone else sees their own.
#[utoipa::path(
    get,
    path = "/transfers",
    tag = "transfers",
    params(ListTransfersQuery),
    responses(
        (status = 200, description = "List of transfers", body = PaginatedResponse<TransferResponse>),
        (status = 401, description = "Unauthorized"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_transfers(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<ListTransfersQuery>,
) -> Result<Json<PaginatedResponse<TransferResponse>>> {
    let (skip, limit) = query.pagination.params();

    let mut filter = TransferFilter::new(skip, limit);
    if !current_user.is_admin {
        filter = filter.for_user(current_user.id);
    }
    if let Some(status) = query.status {
        filter = filter.with_status(status);
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Transfers::new(&mut conn);

    let transfers = repo.list(&filter).await?;
    let data = transfers.into_iter().map(TransferResponse::from).collect();

    Ok(Json(PaginatedResponse::new(data, skip, limit)))
}

/// Get a transfer. Owners and admins only.
#[utoipa::path(
    get,
    path = "/transfers/{id}",
    tag = "transfers",
    params(("id" = String, Path, format = "uuid", description = "Transfer id")),
    responses(
        (status = 200, description = "Transfer", body = TransferResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Not found"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_transfer(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<TransferId>,
) -> Result<Json<TransferResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Transfers::new(&mut conn);

    let transfer = repo.get_by_id(id).await?.ok_or_else(|| Error::NotFound {
        resource: "transfer".to_string(),
        id: id.to_string(),
    })?;

    // Hide other users' transfers rather than confirming they exist
    if transfer.user_id != current_user.id && !current_user.is_admin {
        return Err(Error::NotFound {
            resource: "transfer".to_string(),
            id: id.to_string(),
        });
    }

    Ok(Json(TransferResponse::from(transfer)))
}

/// Update a transfer's status (admin only)
#[utoipa::path(
    patch,
    path = "/transfers/{id}",
    request_body = TransferUpdate,
    tag = "transfers",
    params(("id" = String, Path, format = "uuid", description = "Transfer id")),
    responses(
        (status = 200, description = "Transfer updated", body = TransferResponse),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not found"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_transfer(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<TransferId>,
    Json(request): Json<TransferUpdate>,
) -> Result<Json<TransferResponse>> {
    require_admin(&current_user, Resource::Transfers, Operation::UpdateAll)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Transfers::new(&mut conn);

    let transfer = repo.update(id, &TransferUpdateDBRequest { status: request.status }).await?;
    Ok(Json(TransferResponse::from(transfer)))
}

/// Delete a transfer (admin only)
#[utoipa::path(
    delete,
    path = "/transfers/{id}",
    tag = "transfers",
    params(("id" = String, Path, format = "uuid", description = "Transfer id")),
    responses(
        (status = 204, description = "Transfer deleted"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not found"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_transfer(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<TransferId>,
) -> Result<StatusCode> {
    require_admin(&current_user, Resource::Transfers, Operation::DeleteAll)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Transfers::new(&mut conn);

    if repo.delete(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(Error::NotFound {
            resource: "transfer".to_string(),
            id: id.to_string(),
        })
    }
}
