//! `/transactions` endpoints and photo retrieval.

use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, State,
    },
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use attendance_shared::types::InvalidStampType;
use attendance_shared::{Operation, StampType};
use attendance_store::{NewTransaction, Transaction, TransactionFilter};

use super::extract::{ApiPath, ApiQuery};
use super::AppState;
use crate::auth::AuthUser;
use crate::blob_store::content_type_for;
use crate::error::ServerError;

#[derive(Serialize)]
pub(crate) struct TransactionResponse {
    id: i64,
    #[serde(rename = "userID")]
    user_id: Option<i64>,
    timestamp: DateTime<Utc>,
    photo: Option<String>,
    device_id: Option<String>,
    stamp_type: i64,
}

impl From<Transaction> for TransactionResponse {
    fn from(tx: Transaction) -> Self {
        Self {
            id: tx.id,
            user_id: tx.user_id,
            timestamp: tx.timestamp,
            photo: tx.photo,
            device_id: tx.device_id,
            stamp_type: tx.stamp_type.code(),
        }
    }
}

/// Query string of `GET /transactions/`. Values stay strings so that bad
/// input surfaces as our own 400 and empty values mean "no filter".
#[derive(Deserialize)]
pub(crate) struct TransactionQuery {
    user_id: Option<String>,
    stamp_type: Option<String>,
    from_date: Option<String>,
    to_date: Option<String>,
}

impl TransactionQuery {
    fn into_filter(self) -> Result<TransactionFilter, ServerError> {
        Ok(TransactionFilter {
            user_id: non_empty(self.user_id)
                .map(|v| parse_int("user_id", &v))
                .transpose()?,
            stamp_type: non_empty(self.stamp_type)
                .map(|v| parse_stamp_type(&v))
                .transpose()?,
            from: non_empty(self.from_date)
                .map(|v| parse_date("from_date", &v))
                .transpose()?,
            to: non_empty(self.to_date)
                .map(|v| parse_date("to_date", &v))
                .transpose()?,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_int(field: &str, value: &str) -> Result<i64, ServerError> {
    value
        .trim()
        .parse()
        .map_err(|_| ServerError::BadRequest(format!("{field} must be an integer")))
}

fn parse_stamp_type(value: &str) -> Result<StampType, ServerError> {
    let code = parse_int("stamp_type", value)?;
    StampType::try_from(code).map_err(|e: InvalidStampType| ServerError::BadRequest(e.to_string()))
}

/// Naive forms accepted for date filters: `T` or space between date and time,
/// seconds and fractions optional.
const NAIVE_DATE_TIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// ISO 8601 date-time (offset optional, UTC assumed) or a bare date meaning
/// the start of that day.
fn parse_date(field: &str, value: &str) -> Result<DateTime<Utc>, ServerError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    let naive = NAIVE_DATE_TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok());
    if let Some(naive) = naive {
        return Ok(naive.and_utc());
    }
    if let Some(start) = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
    {
        return Ok(start.and_utc());
    }
    Err(ServerError::BadRequest(format!(
        "Invalid {field} format. Use ISO 8601 (e.g. 2026-02-01T00:00:00)"
    )))
}

fn multipart_error(err: MultipartError) -> ServerError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ServerError::BodyTooLarge
    } else {
        ServerError::BadRequest(err.body_text())
    }
}

/// Fields collected from the creation form.
#[derive(Default)]
struct TransactionForm {
    user_id: Option<String>,
    stamp_type: Option<String>,
    device_id: Option<String>,
    photo: Option<(Vec<u8>, Option<String>)>,
}

async fn read_form(
    mut multipart: Multipart,
    max_photo: usize,
) -> Result<TransactionForm, ServerError> {
    let mut form = TransactionForm::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "photo" => {
                let filename = field.file_name().map(str::to_string);
                let data = field.bytes().await.map_err(multipart_error)?;
                if data.len() > max_photo {
                    return Err(ServerError::PayloadTooLarge {
                        size: data.len(),
                        max: max_photo,
                    });
                }
                // An empty file part is how most clients send "no photo".
                if !data.is_empty() {
                    form.photo = Some((data.to_vec(), filename));
                }
            }
            "user_id" => form.user_id = Some(field.text().await.map_err(multipart_error)?),
            "stamp_type" => form.stamp_type = Some(field.text().await.map_err(multipart_error)?),
            "device_id" => form.device_id = Some(field.text().await.map_err(multipart_error)?),
            other => debug!(field = other, "ignoring unknown form field"),
        }
    }

    Ok(form)
}

/// POST /transactions/ -- multipart form `user_id`, `stamp_type`,
/// optional `device_id` and `photo`.
pub(crate) async fn create_transaction(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<TransactionResponse>), ServerError> {
    let form = read_form(multipart?, state.photos.max_size()).await?;

    let user_id = form
        .user_id
        .as_deref()
        .ok_or_else(|| ServerError::BadRequest("user_id is required".into()))
        .and_then(|v| parse_int("user_id", v))?;
    let stamp_type = form
        .stamp_type
        .as_deref()
        .ok_or_else(|| ServerError::BadRequest("stamp_type is required".into()))
        .and_then(parse_stamp_type)?;

    state
        .policy
        .authorize(&principal, Operation::CreateTransaction { user_id })?;

    // Nothing reaches the blob store for an unknown user.
    state
        .db
        .lock()
        .await
        .get_user(user_id)
        .map_err(|e| ServerError::from_store(e, "User"))?;

    let photo = match &form.photo {
        Some((data, filename)) => Some(state.photos.store_photo(data, filename.as_deref()).await?),
        None => None,
    };

    let tx = state
        .db
        .lock()
        .await
        .insert_transaction(&NewTransaction {
            user_id,
            stamp_type,
            photo,
            device_id: form.device_id.filter(|d| !d.is_empty()),
        })
        .map_err(|e| ServerError::from_store(e, "User"))?;

    info!(
        id = tx.id,
        user_id,
        stamp_type = %tx.stamp_type,
        photo = tx.photo.as_deref().unwrap_or("-"),
        by = %principal.username,
        "Transaction recorded"
    );
    Ok((StatusCode::CREATED, Json(tx.into())))
}

/// GET /transactions/ -- conjunctive filters, ascending by id.
pub(crate) async fn list_transactions(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    ApiQuery(query): ApiQuery<TransactionQuery>,
) -> Result<Json<Vec<TransactionResponse>>, ServerError> {
    state.policy.authorize(&principal, Operation::ListTransactions)?;
    let filter = query.into_filter()?;

    let txs = state.db.lock().await.query_transactions(&filter)?;
    debug!(count = txs.len(), ?filter, "Listed transactions");
    Ok(Json(txs.into_iter().map(TransactionResponse::from).collect()))
}

/// GET /transactions/{id}
pub(crate) async fn get_transaction(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    ApiPath(transaction_id): ApiPath<i64>,
) -> Result<Json<TransactionResponse>, ServerError> {
    state.policy.authorize(&principal, Operation::GetTransaction)?;

    let tx = state
        .db
        .lock()
        .await
        .get_transaction(transaction_id)
        .map_err(|e| ServerError::from_store(e, "Transaction"))?;
    Ok(Json(tx.into()))
}

/// GET /uploads/{file_name}
pub(crate) async fn get_photo(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    ApiPath(file_name): ApiPath<String>,
) -> Result<impl IntoResponse, ServerError> {
    state.policy.authorize(&principal, Operation::ReadPhoto)?;

    let data = state.photos.get_photo(&file_name).await?;
    Ok(([(header::CONTENT_TYPE, content_type_for(&file_name))], data))
}
