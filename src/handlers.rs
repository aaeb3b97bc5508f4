use crate::db_types::{ActiveCall, ActiveCallFields};
use crate::error::AppError;
use crate::repository::Entity;
use crate::templates;
use crate::types::Repo;
use crate::utils::{decode_form, decode_json, parse_id};

use axum::{
    body::Bytes,
    extract::{Path, RawQuery, State},
    http::StatusCode,
    response::Html,
    Json,
};
use time::OffsetDateTime;
use tracing::{error, info, trace};

pub async fn list_rows<E: Entity>(State(repo): State<Repo<E>>) -> Result<Json<Vec<E>>, AppError> {
    let rows = repo.list().await?;
    Ok(Json(rows))
}

/// Insert a row from a JSON payload; timestamps are stamped here, not by the store.
pub async fn create_row<E: Entity>(
    State(repo): State<Repo<E>>,
    body: Bytes,
) -> Result<Json<E>, AppError> {
    let fields: E::Fields = decode_json(&body)?;
    let row = repo.create(&fields, OffsetDateTime::now_utc()).await?;
    info!(table = E::TABLE, id = row.id(), "created row");
    Ok(Json(row))
}

/// Full replacement of a row's writable fields. A missing id still answers 200.
pub async fn update_row<E: Entity>(
    State(repo): State<Repo<E>>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<StatusCode, AppError> {
    let id = parse_id(&id)?;
    let fields: E::Fields = decode_json(&body)?;
    let affected = repo.update(id, &fields, OffsetDateTime::now_utc()).await?;
    info!(table = E::TABLE, id, affected, "updated row");
    Ok(StatusCode::OK)
}

pub async fn delete_row<E: Entity>(
    State(repo): State<Repo<E>>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_id(&id)?;
    let affected = repo.delete(id).await?;
    info!(table = E::TABLE, id, affected, "deleted row");
    Ok(StatusCode::OK)
}

/// Fields posted by the dispatch board form. Missing fields read as empty.
#[derive(Debug, Default, PartialEq)]
pub struct SubmitActiveCall {
    pub patient_name: String,
    pub address: String,
    pub notes: String,
}

impl SubmitActiveCall {
    /// Take the first value of each field; earlier pairs win over later ones.
    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        let first = |key: &str| {
            pairs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
                .unwrap_or_default()
        };
        Self {
            patient_name: first("patientName"),
            address: first("address"),
            notes: first("notes"),
        }
    }
}

/// Accept a form submission, open a call for it and answer with its card.
///
/// Body fields take precedence over query-string fields of the same name.
pub async fn submit_active_call(
    State(repo): State<Repo<ActiveCall>>,
    RawQuery(query): RawQuery,
    body: String,
) -> Result<Html<String>, AppError> {
    trace!(body=%body, query=?query, "submit request");
    let mut pairs = decode_form(&body)?;
    if let Some(query) = query {
        pairs.extend(decode_form(&query)?);
    }
    let form = SubmitActiveCall::from_pairs(&pairs);

    let fields = ActiveCallFields {
        address: form.address,
        patient_name: form.patient_name,
        status: "OPEN".to_string(),
        notes: form.notes,
    };
    let created = repo
        .create(&fields, OffsetDateTime::now_utc())
        .await
        .map_err(|e| {
            error!(error=%e, "error inserting new active call");
            AppError::Internal("Error inserting new active call")
        })?;
    info!(id = created.id, "new active call inserted");

    let call = repo
        .find(created.id)
        .await
        .map_err(|e| {
            error!(error=%e, id = created.id, "error fetching new active call");
            AppError::Internal("Error fetching new active call")
        })?
        .ok_or_else(|| {
            error!(id = created.id, "new active call vanished before re-read");
            AppError::Internal("Error fetching new active call")
        })?;

    Ok(Html(templates::active_call_card(&call)))
}

/// Dispatch board. A failed listing renders an empty board.
pub async fn index(State(repo): State<Repo<ActiveCall>>) -> Html<String> {
    let calls = repo.list().await.unwrap_or_else(|e| {
        error!(error=%e, "failed to list active calls for index page");
        Vec::new()
    });
    Html(templates::index_page(&calls))
}
