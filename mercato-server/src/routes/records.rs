//! CRUD routes for saved profiles, recommendations and portfolios.
//!
//! Every collection gets the same shape:
//!
//! - `POST /api/{collection}` with `{"userId": "...", "data": {...}}`
//! - `GET | PUT | DELETE /api/{collection}/{id}`; `PUT` takes the bare payload
//! - `GET | DELETE /api/users/{user_id}/{collection}`

use axum::Json;
use axum::Router;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use mercato_core::{
    Collection, MercatoError, PortfolioRecommendation, Record, SavedPortfolio, UserProfile,
    Validate,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::AppState;
use crate::envelope::Envelope;
use crate::error::ApiError;
use crate::store::Scope;

/// A payload type stored in one collection.
pub trait Entity: Validate + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Target collection.
    const COLLECTION: Collection;
}

impl Entity for UserProfile {
    const COLLECTION: Collection = Collection::Profiles;
}

impl Entity for PortfolioRecommendation {
    const COLLECTION: Collection = Collection::Recommendations;
}

impl Entity for SavedPortfolio {
    const COLLECTION: Collection = Collection::Portfolios;
}

/// Body of a create request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRecord<T> {
    user_id: String,
    data: T,
}

/// Result of a delete.
#[derive(Debug, Serialize)]
pub struct Deleted {
    deleted: usize,
}

/// Routes for one entity type.
pub fn routes<T: Entity>() -> Router<AppState> {
    let c = T::COLLECTION.as_str();
    Router::new()
        .route(&format!("/api/{c}"), post(create::<T>))
        .route(
            &format!("/api/{c}/{{id}}"),
            get(fetch::<T>).put(replace::<T>).delete(remove::<T>),
        )
        .route(
            &format!("/api/users/{{user_id}}/{c}"),
            get(list::<T>).delete(remove_all::<T>),
        )
}

fn body<B>(payload: Result<Json<B>, JsonRejection>) -> Result<B, MercatoError> {
    payload
        .map(|Json(b)| b)
        .map_err(|e| MercatoError::InvalidArg(e.body_text()))
}

fn encode<T: Entity>(data: &T) -> Result<Value, MercatoError> {
    data.validate()?;
    serde_json::to_value(data).map_err(|e| MercatoError::Data(e.to_string()))
}

fn record_id(raw: &str) -> Result<Uuid, MercatoError> {
    Uuid::parse_str(raw).map_err(|_| MercatoError::InvalidArg(format!("'{raw}' is not a record id")))
}

async fn create<T: Entity>(
    State(state): State<AppState>,
    payload: Result<Json<NewRecord<T>>, JsonRejection>,
) -> Result<(StatusCode, Envelope<Record<Value>>), ApiError> {
    let req = body(payload)?;
    let data = encode(&req.data)?;
    let record = state.store.save(T::COLLECTION, &req.user_id, data).await?;
    tracing::info!(
        target: "mercato_server::records",
        collection = T::COLLECTION.as_str(),
        id = %record.id,
        "record saved"
    );
    Ok((StatusCode::CREATED, Envelope::ok(record)))
}

async fn fetch<T: Entity>(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Envelope<Record<Value>>, ApiError> {
    let id = record_id(&id)?;
    let record = state
        .store
        .get(T::COLLECTION, &Scope::Record(id))
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| MercatoError::not_found(format!("{} record {id}", T::COLLECTION.as_str())))?;
    Ok(Envelope::ok(record))
}

async fn replace<T: Entity>(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<T>, JsonRejection>,
) -> Result<Envelope<Record<Value>>, ApiError> {
    let id = record_id(&id)?;
    let data = encode(&body(payload)?)?;
    let record = state.store.update(T::COLLECTION, id, data).await?;
    Ok(Envelope::ok(record))
}

async fn remove<T: Entity>(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Envelope<Deleted>, ApiError> {
    let id = record_id(&id)?;
    let deleted = state.store.delete(T::COLLECTION, &Scope::Record(id)).await?;
    Ok(Envelope::ok(Deleted { deleted }))
}

async fn list<T: Entity>(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Envelope<Vec<Record<Value>>>, ApiError> {
    let records = state.store.get(T::COLLECTION, &Scope::User(user_id)).await?;
    Ok(Envelope::ok(records))
}

async fn remove_all<T: Entity>(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Envelope<Deleted>, ApiError> {
    let deleted = state.store.delete(T::COLLECTION, &Scope::User(user_id)).await?;
    Ok(Envelope::ok(Deleted { deleted }))
}
