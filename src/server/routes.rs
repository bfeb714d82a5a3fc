use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;

use super::error::ApiError;
use super::query::ListQuery;
use super::AppState;
use crate::entity::apply_status_change;
use crate::error::ConchitasError;
use crate::storage::{
    id_matches, is_internal, json_type_name, merge_into, Document, DocumentStore, DocumentStoreExt,
};

pub const TOTAL_COUNT_HEADER: &str = "x-total-count";

pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// The whole document, without internal keys.
pub async fn database(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let doc = state.with_store(|store| store.load()).await?;
    Ok(Json(doc.public_view()))
}

/// Records of a public collection. Internal and missing keys are both "not found".
fn records<'a>(doc: &'a Document, collection: &str) -> Result<&'a Vec<Value>, ConchitasError> {
    if is_internal(collection) {
        return Err(ConchitasError::CollectionNotFound(collection.to_string()));
    }
    match doc.get(collection) {
        None => Err(ConchitasError::CollectionNotFound(collection.to_string())),
        Some(Value::Array(items)) => Ok(items),
        Some(_) => Err(ConchitasError::NotACollection(collection.to_string())),
    }
}

fn records_mut<'a>(
    doc: &'a mut Document,
    collection: &str,
) -> Result<&'a mut Vec<Value>, ConchitasError> {
    records(doc, collection)?;
    doc.collection_mut(collection)
        .ok_or_else(|| ConchitasError::CollectionNotFound(collection.to_string()))
}

fn position(items: &[Value], collection: &str, id: &str) -> Result<usize, ConchitasError> {
    items
        .iter()
        .position(|record| id_matches(record, id))
        .ok_or_else(|| ConchitasError::RecordNotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        })
}

fn object_body(body: Result<Json<Value>, JsonRejection>) -> Result<Value, ApiError> {
    let Json(body) = body?;
    if !body.is_object() {
        return Err(ApiError::bad_request("request body must be a JSON object"));
    }
    Ok(body)
}

pub async fn list_records(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Response, ApiError> {
    let doc = state.with_store(|store| store.load()).await?;

    match records(&doc, &collection) {
        Ok(items) => {
            let result = ListQuery::parse(&params)?.apply(items)?;
            let mut response = Json(Value::Array(result.records)).into_response();
            response
                .headers_mut()
                .insert(TOTAL_COUNT_HEADER, HeaderValue::from(result.total));
            Ok(response)
        }
        // Singular resources (plain objects) are served as-is.
        Err(ConchitasError::NotACollection(_)) => {
            let value = doc.get(&collection).cloned().unwrap_or(Value::Null);
            Ok(Json(value).into_response())
        }
        Err(err) => Err(err.into()),
    }
}

pub async fn get_record(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    let doc = state.with_store(|store| store.load()).await?;
    let items = records(&doc, &collection)?;
    let index = position(items, &collection, &id)?;
    Ok(Json(items[index].clone()))
}

/// Append `record`, generating a UUID when it carries no id.
fn insert(
    doc: &mut Document,
    collection: &str,
    mut record: Value,
) -> Result<Value, ConchitasError> {
    let items = records_mut(doc, collection)?;

    if let Value::Object(fields) = &mut record {
        match fields.get("id") {
            None | Some(Value::Null) => {
                fields.insert("id".to_string(), Value::from(Uuid::new_v4().to_string()));
            }
            Some(Value::String(_)) | Some(Value::Number(_)) => {}
            Some(other) => {
                return Err(ConchitasError::InvalidRecord(format!(
                    "id must be a string or number, found {}",
                    json_type_name(other)
                )))
            }
        }
    }

    let id = match &record["id"] {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    if items.iter().any(|existing| id_matches(existing, &id)) {
        return Err(ConchitasError::DuplicateRecord {
            collection: collection.to_string(),
            id,
        });
    }

    items.push(record.clone());
    Ok(record)
}

/// Swap the record for `record`, keeping its original id.
fn replace(
    doc: &mut Document,
    collection: &str,
    id: &str,
    mut record: Value,
) -> Result<Value, ConchitasError> {
    let items = records_mut(doc, collection)?;
    let index = position(items, collection, id)?;

    let original_id = items[index].get("id").cloned().unwrap_or(Value::Null);
    if let Value::Object(fields) = &mut record {
        fields.shift_remove("id");
        let mut with_id = serde_json::Map::new();
        with_id.insert("id".to_string(), original_id);
        with_id.extend(std::mem::take(fields));
        *fields = with_id;
    }

    apply_status_change(collection, &items[index], &mut record, Utc::now())?;
    items[index] = record.clone();
    Ok(record)
}

/// Shallow-merge `changes` into the record.
fn patch(
    doc: &mut Document,
    collection: &str,
    id: &str,
    changes: Value,
) -> Result<Value, ConchitasError> {
    let items = records_mut(doc, collection)?;
    let index = position(items, collection, id)?;

    let mut next = items[index].clone();
    merge_into(&mut next, changes);
    apply_status_change(collection, &items[index], &mut next, Utc::now())?;
    items[index] = next.clone();
    Ok(next)
}

pub async fn create_record(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let record = object_body(body)?;
    let target = collection.clone();

    let created = state
        .with_store(move |store| store.update(|doc| insert(doc, &target, record)))
        .await?;

    tracing::debug!(collection = %collection, "record created");
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn replace_record(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let record = object_body(body)?;

    let replaced = state
        .with_store(move |store| store.update(|doc| replace(doc, &collection, &id, record)))
        .await?;

    Ok(Json(replaced))
}

pub async fn update_record(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let mut changes = object_body(body)?;
    if let Value::Object(fields) = &mut changes {
        fields.shift_remove("id");
    }

    let updated = state
        .with_store(move |store| store.update(|doc| patch(doc, &collection, &id, changes)))
        .await?;

    Ok(Json(updated))
}

pub async fn delete_record(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    state
        .with_store(move |store| {
            store.update(|doc| {
                let items = records_mut(doc, &collection)?;
                let index = position(items, &collection, &id)?;
                items.remove(index);
                Ok(())
            })
        })
        .await?;

    Ok(Json(json!({})))
}
