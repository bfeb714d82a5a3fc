//! `/auth/login` and `/auth/register` over the `users` collection.
//!
//! Tokens are base64-encoded JSON (`{userId, role, exp}`), not signed.
//! They identify the caller to the frontend and carry no authority here.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use base64::{engine::general_purpose, Engine as _};
use chrono::{DateTime, Duration, Utc};
use serde_json::{json, Map, Value};

use super::error::ApiError;
use super::AppState;
use crate::entity::iso_millis;
use crate::error::ConchitasError;
use crate::storage::{DocumentStore, DocumentStoreExt};

const USERS: &str = "users";
pub const APPROVED: &str = "approved";
pub const TOKEN_TTL_HOURS: i64 = 24;
const REGISTER_REQUIRED: [&str; 4] = ["email", "password", "firstName", "lastName"];

/// Present and non-empty, the way the frontend checks form fields.
fn text_field<'a>(body: &'a Value, key: &str) -> Option<&'a str> {
    match body.get(key) {
        Some(Value::String(s)) if !s.is_empty() => Some(s),
        _ => None,
    }
}

fn without_password(user: &Value) -> Value {
    let mut user = user.clone();
    if let Value::Object(fields) = &mut user {
        fields.shift_remove("password");
    }
    user
}

pub fn issue_token(user: &Value, now: DateTime<Utc>) -> String {
    let exp = (now + Duration::hours(TOKEN_TTL_HOURS)).timestamp_millis();
    let payload = json!({
        "userId": user.get("id").cloned().unwrap_or(Value::Null),
        "role": user.get("role").cloned().unwrap_or(Value::Null),
        "exp": exp,
    });
    general_purpose::STANDARD.encode(payload.to_string())
}

pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(body) = body?;
    let (Some(email), Some(password)) = (text_field(&body, "email"), text_field(&body, "password"))
    else {
        return Err(ApiError::bad_request("Email y contraseña son requeridos"));
    };

    let doc = state.with_store(|store| store.load()).await?;
    let users = doc.collection_or_empty(USERS);
    let user = users
        .iter()
        .find(|u| {
            u.get("email").and_then(Value::as_str) == Some(email)
                && u.get("password").and_then(Value::as_str) == Some(password)
        })
        .ok_or_else(|| ApiError::new(StatusCode::UNAUTHORIZED, "Credenciales incorrectas"))?;

    if user.get("status").and_then(Value::as_str) != Some(APPROVED) {
        tracing::info!(email, "login refused for unapproved user");
        return Err(ApiError::new(
            StatusCode::FORBIDDEN,
            "Usuario pendiente de aprobación",
        ));
    }

    let token = issue_token(user, Utc::now());
    Ok(Json(json!({
        "success": true,
        "data": {
            "user": without_password(user),
            "token": token,
        }
    })))
}

pub async fn register(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let Json(body) = body?;
    let Value::Object(fields) = &body else {
        return Err(ApiError::bad_request("Todos los campos son requeridos"));
    };
    if REGISTER_REQUIRED
        .iter()
        .any(|key| text_field(&body, key).is_none())
    {
        return Err(ApiError::bad_request("Todos los campos son requeridos"));
    }
    let email = text_field(&body, "email").unwrap_or_default();

    let now = Utc::now();
    let mut user = Map::new();
    user.insert(
        "id".to_string(),
        Value::from(format!("user-{}", now.timestamp_millis())),
    );
    for (key, value) in fields {
        user.insert(key.clone(), value.clone());
    }
    if text_field(&body, "status").is_none() {
        user.insert("status".to_string(), Value::from("pending"));
    }
    let stamp = Value::from(iso_millis::format(&now));
    user.insert("createdAt".to_string(), stamp.clone());
    user.insert("updatedAt".to_string(), stamp);
    let user = Value::Object(user);

    let email = email.to_string();
    let record = user.clone();
    let saved = state
        .with_store(move |store| {
            store.update(|doc| {
                let mut users = doc.collection_or_empty(USERS);
                if users.iter().any(|u| u.get("email") == record.get("email")) {
                    return Err(ConchitasError::DuplicateRecord {
                        collection: USERS.to_string(),
                        id: email,
                    });
                }
                users.push(record);
                doc.put_collection(USERS, users);
                Ok(())
            })
        })
        .await;
    match saved {
        Err(ConchitasError::DuplicateRecord { .. }) => {
            return Err(ApiError::new(
                StatusCode::CONFLICT,
                "El correo ya está registrado",
            ))
        }
        other => other?,
    }

    tracing::info!(id = %user["id"], "user registered");
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "data": without_password(&user) })),
    ))
}
