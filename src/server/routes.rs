use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, Query, State as Extract},
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{field::Empty, info, instrument, Span};

use super::error::AppError;
use super::payloads::{field_text, materials, missing_contact_fields, Created, OrderPayload, PrintPayload};
use super::state::State;
use crate::templates;

#[derive(Debug, Deserialize)]
pub struct CatalogQuery {
    page: Option<String>,
}

pub async fn catalog_handler(Extract(state): Extract<Arc<State>>, Query(query): Query<CatalogQuery>) -> impl IntoResponse {
    Json(state.catalog.page(query.page.as_deref()))
}

pub async fn materials_handler() -> impl IntoResponse {
    Json(materials())
}

/// Relays a ready-made order summary from the contact form to the shop.
/// Answers before the email is delivered.
#[instrument(skip_all, fields(user_name = Empty))]
pub async fn send_email_handler(
    Extract(state): Extract<Arc<State>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    if !is_json(&headers) {
        return Err(AppError::UnsupportedContentType);
    }

    let body = match serde_json::from_slice::<Value>(&body) {
        Ok(Value::Object(body)) => body,
        Ok(_) => return Err(AppError::MalformedPayload("expected a JSON object".to_string())),
        Err(e) => return Err(AppError::MalformedPayload(e.to_string())),
    };

    let missing = missing_contact_fields(&body);
    if !missing.is_empty() {
        return Err(AppError::MissingFields(missing));
    }

    let user_name = field_text(&body, "userName");
    Span::current().record("user_name", user_name.as_str());
    let email = templates::contact_email(&user_name, &field_text(&body, "emailContent"));
    state
        .notifier
        .notify(email)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    info!(user_name = %user_name, "Contact request queued");
    Ok(Json(json!({
        "success": true,
        "message": "Order received. We will contact you soon."
    })))
}

#[instrument(skip_all, fields(user_name = Empty, figure_type = Empty, accessories = Empty))]
pub async fn order_handler(
    Extract(state): Extract<Arc<State>>,
    payload: Result<Json<OrderPayload>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) = payload.map_err(rejection)?;
    let draft = payload.into_draft()?;

    let span = Span::current();
    span.record("user_name", draft.contact.name.as_str());
    span.record("accessories", draft.accessories.len());
    if let Some(kind) = draft.kind {
        span.record("figure_type", kind.as_str());
    }

    let receipt = state.orders.submit_order(draft).await?;
    Ok((StatusCode::CREATED, Json(Created::new(receipt))))
}

#[instrument(skip_all, fields(user_email = Empty, file_name = Empty))]
pub async fn print_order_handler(
    Extract(state): Extract<Arc<State>>,
    payload: Result<Json<PrintPayload>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) = payload.map_err(rejection)?;
    let draft = payload.into_draft(state.limits.max_model_bytes)?;

    let span = Span::current();
    span.record("user_email", draft.email.as_str());
    if let Some(file) = &draft.file {
        span.record("file_name", file.file_name.as_str());
    }

    let receipt = state.orders.submit_print_order(draft).await?;
    Ok((StatusCode::CREATED, Json(Created::new(receipt))))
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case("application/json"))
}

fn rejection(rejection: JsonRejection) -> AppError {
    match rejection {
        JsonRejection::MissingJsonContentType(_) => AppError::UnsupportedContentType,
        other if other.status() == StatusCode::PAYLOAD_TOO_LARGE => AppError::PayloadTooLarge,
        other => AppError::MalformedPayload(other.body_text()),
    }
}
