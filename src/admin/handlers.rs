//! Moderator endpoints. Every handler here sits behind
//! [`admin_auth_middleware`](super::auth::admin_auth_middleware).

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde_json::{json, Value};

use crate::catalog::{validation::merge_settings, Document, Item, Lead, Settings};
use crate::http::request::Payload;
use crate::http::response::ApiError;
use crate::http::server::AppState;

pub async fn list_items(State(state): State<AppState>) -> Result<Json<Vec<Item>>, ApiError> {
    let doc = state.store.load().await?;
    Ok(Json(doc.items))
}

pub async fn create_item(
    State(state): State<AppState>,
    Payload(payload): Payload,
) -> Result<impl IntoResponse, ApiError> {
    let item = state.policy.accept_admin_item(&payload)?;
    let id = item.id.clone();
    state
        .store
        .mutate(|doc: &mut Document| {
            doc.items.insert(0, item);
            Ok::<_, ApiError>(())
        })
        .await?;

    tracing::info!(item_id = %id, "Item created by admin");
    Ok((StatusCode::CREATED, Json(json!({ "success": true, "id": id }))))
}

pub async fn update_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Payload(payload): Payload,
) -> Result<Json<Item>, ApiError> {
    let updated = state
        .store
        .mutate(|doc: &mut Document| {
            let item = doc.item_mut(&id).ok_or(ApiError::NotFound)?;
            state.policy.apply_update(item, &payload)?;
            Ok::<_, ApiError>(item.clone())
        })
        .await?;

    tracing::info!(item_id = %updated.id, status = %updated.status, "Item updated");
    Ok(Json(updated))
}

pub async fn delete_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state
        .store
        .mutate(|doc: &mut Document| doc.remove_item(&id).map(drop).ok_or(ApiError::NotFound))
        .await?;

    tracing::info!(item_id = %id, "Item deleted");
    Ok(Json(json!({ "success": true })))
}

pub async fn list_leads(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let doc = state.store.load().await?;
    Ok(Json(json!({ "items": doc.leads })))
}

pub async fn export_leads(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let doc = state.store.load().await?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"leads.csv\""),
        ],
        leads_csv(&doc.leads),
    ))
}

pub async fn delete_lead(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state
        .store
        .mutate(|doc: &mut Document| doc.remove_lead(&id).map(drop).ok_or(ApiError::NotFound))
        .await?;

    tracing::info!(lead_id = %id, "Lead deleted");
    Ok(Json(json!({ "success": true })))
}

pub async fn get_settings(State(state): State<AppState>) -> Result<Json<Settings>, ApiError> {
    let doc = state.store.load().await?;
    Ok(Json(doc.settings))
}

pub async fn update_settings(
    State(state): State<AppState>,
    Payload(payload): Payload,
) -> Result<Json<Settings>, ApiError> {
    let settings = state
        .store
        .mutate(|doc: &mut Document| {
            merge_settings(&mut doc.settings, &payload)?;
            Ok::<_, ApiError>(doc.settings.clone())
        })
        .await?;
    Ok(Json(settings))
}

const CSV_HEADER: &str = "id,email,name,message,ip,ua,tz,createdAt";

fn leads_csv(leads: &[Lead]) -> String {
    let mut out = String::from(CSV_HEADER);
    out.push_str("\r\n");
    for lead in leads {
        let created = lead.created_at.to_string();
        let row = [
            lead.id.as_str(),
            lead.email.as_str(),
            lead.name.as_str(),
            lead.message.as_str(),
            lead.ip.as_str(),
            lead.ua.as_str(),
            lead.tz.as_str(),
            created.as_str(),
        ];
        let cells: Vec<String> = row.iter().map(|c| csv_cell(c)).collect();
        out.push_str(&cells.join(","));
        out.push_str("\r\n");
    }
    out
}

/// Quote when needed. A leading formula character is neutralised so the
/// export is safe to open in a spreadsheet.
fn csv_cell(value: &str) -> String {
    let value = if value.starts_with(['=', '+', '-', '@']) {
        format!("'{value}")
    } else {
        value.to_string()
    };
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value
    }
}
