//! Generic master-data lifecycle routes.
//!
//! One set of handlers serves every registered entity domain; the
//! `{domain}` path segment selects the schema. Unknown domains get a
//! 404 envelope before the engine is touched.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use std::collections::BTreeMap;
use tracing::error;

use crate::{AppState, extractors::Caller};
use tresor_core::workflow::{
    ActiveStatus, AsOfFilter, BulkOutcome, Decision, ProcessingStatus, RecordFilter, UpdateRow,
    WorkflowError,
};
use tresor_shared::types::{FieldMap, RecordId, UserId};

/// Creates the master-data routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/{domain}/bulk-approve", post(bulk_approve))
        .route("/{domain}/bulk-reject", post(bulk_reject))
        .route("/{domain}/bulk-delete", post(bulk_delete))
        .route("/{domain}/update", post(update))
        .route("/{domain}/create", post(create))
        .route("/{domain}/all", post(list_all))
        .route("/{domain}/names", post(list_names))
        .route("/{domain}/summary", post(summary))
}

// ============================================================================
// Request Types
// ============================================================================

/// Request body for bulk approve/reject.
#[derive(Debug, Deserialize)]
pub struct BulkResolveRequest {
    /// Target record ids.
    pub ids: Vec<RecordId>,
    /// Optional checker comment, shared by the batch.
    pub comment: Option<String>,
}

/// Request body for bulk delete.
#[derive(Debug, Deserialize)]
pub struct BulkDeleteRequest {
    /// Target record ids.
    pub ids: Vec<RecordId>,
    /// Justification, shared by the batch. Mandatory.
    pub reason: Option<String>,
}

/// One row of a bulk edit request.
#[derive(Debug, Deserialize)]
pub struct UpdateRowRequest {
    /// The record to edit.
    pub id: RecordId,
    /// Candidate field values.
    pub fields: FieldMap,
    /// Optional justification.
    pub reason: Option<String>,
}

/// Request body for bulk edit.
#[derive(Debug, Deserialize)]
pub struct UpdateRequest {
    /// Edited rows.
    pub rows: Vec<UpdateRowRequest>,
}

/// Request body for record creation.
#[derive(Debug, Deserialize)]
pub struct CreateRequest {
    /// Initial field values.
    pub fields: FieldMap,
    /// Keep the record as a maker-owned draft.
    #[serde(default)]
    pub draft: bool,
}

/// Optional listing filter.
#[derive(Debug, Default, Deserialize)]
pub struct ListRequest {
    /// Case-insensitive substring match across field renderings.
    pub search: Option<String>,
    /// Equality filter on processing status.
    pub processing_status: Option<ProcessingStatus>,
    /// Equality filter on the business activity flag.
    pub active_status: Option<ActiveStatus>,
    /// At-or-before constraint on the domain's date field.
    pub as_of: Option<NaiveDate>,
    /// Include logically deleted records.
    #[serde(default)]
    pub include_deleted: bool,
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST `/{domain}/bulk-approve` - Approve the pending requests of the
/// selected records.
async fn bulk_approve(
    State(state): State<AppState>,
    Path(domain): Path<String>,
    caller: Caller,
    Json(payload): Json<BulkResolveRequest>,
) -> Response {
    resolve_bulk(&state, &domain, caller.0, payload, Decision::Approve).await
}

/// POST `/{domain}/bulk-reject` - Reject the pending requests of the
/// selected records.
async fn bulk_reject(
    State(state): State<AppState>,
    Path(domain): Path<String>,
    caller: Caller,
    Json(payload): Json<BulkResolveRequest>,
) -> Response {
    resolve_bulk(&state, &domain, caller.0, payload, Decision::Reject).await
}

async fn resolve_bulk(
    state: &AppState,
    domain: &str,
    checker: UserId,
    payload: BulkResolveRequest,
    decision: Decision,
) -> Response {
    if let Err(e) = state.engine.schemas().get(domain) {
        return error_response(&e);
    }

    match state
        .engine
        .bulk_resolve(&payload.ids, decision, checker, payload.comment)
        .await
    {
        Ok(outcome) => outcome_response(&outcome),
        Err(e) => {
            error!(domain, error = %e, "bulk resolution rejected");
            error_response(&e)
        }
    }
}

/// POST `/{domain}/bulk-delete` - Submit deletion for the selected
/// records.
async fn bulk_delete(
    State(state): State<AppState>,
    Path(domain): Path<String>,
    caller: Caller,
    Json(payload): Json<BulkDeleteRequest>,
) -> Response {
    if let Err(e) = state.engine.schemas().get(&domain) {
        return error_response(&e);
    }

    match state
        .engine
        .bulk_delete(&payload.ids, payload.reason, caller.0)
        .await
    {
        Ok(outcome) => outcome_response(&outcome),
        Err(e) => {
            error!(domain, error = %e, "bulk delete rejected");
            error_response(&e)
        }
    }
}

/// POST `/{domain}/update` - Submit edits for a set of rows.
async fn update(
    State(state): State<AppState>,
    Path(domain): Path<String>,
    caller: Caller,
    Json(payload): Json<UpdateRequest>,
) -> Response {
    if let Err(e) = state.engine.schemas().get(&domain) {
        return error_response(&e);
    }

    let rows: Vec<UpdateRow> = payload
        .rows
        .into_iter()
        .map(|row| UpdateRow {
            record_id: row.id,
            fields: row.fields,
            reason: row.reason,
        })
        .collect();

    match state.engine.bulk_update(&rows, caller.0).await {
        Ok(outcome) => outcome_response(&outcome),
        Err(e) => {
            error!(domain, error = %e, "bulk edit rejected");
            error_response(&e)
        }
    }
}

/// POST `/{domain}/create` - Propose a new record.
async fn create(
    State(state): State<AppState>,
    Path(domain): Path<String>,
    caller: Caller,
    Json(payload): Json<CreateRequest>,
) -> Response {
    match state
        .engine
        .create(&domain, payload.fields, caller.0, payload.draft)
        .await
    {
        Ok(record) => (
            StatusCode::CREATED,
            Json(json!({ "success": true, "data": record })),
        )
            .into_response(),
        Err(e) => error_response(&e),
    }
}

/// POST `/{domain}/all` - Full record projection for the table layer.
async fn list_all(
    State(state): State<AppState>,
    Path(domain): Path<String>,
    payload: Option<Json<ListRequest>>,
) -> Response {
    let filter = match build_filter(&state, &domain, payload) {
        Ok(filter) => filter,
        Err(response) => return response,
    };
    let rows = state.engine.list(&filter);
    Json(json!({ "success": true, "rows": rows })).into_response()
}

/// POST `/{domain}/names` - Minimal `{id, name}` projection for
/// dropdowns and pickers.
async fn list_names(
    State(state): State<AppState>,
    Path(domain): Path<String>,
    payload: Option<Json<ListRequest>>,
) -> Response {
    let filter = match build_filter(&state, &domain, payload) {
        Ok(filter) => filter,
        Err(response) => return response,
    };
    let rows: Vec<serde_json::Value> = state
        .engine
        .list(&filter)
        .into_iter()
        .map(|record| {
            let name = record
                .fields
                .get("name")
                .or_else(|| record.fields.values().next())
                .map(ToString::to_string)
                .unwrap_or_default();
            json!({ "id": record.id, "name": name })
        })
        .collect();
    Json(json!({ "success": true, "rows": rows })).into_response()
}

/// POST `/{domain}/summary` - Record counts by processing status.
async fn summary(
    State(state): State<AppState>,
    Path(domain): Path<String>,
    payload: Option<Json<ListRequest>>,
) -> Response {
    let filter = match build_filter(&state, &domain, payload) {
        Ok(filter) => filter,
        Err(response) => return response,
    };
    let records = state.engine.list(&filter);

    let mut by_status: BTreeMap<&'static str, u64> = BTreeMap::new();
    for record in &records {
        *by_status.entry(record.processing_status.as_str()).or_insert(0) += 1;
    }

    Json(json!({
        "success": true,
        "data": {
            "total": records.len(),
            "by_processing_status": by_status,
        }
    }))
    .into_response()
}

// ============================================================================
// Helper Functions
// ============================================================================

#[allow(clippy::result_large_err)]
fn build_filter(
    state: &AppState,
    domain: &str,
    payload: Option<Json<ListRequest>>,
) -> Result<RecordFilter, Response> {
    let schema = match state.engine.schemas().get(domain) {
        Ok(schema) => schema,
        Err(e) => return Err(error_response(&e)),
    };
    let request = payload.map(|Json(request)| request).unwrap_or_default();

    let as_of = match request.as_of {
        Some(date) => match &schema.date_field {
            Some(field) => Some(AsOfFilter {
                field: field.clone(),
                date,
            }),
            None => {
                return Err((
                    StatusCode::BAD_REQUEST,
                    Json(json!({
                        "success": false,
                        "error": {
                            "code": "VALIDATION_ERROR",
                            "message": format!("Domain {domain} has no as-of date field"),
                        }
                    })),
                )
                    .into_response());
            }
        },
        None => None,
    };

    Ok(RecordFilter {
        entity_type: Some(domain.to_string()),
        search: request.search,
        processing_status: request.processing_status,
        active_status: request.active_status,
        as_of,
        include_deleted: request.include_deleted,
    })
}

fn outcome_response(outcome: &BulkOutcome) -> Response {
    let mut results: Vec<serde_json::Value> = outcome
        .succeeded
        .iter()
        .map(|id| json!({ "id": id, "success": true }))
        .collect();
    results.extend(
        outcome
            .failed
            .iter()
            .map(|f| json!({ "id": f.record_id, "success": false, "error": f.error })),
    );

    Json(json!({ "success": outcome.is_success(), "results": results })).into_response()
}

fn error_response(err: &WorkflowError) -> Response {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        Json(json!({
            "success": false,
            "error": {
                "code": err.error_code(),
                "message": err.to_string(),
            }
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AppState, create_router};
    use axum::Router;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use rstest::rstest;
    use serde_json::Value;
    use std::collections::HashMap;
    use std::str::FromStr;
    use std::sync::Arc;
    use tower::ServiceExt;
    use tresor_core::workflow::{LifecycleService, SchemaRegistry};
    use tresor_shared::config::{AppConfig, ServerConfig, TabPermissions};

    fn test_state() -> AppState {
        let mut permissions = HashMap::new();
        permissions.insert(
            "bank".to_string(),
            TabPermissions {
                approve: true,
                reject: true,
                edit: false,
                delete: false,
            },
        );
        AppState {
            engine: Arc::new(LifecycleService::new(SchemaRegistry::treasury_defaults())),
            config: Arc::new(AppConfig {
                server: ServerConfig {
                    host: "127.0.0.1".to_string(),
                    port: 0,
                },
                permissions,
            }),
        }
    }

    fn app() -> (Router, UserId) {
        (create_router(test_state()), UserId::new())
    }

    async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        user: Option<UserId>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            builder = builder.header("x-user-id", user.to_string());
        }
        let body = match body {
            Some(value) => {
                builder = builder.header("content-type", "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };
        let response = app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn create_bank(app: &Router, user: UserId, name: &str) -> RecordId {
        let (status, body) = send(
            app,
            "POST",
            "/api/v1/bank/create",
            Some(user),
            Some(json!({ "fields": { "name": name, "swift_code": "HBUKGB4B" } })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        RecordId::from_str(body["data"]["id"].as_str().unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let (app, _) = app();
        let (status, body) = send(&app, "GET", "/api/v1/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_permissions_reflect_configuration() {
        let (app, _) = app();
        let (status, body) = send(
            &app,
            "GET",
            "/api/v1/uam/permissions/permissions-json",
            None,
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        // Configured domain verbatim, unconfigured domain all-true.
        assert_eq!(body["data"]["bank"]["edit"], false);
        assert_eq!(body["data"]["currency"]["edit"], true);
    }

    #[rstest]
    #[case("bulk-approve", json!({ "ids": [] }))]
    #[case("create", json!({ "fields": {} }))]
    #[case("all", json!({}))]
    #[tokio::test]
    async fn test_unknown_domain_is_404(#[case] op: &str, #[case] body: Value) {
        let (app, user) = app();
        let (status, body) = send(
            &app,
            "POST",
            &format!("/api/v1/warehouse/{op}"),
            Some(user),
            Some(body),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "UNKNOWN_ENTITY_TYPE");
    }

    #[tokio::test]
    async fn test_mutation_requires_user_header() {
        let (app, _) = app();
        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/bank/create",
            None,
            Some(json!({ "fields": { "name": "HSBC", "swift_code": "HBUKGB4B" } })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_create_approve_list_flow() {
        let (app, maker) = app();
        let id = create_bank(&app, maker, "HSBC London").await;

        let checker = UserId::new();
        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/bank/bulk-approve",
            Some(checker),
            Some(json!({ "ids": [id], "comment": "looks right" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["results"][0]["success"], true);

        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/bank/all",
            None,
            Some(json!({ "search": "london" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["rows"].as_array().unwrap().len(), 1);
        assert_eq!(body["rows"][0]["processing_status"], "approved");
    }

    #[tokio::test]
    async fn test_bulk_approve_precheck_conflict() {
        let (app, maker) = app();
        let id = create_bank(&app, maker, "HSBC").await;
        let checker = UserId::new();
        send(
            &app,
            "POST",
            "/api/v1/bank/bulk-approve",
            Some(checker),
            Some(json!({ "ids": [id] })),
        )
        .await;

        // Approving an already-approved record fails the whole batch.
        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/bank/bulk-approve",
            Some(checker),
            Some(json!({ "ids": [id] })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "INVALID_BULK_TARGET");
    }

    #[tokio::test]
    async fn test_bulk_delete_requires_reason() {
        let (app, maker) = app();
        let id = create_bank(&app, maker, "HSBC").await;

        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/bank/bulk-delete",
            Some(maker),
            Some(json!({ "ids": [id] })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "DELETE_REASON_REQUIRED");
    }

    #[tokio::test]
    async fn test_update_enters_edit_approval() {
        let (app, maker) = app();
        let id = create_bank(&app, maker, "HSBC").await;
        let checker = UserId::new();
        send(
            &app,
            "POST",
            "/api/v1/bank/bulk-approve",
            Some(checker),
            Some(json!({ "ids": [id] })),
        )
        .await;

        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/bank/update",
            Some(maker),
            Some(json!({
                "rows": [{ "id": id, "fields": { "country": "GB" }, "reason": "enrichment" }]
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);

        let (_, body) = send(
            &app,
            "POST",
            "/api/v1/bank/all",
            None,
            Some(json!({ "processing_status": "pending_edit_approval" })),
        )
        .await;
        assert_eq!(body["rows"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_names_and_summary_projections() {
        let (app, maker) = app();
        create_bank(&app, maker, "HSBC").await;
        create_bank(&app, maker, "Deutsche Bank").await;

        let (status, body) = send(&app, "POST", "/api/v1/bank/names", None, None).await;
        assert_eq!(status, StatusCode::OK);
        let rows = body["rows"].as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r["id"].is_string() && r["name"].is_string()));

        let (status, body) = send(&app, "POST", "/api/v1/bank/summary", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["total"], 2);
        assert_eq!(body["data"]["by_processing_status"]["pending_approval"], 2);
    }

    #[tokio::test]
    async fn test_as_of_rejected_without_date_field() {
        let (app, _) = app();
        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/bank/all",
            None,
            Some(json!({ "as_of": "2024-01-31" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }
}
