//! Per-tab permission flags for the UI.

use axum::extract::State;
use axum::{Json, Router, routing::get};
use serde_json::json;
use std::collections::BTreeMap;

use crate::AppState;
use tresor_shared::config::TabPermissions;

/// GET `/uam/permissions/permissions-json` - Per-domain action flags.
///
/// Purely informational for the caller's button rendering; the engine
/// enforces only its own state-machine guards. Domains absent from
/// configuration get the all-true default.
async fn permissions_json(State(state): State<AppState>) -> Json<serde_json::Value> {
    let flags: BTreeMap<String, TabPermissions> = state
        .engine
        .schemas()
        .domains()
        .into_iter()
        .map(|domain| {
            let perms = state
                .config
                .permissions
                .get(&domain)
                .copied()
                .unwrap_or_default();
            (domain, perms)
        })
        .collect();

    Json(json!({ "success": true, "data": flags }))
}

/// Creates the permission routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/uam/permissions/permissions-json", get(permissions_json))
}
