// SPDX-License-Identifier: MIT

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::approval::flow::{ApprovalFlow, ApprovalFlowDefinition, ApprovalPlan};
use crate::approval::store::FlowStore;
use crate::engine::error::{ApprovalError, FlowError};
use crate::engine::event::EventRecord;
use crate::engine::registry::FieldType;

pub fn router(store: FlowStore) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/flow", get(get_flow).put(put_flow))
        .route("/api/flow/validate", post(validate_flow))
        .route("/api/evaluate", post(evaluate_event))
        .route("/api/operators", get(list_operators))
        .route("/api/schema", get(flow_schema))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(store)
}

pub async fn serve(store: FlowStore, port: u16) -> Result<(), ApprovalError> {
    let app = router(store);

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn get_flow(State(store): State<FlowStore>) -> Json<ApprovalFlowDefinition> {
    let flow = store.current().await;
    Json(flow.definition().clone())
}

async fn put_flow(
    State(store): State<FlowStore>,
    Json(definition): Json<ApprovalFlowDefinition>,
) -> (StatusCode, Json<Value>) {
    let version = definition.version;
    match store.activate(definition).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "status": "active", "version": version })),
        ),
        Err(errors) => rejection(&errors),
    }
}

async fn validate_flow(
    Json(definition): Json<ApprovalFlowDefinition>,
) -> (StatusCode, Json<Value>) {
    let errors = ApprovalFlow::check(&definition);
    if errors.is_empty() {
        (StatusCode::OK, Json(json!({ "status": "valid" })))
    } else {
        rejection(&errors)
    }
}

#[derive(Deserialize)]
struct EvaluationRequest {
    event: EventRecord,
    #[serde(default)]
    explain: bool,
}

async fn evaluate_event(
    State(store): State<FlowStore>,
    Json(payload): Json<EvaluationRequest>,
) -> Json<ApprovalPlan> {
    let flow = store.current().await;
    Json(flow.route(&payload.event, payload.explain))
}

async fn list_operators(State(store): State<FlowStore>) -> Json<Value> {
    let flow = store.current().await;
    let registry = flow.registry();
    let table: Vec<Value> = FieldType::ALL
        .iter()
        .filter_map(|ty| {
            let operators = registry.operators_for(*ty).ok()?;
            Some(json!({
                "type": ty.as_str(),
                "operators": operators
                    .iter()
                    .map(|op| json!({ "token": op.token(), "label": op.label() }))
                    .collect::<Vec<_>>(),
            }))
        })
        .collect();
    Json(json!(table))
}

async fn flow_schema() -> Json<schemars::schema::RootSchema> {
    Json(schemars::schema_for!(ApprovalFlowDefinition))
}

/// 422 with every configuration error found in a definition
fn rejection(errors: &[FlowError]) -> (StatusCode, Json<Value>) {
    let errors: Vec<Value> = errors.iter().map(error_entry).collect();
    let body = json!({ "status": "invalid", "errors": errors });
    (StatusCode::UNPROCESSABLE_ENTITY, Json(body))
}

fn error_entry(err: &FlowError) -> Value {
    match err {
        FlowError::Step {
            index,
            role,
            source,
        } => json!({
            "step": index,
            "role": role,
            "reason": source.reason(),
            "message": source.to_string(),
        }),
        FlowError::Registry(inner) => json!({
            "reason": "registry",
            "message": inner.to_string(),
        }),
    }
}
