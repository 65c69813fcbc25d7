//! HTTP surface
//!
//! JSON routes over [`ClaimService`]. Rejections map to 400, missing data to
//! 404 and integrity faults to 500. Every error body is `{"error": "..."}`.

use crate::config::RelayConfig;
use crate::service::{ClaimService, SubmitOutcome};
use anchor_core::{Address, AnchorError, Hash};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn};

/// Shared state for handlers
pub type AppState = Arc<ClaimService>;

/// Claim submission body
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedClaimRequest {
    /// Claim bytes as hex
    pub value_hex: String,
    /// Signature blob as hex, required for key authorizations
    #[serde(default)]
    pub signature_hex: Option<String>,
}

/// Error mapped to a status code and JSON body
#[derive(Debug)]
pub struct ApiError(AnchorError);

impl From<AnchorError> for ApiError {
    fn from(err: AnchorError) -> Self {
        Self(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            err if err.is_rejection() => StatusCode::BAD_REQUEST,
            AnchorError::ClaimNotFound { .. } => StatusCode::NOT_FOUND,
            AnchorError::LedgerUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self.0, "request failed");
        } else {
            warn!(error = %self.0, status = status.as_u16(), "request rejected");
        }
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

/// Build the router
pub fn router(service: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/v0.1/root", get(get_root))
        .route("/api/v0.1/claim/:idaddr", post(post_claim))
        .route("/api/v0.1/claim/:idaddr/root", get(get_identity_root))
        .route(
            "/api/v0.1/claim/:idaddr/hi/:hi/nonrevocation",
            get(get_non_revocation),
        )
        .route(
            "/api/v0.1/claim_proof/idaddr/:idaddr/hi/:hi",
            get(get_claim_proof),
        )
        .route(
            "/api/v0.1/claim_proof/idaddr/:idaddr/hi/:hi/committed",
            get(get_committed_claim_proof),
        )
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(service)
}

/// Bind the configured address and serve until shutdown
pub async fn serve(config: &RelayConfig, service: AppState) -> anyhow::Result<()> {
    let addr = config.bind_socket_addr()?;
    let listener = TcpListener::bind(addr).await?;
    info!(address = %addr, namespace = %config.namespace, "relay listening");
    axum::serve(listener, router(service))
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "failed to listen for shutdown signal");
            }
        })
        .await?;
    Ok(())
}

fn parse_identity(raw: &str) -> ApiResult<Address> {
    Ok(Address::from_hex(raw)?)
}

fn parse_hi(raw: &str) -> ApiResult<Hash> {
    Ok(Hash::from_hex(raw)?)
}

async fn health_check() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn post_claim(
    State(service): State<AppState>,
    Path(idaddr): Path<String>,
    Json(body): Json<SignedClaimRequest>,
) -> ApiResult<Response> {
    let identity = parse_identity(&idaddr)?;
    let outcome =
        service.submit_claim_hex(&identity, &body.value_hex, body.signature_hex.as_deref())?;
    Ok(match outcome {
        SubmitOutcome::Anchored(receipt) => (
            StatusCode::OK,
            Json(json!({
                "claim": receipt.claim,
                "proofOfClaim": receipt.proof,
                "proofOfClaimHex": receipt.proof.to_hex(),
            })),
        )
            .into_response(),
        SubmitOutcome::Ignored(kind) => {
            (StatusCode::ACCEPTED, Json(json!({ "ignored": kind }))).into_response()
        }
    })
}

async fn get_identity_root(
    State(service): State<AppState>,
    Path(idaddr): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    let identity = parse_identity(&idaddr)?;
    let view = service.get_identity_root(&identity)?;
    Ok(Json(json!({
        "root": view.relay_root,
        "idRoot": view.identity_root,
        "idRootProof": view.proof.path_hex(),
        "setRootClaim": anchor_core::Claim::from(view.set_root_claim),
    })))
}

async fn get_claim_proof(
    State(service): State<AppState>,
    Path((idaddr, hi)): Path<(String, String)>,
) -> ApiResult<Json<serde_json::Value>> {
    let identity = parse_identity(&idaddr)?;
    let receipt = service.get_claim_by_index(&identity, &parse_hi(&hi)?)?;
    Ok(Json(json!({
        "claim": receipt.claim,
        "proofOfClaim": receipt.proof,
        "proofOfClaimHex": receipt.proof.to_hex(),
    })))
}

async fn get_committed_claim_proof(
    State(service): State<AppState>,
    Path((idaddr, hi)): Path<(String, String)>,
) -> ApiResult<Json<serde_json::Value>> {
    let identity = parse_identity(&idaddr)?;
    let hi = parse_hi(&hi)?;
    // Best effort: a stale committed root still yields a valid older proof
    if let Err(e) = service.refresh_committed_root().await {
        warn!(error = %e, "using last known committed root");
    }
    let proof = service.get_committed_claim_proof(&identity, &hi)?;
    Ok(Json(json!({
        "proofOfClaimHex": proof.to_hex(),
        "proofOfClaim": proof,
    })))
}

async fn get_non_revocation(
    State(service): State<AppState>,
    Path((idaddr, hi)): Path<(String, String)>,
) -> ApiResult<Json<serde_json::Value>> {
    let identity = parse_identity(&idaddr)?;
    let proof = service.get_non_revocation_proof(&identity, &parse_hi(&hi)?)?;
    Ok(Json(json!({ "nonRevocationProof": proof })))
}

async fn get_root(State(service): State<AppState>) -> Json<serde_json::Value> {
    let roots = service.get_global_and_committed_root().await;
    Json(json!({
        "root": roots.relay_root,
        "contractRoot": roots.committed_root,
        "status": roots.status,
    }))
}
