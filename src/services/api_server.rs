// src/services/api_server.rs
//! API Server for the DID and Document registries
//!
//! This module provides the REST API front-ends use to read and drive both
//! registries. Reads are always available; submissions need a signing session
//! and answer 503 without one.
//!
//! The API is built using Axum and includes endpoints for:
//! - DID views, aggregated verification summaries and lookup by owner
//! - DID creation and verification issuance/revocation
//! - Document views (single and batch) and signature reconciliation
//! - Document registration, signing and revocation
//!
//! Every submission is followed by a fresh read of the affected view, which is
//! what the endpoint returns.

use crate::contracts::did_registry::DidRegistry;
use crate::contracts::document_registry::{DocumentRegistry, NewDocument};
use crate::contracts::{parse_address, parse_bytes32};
use crate::error::RegistryError;
use crate::models::did::{role_from_name, VerificationLevel};
use crate::models::document::{DocumentType, SignatureType};
use crate::services::registry_views::{DidView, DirectoryEntry, DocumentView, RegistryViews};
use crate::services::signature_reconciler::{reconcile_document, Reconciliation};
use crate::services::verification_aggregator::VerificationSummary;
use crate::utils::metadata;
use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Router,
};
use ethers_core::types::{Address, H256};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

// API request and response structures

/// Request payload for creating a new DID
#[derive(Serialize, Deserialize)]
struct CreateDidRequest {
    /// Plain identifiers; hashed before submission
    identifiers: Vec<String>,
}

/// Request payload for replacing a DID's identifiers
#[derive(Serialize, Deserialize)]
struct UpdateDidRequest {
    identifiers: Vec<String>,
}

/// Request payload for adding a verification
#[derive(Serialize, Deserialize)]
struct AddVerificationRequest {
    /// Raw level, 1 (Basic) to 3 (Premium)
    level: u64,
    /// Expiry, seconds since epoch
    expiration: u64,
    #[serde(default)]
    details: String,
}

/// Request payload for registering a document
#[derive(Serialize, Deserialize)]
struct RegisterDocumentRequest {
    content_hash: String,
    /// Type name, e.g. "CONTRACT"
    document_type: String,
    expires_at: u64,
    #[serde(default)]
    metadata: String,
    #[serde(default)]
    required_signers: Vec<String>,
}

/// Request payload for signing a document
#[derive(Serialize, Deserialize)]
struct SignDocumentRequest {
    /// "APPROVE", "REJECT" or "ACKNOWLEDGE"
    signature_type: String,
    #[serde(default)]
    metadata: String,
}

/// Request payload for replacing document metadata
#[derive(Serialize, Deserialize)]
struct UpdateMetadataRequest {
    metadata: String,
}

/// Query string of the batch document endpoint
#[derive(Deserialize)]
struct DocumentsQuery {
    /// Comma-separated document ids
    ids: String,
}

/// Response for the owner lookup
#[derive(Serialize, Deserialize)]
struct OwnerDidResponse {
    owner: Address,
    did: H256,
}

/// Response for the contract-side verification check
#[derive(Serialize, Deserialize)]
struct VerifiedResponse {
    did: H256,
    verified: bool,
}

/// Response for role membership queries and changes
#[derive(Serialize, Deserialize)]
struct RoleResponse {
    role: H256,
    account: Address,
    member: bool,
}

/// Response for pause and unpause
#[derive(Serialize, Deserialize)]
struct PauseResponse {
    paused: bool,
}

/// Local reconciliation next to the contract's own completeness check
#[derive(Serialize, Deserialize)]
struct CompletionResponse {
    #[serde(flatten)]
    reconciliation: Reconciliation,
    contract_complete: bool,
}

/// Response for the liveness check
#[derive(Serialize, Deserialize)]
struct HealthResponse {
    status: String,
    can_submit: bool,
}

/// Error body returned by every endpoint.
///
/// Status codes:
/// - 400 invalid input
/// - 403 submission rejected by the signer
/// - 404 record not found
/// - 409 transaction reverted
/// - 503 no signing session
/// - 502 any other chain failure
pub struct ApiError(RegistryError);

impl From<RegistryError> for ApiError {
    fn from(err: RegistryError) -> Self {
        ApiError(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self.0 {
            RegistryError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            RegistryError::Rejected => StatusCode::FORBIDDEN,
            RegistryError::NotFound(_) => StatusCode::NOT_FOUND,
            RegistryError::Reverted { .. } => StatusCode::CONFLICT,
            RegistryError::NoSession => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status == StatusCode::BAD_GATEWAY {
            error!("request failed: {}", self.0);
        } else {
            warn!("request failed with {}: {}", status, self.0);
        }
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

/// Contract handles used for submissions.
pub struct Submitter {
    dids: DidRegistry,
    documents: DocumentRegistry,
}

impl Submitter {
    /// Both registries must share a client that carries a signing session.
    pub fn new(dids: DidRegistry, documents: DocumentRegistry) -> Self {
        Self { dids, documents }
    }
}

/// API server state containing all service dependencies
#[derive(Clone)]
pub struct ApiServer {
    /// Read-side view builder
    views: RegistryViews,

    /// Submission handles, absent in read-only mode
    submitter: Option<Arc<Submitter>>,
}

impl ApiServer {
    /// Creates a new instance of the API server
    ///
    /// # Arguments
    /// * `views` - View builder over the registry readers
    /// * `submitter` - Submission handles; `None` serves reads only
    pub fn new(views: RegistryViews, submitter: Option<Submitter>) -> Self {
        ApiServer {
            views,
            submitter: submitter.map(Arc::new),
        }
    }

    /// Builds the router with all API routes.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/health", get(Self::health_handler))
            .route("/dids", get(Self::did_directory_handler).post(Self::create_did_handler))
            .route(
                "/dids/:did_id",
                get(Self::did_view_handler)
                    .put(Self::update_did_handler)
                    .delete(Self::deactivate_did_handler),
            )
            .route("/dids/:did_id/verification", get(Self::verification_summary_handler))
            .route("/dids/:did_id/verified", get(Self::is_verified_handler))
            .route(
                "/dids/:did_id/verifications",
                post(Self::add_verification_handler).delete(Self::revoke_verification_handler),
            )
            .route("/owners/:address/did", get(Self::did_by_owner_handler))
            .route(
                "/roles/:role/:address",
                get(Self::role_handler)
                    .put(Self::grant_role_handler)
                    .delete(Self::revoke_role_handler),
            )
            .route("/admin/pause", post(Self::pause_handler))
            .route("/admin/unpause", post(Self::unpause_handler))
            .route(
                "/documents",
                get(Self::document_views_handler).post(Self::register_document_handler),
            )
            .route(
                "/documents/:document_id",
                get(Self::document_view_handler).delete(Self::revoke_document_handler),
            )
            .route("/documents/:document_id/metadata", put(Self::update_metadata_handler))
            .route("/documents/:document_id/completion", get(Self::completion_handler))
            .route(
                "/documents/:document_id/signatures",
                get(Self::reconciliation_handler).post(Self::sign_document_handler),
            )
            .layer(CorsLayer::permissive())
            .with_state(Arc::new(self.clone()))
    }

    /// Starts the API server and begins listening for requests
    ///
    /// # Arguments
    /// * `addr` - Socket address to bind to (e.g., "127.0.0.1:3000")
    pub async fn run(&self, addr: SocketAddr) -> std::io::Result<()> {
        let app = self.router();
        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!("API server listening on http://{}", addr);
        axum::serve(listener, app).await
    }

    fn submitter(&self) -> Result<&Submitter, RegistryError> {
        self.submitter.as_deref().ok_or(RegistryError::NoSession)
    }

    /// # Endpoint
    /// GET /health
    async fn health_handler(State(state): State<Arc<ApiServer>>) -> Json<HealthResponse> {
        Json(HealthResponse {
            status: "ok".to_string(),
            can_submit: state.submitter.is_some(),
        })
    }

    // =====================
    // DID Handlers
    // =====================

    /// Returns the DID with all verifications and the aggregated summary
    ///
    /// # Endpoint
    /// GET /dids/:did_id
    ///
    /// # Responses
    /// - 200 OK: DID view
    /// - 400 Bad Request: Malformed DID id
    /// - 404 Not Found: DID has no owner
    async fn did_view_handler(
        Path(did_id): Path<String>,
        State(state): State<Arc<ApiServer>>,
    ) -> ApiResult<DidView> {
        let did_id = parse_bytes32(&did_id)?;
        Ok(Json(state.views.did_view(did_id).await?))
    }

    /// Lists every created DID with its status flags and summary
    ///
    /// # Endpoint
    /// GET /dids
    ///
    /// # Responses
    /// - 200 OK: Directory rows in creation order; DIDs that fail to load are left out
    /// - 502 Bad Gateway: The creation history cannot be read
    async fn did_directory_handler(State(state): State<Arc<ApiServer>>) -> ApiResult<Vec<DirectoryEntry>> {
        Ok(Json(state.views.did_directory().await?))
    }

    /// Returns only the aggregated verification summary
    ///
    /// # Endpoint
    /// GET /dids/:did_id/verification
    ///
    /// # Responses
    /// - 200 OK: Verification summary
    /// - 404 Not Found: DID has no owner, same as `GET /dids/:did_id`
    async fn verification_summary_handler(
        Path(did_id): Path<String>,
        State(state): State<Arc<ApiServer>>,
    ) -> ApiResult<VerificationSummary> {
        let did_id = parse_bytes32(&did_id)?;
        Ok(Json(state.views.verification_summary(did_id).await?))
    }

    /// Finds the DID currently owned by an address
    ///
    /// # Endpoint
    /// GET /owners/:address/did
    ///
    /// # Responses
    /// - 200 OK: `{ owner, did }`
    /// - 404 Not Found: The address owns no DID
    async fn did_by_owner_handler(
        Path(address): Path<String>,
        State(state): State<Arc<ApiServer>>,
    ) -> ApiResult<OwnerDidResponse> {
        let owner = parse_address(&address)?;
        match state.views.dids().did_by_owner(owner).await? {
            Some(did) => Ok(Json(OwnerDidResponse { owner, did })),
            None => Err(RegistryError::NotFound(format!("DID owned by {:#x}", owner)).into()),
        }
    }

    /// Creates a DID owned by the session account
    ///
    /// # Endpoint
    /// POST /dids
    ///
    /// # Request Body
    /// `{ "identifiers": ["alice@example.com"] }`
    ///
    /// # Responses
    /// - 201 Created: View of the new DID
    /// - 503 Service Unavailable: No signing session
    async fn create_did_handler(
        State(state): State<Arc<ApiServer>>,
        Json(payload): Json<CreateDidRequest>,
    ) -> Result<(StatusCode, Json<DidView>), ApiError> {
        let submitter = state.submitter()?;
        let did_id = submitter.dids.create_did(&payload.identifiers).await?;
        let view = state.views.did_view(did_id).await?;
        Ok((StatusCode::CREATED, Json(view)))
    }

    /// Adds the session verifier's verification to a DID
    ///
    /// # Endpoint
    /// POST /dids/:did_id/verifications
    ///
    /// # Request Body
    /// `{ "level": 2, "expiration": 1767225600, "details": "Passport checked" }`
    ///
    /// # Responses
    /// - 200 OK: Updated verification summary
    /// - 400 Bad Request: Level outside 1..=3
    async fn add_verification_handler(
        Path(did_id): Path<String>,
        State(state): State<Arc<ApiServer>>,
        Json(payload): Json<AddVerificationRequest>,
    ) -> ApiResult<VerificationSummary> {
        let submitter = state.submitter()?;
        let did_id = parse_bytes32(&did_id)?;
        let level = VerificationLevel::try_from(payload.level).map_err(RegistryError::InvalidInput)?;

        submitter
            .dids
            .add_verification(did_id, level, payload.expiration, metadata::encode(&payload.details))
            .await?;
        Ok(Json(state.views.verification_summary(did_id).await?))
    }

    /// Revokes the session verifier's verification of a DID
    ///
    /// # Endpoint
    /// DELETE /dids/:did_id/verifications
    async fn revoke_verification_handler(
        Path(did_id): Path<String>,
        State(state): State<Arc<ApiServer>>,
    ) -> ApiResult<VerificationSummary> {
        let submitter = state.submitter()?;
        let did_id = parse_bytes32(&did_id)?;
        submitter.dids.revoke_verification(did_id).await?;
        Ok(Json(state.views.verification_summary(did_id).await?))
    }

    /// Replaces the identifiers of a DID
    ///
    /// # Endpoint
    /// PUT /dids/:did_id
    ///
    /// # Responses
    /// - 200 OK: Updated DID view
    /// - 503 Service Unavailable: No signing session
    async fn update_did_handler(
        Path(did_id): Path<String>,
        State(state): State<Arc<ApiServer>>,
        Json(payload): Json<UpdateDidRequest>,
    ) -> ApiResult<DidView> {
        let submitter = state.submitter()?;
        let did_id = parse_bytes32(&did_id)?;
        submitter.dids.update_did(did_id, &payload.identifiers).await?;
        Ok(Json(state.views.did_view(did_id).await?))
    }

    /// Deactivates a DID
    ///
    /// # Endpoint
    /// DELETE /dids/:did_id
    async fn deactivate_did_handler(
        Path(did_id): Path<String>,
        State(state): State<Arc<ApiServer>>,
    ) -> ApiResult<DidView> {
        let submitter = state.submitter()?;
        let did_id = parse_bytes32(&did_id)?;
        submitter.dids.deactivate_did(did_id).await?;
        Ok(Json(state.views.did_view(did_id).await?))
    }

    /// Contract-side verification check, independent of the aggregated summary
    ///
    /// # Endpoint
    /// GET /dids/:did_id/verified
    async fn is_verified_handler(
        Path(did_id): Path<String>,
        State(state): State<Arc<ApiServer>>,
    ) -> ApiResult<VerifiedResponse> {
        let did = parse_bytes32(&did_id)?;
        let verified = state.views.dids().is_verified(did).await?;
        Ok(Json(VerifiedResponse { did, verified }))
    }

    // =====================
    // Role and System Handlers
    // =====================

    /// # Endpoint
    /// GET /roles/:role/:address
    ///
    /// `role` is `verifier` or `admin`.
    async fn role_handler(
        Path((role, address)): Path<(String, String)>,
        State(state): State<Arc<ApiServer>>,
    ) -> ApiResult<RoleResponse> {
        let (role, account) = parse_role(&role, &address)?;
        Ok(Json(state.role_membership(role, account).await?))
    }

    /// Grants a role to an account
    ///
    /// # Endpoint
    /// PUT /roles/:role/:address
    async fn grant_role_handler(
        Path((role, address)): Path<(String, String)>,
        State(state): State<Arc<ApiServer>>,
    ) -> ApiResult<RoleResponse> {
        let submitter = state.submitter()?;
        let (role, account) = parse_role(&role, &address)?;
        submitter.dids.grant_role(role, account).await?;
        Ok(Json(state.role_membership(role, account).await?))
    }

    /// Revokes a role from an account
    ///
    /// # Endpoint
    /// DELETE /roles/:role/:address
    async fn revoke_role_handler(
        Path((role, address)): Path<(String, String)>,
        State(state): State<Arc<ApiServer>>,
    ) -> ApiResult<RoleResponse> {
        let submitter = state.submitter()?;
        let (role, account) = parse_role(&role, &address)?;
        submitter.dids.revoke_role(role, account).await?;
        Ok(Json(state.role_membership(role, account).await?))
    }

    async fn role_membership(&self, role: H256, account: Address) -> Result<RoleResponse, RegistryError> {
        let member = self.views.dids().has_role(role, account).await?;
        Ok(RoleResponse { role, account, member })
    }

    /// Pauses the DID registry
    ///
    /// # Endpoint
    /// POST /admin/pause
    async fn pause_handler(State(state): State<Arc<ApiServer>>) -> ApiResult<PauseResponse> {
        let submitter = state.submitter()?;
        submitter.dids.pause().await?;
        Ok(Json(PauseResponse {
            paused: submitter.dids.paused().await?,
        }))
    }

    /// # Endpoint
    /// POST /admin/unpause
    async fn unpause_handler(State(state): State<Arc<ApiServer>>) -> ApiResult<PauseResponse> {
        let submitter = state.submitter()?;
        submitter.dids.unpause().await?;
        Ok(Json(PauseResponse {
            paused: submitter.dids.paused().await?,
        }))
    }

    // =====================
    // Document Handlers
    // =====================

    /// Returns views of several documents
    ///
    /// # Endpoint
    /// GET /documents?ids=0x..,0x..
    ///
    /// Documents that cannot be loaded are left out of the response.
    async fn document_views_handler(
        Query(query): Query<DocumentsQuery>,
        State(state): State<Arc<ApiServer>>,
    ) -> ApiResult<Vec<DocumentView>> {
        let ids = query
            .ids
            .split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(parse_bytes32)
            .collect::<Result<Vec<H256>, _>>()?;
        Ok(Json(state.views.document_views(&ids).await))
    }

    /// # Endpoint
    /// GET /documents/:document_id
    ///
    /// # Responses
    /// - 200 OK: Document view
    /// - 404 Not Found: Unknown document
    async fn document_view_handler(
        Path(document_id): Path<String>,
        State(state): State<Arc<ApiServer>>,
    ) -> ApiResult<DocumentView> {
        let document_id = parse_bytes32(&document_id)?;
        Ok(Json(state.views.document_view(document_id).await?))
    }

    /// Returns the signed/pending split of a document's required signers
    ///
    /// # Endpoint
    /// GET /documents/:document_id/signatures
    async fn reconciliation_handler(
        Path(document_id): Path<String>,
        State(state): State<Arc<ApiServer>>,
    ) -> ApiResult<Reconciliation> {
        let document_id = parse_bytes32(&document_id)?;
        Ok(Json(reconcile_document(state.views.documents(), document_id).await?))
    }

    /// Registers a document owned by the session account
    ///
    /// # Endpoint
    /// POST /documents
    ///
    /// # Responses
    /// - 201 Created: View of the new document
    /// - 400 Bad Request: Unknown type or malformed hashes
    async fn register_document_handler(
        State(state): State<Arc<ApiServer>>,
        Json(payload): Json<RegisterDocumentRequest>,
    ) -> Result<(StatusCode, Json<DocumentView>), ApiError> {
        let submitter = state.submitter()?;
        let document_type = DocumentType::from_name(&payload.document_type).ok_or_else(|| {
            RegistryError::InvalidInput(format!("unknown document type `{}`", payload.document_type))
        })?;
        let required_signers = payload
            .required_signers
            .iter()
            .map(|signer| parse_bytes32(signer))
            .collect::<Result<Vec<H256>, _>>()?;

        let document_id = submitter
            .documents
            .register_document(NewDocument {
                content_hash: parse_bytes32(&payload.content_hash)?,
                document_type,
                expires_at: payload.expires_at,
                metadata: payload.metadata,
                required_signers,
            })
            .await?;
        let view = state.views.document_view(document_id).await?;
        Ok((StatusCode::CREATED, Json(view)))
    }

    /// Signs a document as the session account's DID
    ///
    /// # Endpoint
    /// POST /documents/:document_id/signatures
    ///
    /// # Responses
    /// - 200 OK: Updated reconciliation
    async fn sign_document_handler(
        Path(document_id): Path<String>,
        State(state): State<Arc<ApiServer>>,
        Json(payload): Json<SignDocumentRequest>,
    ) -> ApiResult<Reconciliation> {
        let submitter = state.submitter()?;
        let document_id = parse_bytes32(&document_id)?;
        let signature_type = SignatureType::from_name(&payload.signature_type).ok_or_else(|| {
            RegistryError::InvalidInput(format!("unknown signature type `{}`", payload.signature_type))
        })?;

        submitter
            .documents
            .sign_document(document_id, signature_type, payload.metadata)
            .await?;
        Ok(Json(reconcile_document(state.views.documents(), document_id).await?))
    }

    /// Local reconciliation together with the contract's completeness flag
    ///
    /// # Endpoint
    /// GET /documents/:document_id/completion
    async fn completion_handler(
        Path(document_id): Path<String>,
        State(state): State<Arc<ApiServer>>,
    ) -> ApiResult<CompletionResponse> {
        let document_id = parse_bytes32(&document_id)?;
        let source = state.views.documents();
        let (reconciliation, contract_complete) = tokio::try_join!(
            reconcile_document(source, document_id),
            source.has_all_required_signatures(document_id),
        )?;
        if reconciliation.complete != contract_complete {
            warn!(
                "document {:#x}: local reconciliation says complete={}, contract says {}",
                document_id, reconciliation.complete, contract_complete
            );
        }
        Ok(Json(CompletionResponse {
            reconciliation,
            contract_complete,
        }))
    }

    /// Replaces document metadata; the contract bumps the version
    ///
    /// # Endpoint
    /// PUT /documents/:document_id/metadata
    async fn update_metadata_handler(
        Path(document_id): Path<String>,
        State(state): State<Arc<ApiServer>>,
        Json(payload): Json<UpdateMetadataRequest>,
    ) -> ApiResult<DocumentView> {
        let submitter = state.submitter()?;
        let document_id = parse_bytes32(&document_id)?;
        submitter.documents.update_metadata(document_id, payload.metadata).await?;
        Ok(Json(state.views.document_view(document_id).await?))
    }

    /// # Endpoint
    /// DELETE /documents/:document_id
    async fn revoke_document_handler(
        Path(document_id): Path<String>,
        State(state): State<Arc<ApiServer>>,
    ) -> ApiResult<DocumentView> {
        let submitter = state.submitter()?;
        let document_id = parse_bytes32(&document_id)?;
        submitter.documents.revoke_document(document_id).await?;
        Ok(Json(state.views.document_view(document_id).await?))
    }
}

fn parse_role(role: &str, address: &str) -> Result<(H256, Address), RegistryError> {
    let tag = role_from_name(role).ok_or_else(|| RegistryError::InvalidInput(format!("unknown role `{}`", role)))?;
    Ok((tag, parse_address(address)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::verification_aggregator::VerificationAggregator;
    use crate::testing::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::Value;
    use tower::ServiceExt;

    fn app() -> Router {
        let did_id = did(0x21);
        let dids = FakeDidRegistry::with_records(did_id, vec![active(1, 3, u64::MAX)]);

        let mut documents = FakeDocumentRegistry::default();
        documents.insert(document(H256::repeat_byte(0x31)), vec![], vec![]);

        let views = RegistryViews::new(
            Arc::new(dids),
            Arc::new(documents),
            VerificationAggregator::default(),
            None,
        );
        ApiServer::new(views, None).router()
    }

    async fn call(method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let body = match body {
            Some(value) => Body::from(value.to_string()),
            None => Body::empty(),
        };
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(body)
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    fn hex32(byte: u8) -> String {
        format!("{:#x}", H256::repeat_byte(byte))
    }

    #[tokio::test]
    async fn test_health_reports_read_only_mode() {
        let (status, body) = call("GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["can_submit"], false);
    }

    #[tokio::test]
    async fn test_did_view_and_summary() {
        let (status, body) = call("GET", &format!("/dids/{}", hex32(0x21)), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["summary"]["level"], 3);
        assert_eq!(body["summary"]["status"], "Active");

        let (status, body) = call("GET", &format!("/dids/{}/verification", hex32(0x21)), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["tier"], "premium");
    }

    #[tokio::test]
    async fn test_did_directory() {
        let (status, body) = call("GET", "/dids", None).await;
        assert_eq!(status, StatusCode::OK);
        let rows = body.as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["id"], hex32(0x21));
        assert_eq!(rows[0]["verified"], true);
        assert_eq!(rows[0]["active"], true);
        assert_eq!(rows[0]["summary"]["level"], 3);
    }

    #[tokio::test]
    async fn test_error_status_mapping() {
        let (status, body) = call("GET", "/dids/not-a-did", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("not-a-did"));

        let (status, _) = call("GET", &format!("/dids/{}", hex32(0x99)), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = call("GET", &format!("/dids/{}/verification", hex32(0x99)), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = call("GET", &format!("/documents/{}", hex32(0x99)), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_owner_lookup() {
        let owner = format!("{:#x}", Address::repeat_byte(0xee));
        let (status, body) = call("GET", &format!("/owners/{}/did", owner), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["did"], hex32(0x21));

        let stranger = format!("{:#x}", Address::repeat_byte(0x01));
        let (status, _) = call("GET", &format!("/owners/{}/did", stranger), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_batch_documents_skip_missing() {
        let uri = format!("/documents?ids={},{}", hex32(0x31), hex32(0x99));
        let (status, body) = call("GET", &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["document_type_name"], "CONTRACT");

        let (status, body) = call("GET", &format!("/documents/{}/signatures", hex32(0x31)), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["complete"], true);
    }

    #[tokio::test]
    async fn test_contract_side_checks() {
        let (status, body) = call("GET", &format!("/dids/{}/verified", hex32(0x21)), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["verified"], true);

        let (status, body) = call("GET", &format!("/documents/{}/completion", hex32(0x31)), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["complete"], true);
        assert_eq!(body["contract_complete"], true);
    }

    #[tokio::test]
    async fn test_role_membership() {
        let member = format!("{:#x}", verifier(1));
        let (status, body) = call("GET", &format!("/roles/verifier/{}", member), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["member"], true);

        let (status, body) = call("GET", &format!("/roles/admin/{}", member), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["member"], false);

        let (status, _) = call("GET", &format!("/roles/owner/{}", member), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_submissions_need_a_session() {
        let (status, _) = call("POST", "/dids", Some(json!({ "identifiers": ["alice"] }))).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

        let uri = format!("/documents/{}/signatures", hex32(0x31));
        let (status, body) = call("POST", &uri, Some(json!({ "signature_type": "APPROVE" }))).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"], "no signing session configured");

        let (status, _) = call("DELETE", &format!("/dids/{}/verifications", hex32(0x21)), None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

        let (status, _) = call("POST", "/admin/pause", None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

        let uri = format!("/roles/verifier/{:#x}", verifier(2));
        let (status, _) = call("PUT", &uri, None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }
}
