//! # REST API
//!
//! Builds the axum router that exposes per-session chains over HTTP.
//!
//! ## Endpoints
//!
//! | Method | Path             | Description                              |
//! |--------|------------------|------------------------------------------|
//! | GET    | `/health`        | Liveness check                           |
//! | POST   | `/reset`         | Replace the chain with a fresh genesis   |
//! | GET    | `/chain`         | Current chain                            |
//! | POST   | `/mine`          | Create and mine a block from `data`      |
//! | GET    | `/validate`      | Run the validation scan                  |
//! | POST   | `/block/update`  | Edit a block's payload (tampering)       |
//! | POST   | `/block/remine`  | Re-mine one block and relink its child   |
//!
//! Every route except `/health` requires an `X-Session-ID` header. Any other
//! path is served from the static asset directory.

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequestParts, State},
    http::{header, request::Parts, HeaderName, HeaderValue, Method},
    routing::{get, post},
    Json, Router,
};
use hashchain_chain::Blockchain;
use hashchain_core::Block;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::config::HttpOptions;
use crate::error::{ApiError, Envelope};
use crate::session::SessionStore;

/// Header carrying the opaque session key.
pub const SESSION_HEADER: HeaderName = HeaderName::from_static("x-session-id");

// ---------------------------------------------------------------------------
// Application State
// ---------------------------------------------------------------------------

/// Shared application state available to all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionStore>,
}

impl AppState {
    pub fn new(sessions: Arc<SessionStore>) -> Self {
        Self { sessions }
    }

    /// Run `op` against the session's chain on the blocking pool.
    ///
    /// Mining is CPU-bound, so chain access never happens on the executor.
    /// The session lock serializes concurrent requests for the same session.
    async fn with_chain<T, F>(&self, session: SessionId, op: F) -> Result<T, ApiError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Blockchain) -> Result<T, ApiError> + Send + 'static,
    {
        let sessions = Arc::clone(&self.sessions);
        tokio::task::spawn_blocking(move || {
            let chain = sessions.chain(&session.0);
            let mut chain = chain.lock();
            op(&mut chain)
        })
        .await?
    }
}

// ---------------------------------------------------------------------------
// Extractors
// ---------------------------------------------------------------------------

/// Session key taken from the `X-Session-ID` header.
#[derive(Debug, Clone)]
pub struct SessionId(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for SessionId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(&SESSION_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(|value| SessionId(value.to_string()))
            .ok_or(ApiError::MissingSession)
    }
}

/// Turn an optional JSON body into a value; malformed bodies count as empty.
fn body_value(body: Result<Json<Value>, JsonRejection>) -> Value {
    match body {
        Ok(Json(value)) => value,
        Err(rejection) => {
            tracing::debug!(%rejection, "unreadable request body");
            Value::Null
        }
    }
}

fn string_field<'a>(body: &'a Value, name: &str) -> Option<&'a str> {
    body.get(name)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
}

fn index_field(body: &Value) -> Option<i64> {
    body.get("index").and_then(Value::as_i64)
}

/// Resolve a caller-supplied index against the chain, rejecting negatives.
fn resolve_index(chain: &Blockchain, index: i64) -> Result<usize, ApiError> {
    usize::try_from(index).map_err(|_| ApiError::InvalidIndex {
        index,
        len: chain.len(),
    })
}

// ---------------------------------------------------------------------------
// Router Construction
// ---------------------------------------------------------------------------

/// Builds the full axum [`Router`] with API routes, static assets, CORS and tracing.
pub fn create_router(state: AppState, options: &HttpOptions) -> Router {
    let allow_origin = if options.allowed_origins.is_empty() {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::list(
            options
                .allowed_origins
                .iter()
                .filter_map(|origin| HeaderValue::from_str(origin).ok()),
        )
    };

    let cors = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            SESSION_HEADER,
            header::CONTENT_TYPE,
            header::ORIGIN,
            header::ACCEPT,
        ])
        .expose_headers([SESSION_HEADER]);

    Router::new()
        .route("/health", get(health_handler))
        .route("/reset", post(reset_handler))
        .route("/chain", get(chain_handler))
        .route("/mine", post(mine_handler))
        .route("/validate", get(validate_handler))
        .route("/block/update", post(update_handler))
        .route("/block/remine", post(remine_handler))
        .fallback_service(ServeDir::new(&options.static_dir))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Response Types
// ---------------------------------------------------------------------------

type ApiResult<T> = Result<Json<Envelope<T>>, ApiError>;

/// Response payload for `GET /health`.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub sessions: usize,
}

/// Response payload for `GET /validate`.
#[derive(Debug, Serialize)]
pub struct ValidateResponse {
    #[serde(rename = "isValid")]
    pub is_valid: bool,
    /// First failure found by the scan.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fault: Option<String>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// `GET /health`
async fn health_handler(State(state): State<AppState>) -> Json<Envelope<HealthResponse>> {
    Json(Envelope::ok(HealthResponse {
        status: "ok",
        sessions: state.sessions.len(),
    }))
}

/// `POST /reset`
async fn reset_handler(
    State(state): State<AppState>,
    session: SessionId,
) -> ApiResult<Vec<Block>> {
    let sessions = Arc::clone(&state.sessions);
    let blocks = tokio::task::spawn_blocking(move || {
        let chain = sessions.reset(&session.0);
        let blocks = chain.lock().blocks().to_vec();
        tracing::info!(session = %session.0, "chain reset");
        blocks
    })
    .await?;

    Ok(Json(Envelope::ok(blocks)))
}

/// `GET /chain`
async fn chain_handler(
    State(state): State<AppState>,
    session: SessionId,
) -> ApiResult<Vec<Block>> {
    let blocks = state
        .with_chain(session, |chain| Ok(chain.blocks().to_vec()))
        .await?;
    Ok(Json(Envelope::ok(blocks)))
}

/// `POST /mine` with `{ "data": string }`
async fn mine_handler(
    State(state): State<AppState>,
    session: SessionId,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Vec<Block>> {
    let body = body_value(body);
    let data = string_field(&body, "data")
        .ok_or(ApiError::InvalidBlockData)?
        .to_string();

    let blocks = state
        .with_chain(session, move |chain| {
            let block = chain.create_block(data);
            chain.add_block(block);
            tracing::info!(
                index = chain.latest_block().index(),
                digest = %chain.latest_block().digest().short(),
                "block added"
            );
            Ok(chain.blocks().to_vec())
        })
        .await?;
    Ok(Json(Envelope::ok(blocks)))
}

/// `GET /validate`
async fn validate_handler(
    State(state): State<AppState>,
    session: SessionId,
) -> ApiResult<ValidateResponse> {
    let fault = state
        .with_chain(session, |chain| Ok(chain.verify().err()))
        .await?;

    Ok(Json(Envelope::ok(ValidateResponse {
        is_valid: fault.is_none(),
        fault: fault.map(|f| f.to_string()),
    })))
}

/// `POST /block/update` with `{ "index": integer, "data": string }`
async fn update_handler(
    State(state): State<AppState>,
    session: SessionId,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Vec<Block>> {
    let body = body_value(body);
    let (index, data) = match (index_field(&body), string_field(&body, "data")) {
        (Some(index), Some(data)) => (index, data.to_string()),
        _ => return Err(ApiError::InvalidUpdate),
    };

    let blocks = state
        .with_chain(session, move |chain| {
            let index = resolve_index(chain, index)?;
            chain.edit_block(index, data)?;
            Ok(chain.blocks().to_vec())
        })
        .await?;
    Ok(Json(Envelope::ok(blocks)))
}

/// `POST /block/remine` with `{ "index": integer }`
async fn remine_handler(
    State(state): State<AppState>,
    session: SessionId,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Vec<Block>> {
    let body = body_value(body);
    let index = index_field(&body).ok_or(ApiError::MissingIndex)?;

    let blocks = state
        .with_chain(session, move |chain| {
            let index = resolve_index(chain, index)?;
            chain.remine_block(index)?;
            Ok(chain.blocks().to_vec())
        })
        .await?;
    Ok(Json(Envelope::ok(blocks)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionStore;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use hashchain_chain::ChainConfig;
    use http_body_util::BodyExt;
    use std::path::PathBuf;
    use tower::ServiceExt;

    fn test_router() -> (Router, Arc<SessionStore>) {
        let sessions = Arc::new(SessionStore::new(ChainConfig { difficulty: 1 }));
        let options = HttpOptions {
            allowed_origins: Vec::new(),
            static_dir: PathBuf::from("does-not-exist"),
        };
        let router = create_router(AppState::new(Arc::clone(&sessions)), &options);
        (router, sessions)
    }

    async fn send(router: &Router, req: Request<Body>) -> (StatusCode, Value) {
        let resp = router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    async fn get(router: &Router, path: &str, session: Option<&str>) -> (StatusCode, Value) {
        let mut req = Request::builder().uri(path);
        if let Some(session) = session {
            req = req.header("X-Session-ID", session);
        }
        send(router, req.body(Body::empty()).unwrap()).await
    }

    async fn post_json(
        router: &Router,
        path: &str,
        session: Option<&str>,
        body: Value,
    ) -> (StatusCode, Value) {
        let mut req = Request::builder()
            .method("POST")
            .uri(path)
            .header("content-type", "application/json");
        if let Some(session) = session {
            req = req.header("X-Session-ID", session);
        }
        let req = req
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap();
        send(router, req).await
    }

    async fn mine(router: &Router, session: &str, data: &str) -> Value {
        let (status, json) =
            post_json(router, "/mine", Some(session), serde_json::json!({ "data": data })).await;
        assert_eq!(status, StatusCode::OK);
        json
    }

    fn assert_rejected(status: StatusCode, json: &Value, message: &str) {
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], message);
        assert!(json["timestamp"].is_string());
    }

    #[tokio::test]
    async fn health_does_not_need_session() {
        let (router, _) = test_router();
        let (status, json) = get(&router, "/health", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["status"], "ok");
        assert_eq!(json["data"]["sessions"], 0);
    }

    #[tokio::test]
    async fn missing_session_header_is_rejected() {
        let (router, sessions) = test_router();

        let (status, json) = get(&router, "/chain", None).await;
        assert_rejected(status, &json, "X-Session-ID header is required");

        let (status, json) = post_json(&router, "/mine", None, serde_json::json!({})).await;
        assert_rejected(status, &json, "X-Session-ID header is required");

        assert!(sessions.is_empty());
    }

    #[tokio::test]
    async fn new_session_gets_genesis_chain() {
        let (router, sessions) = test_router();
        let (status, json) = get(&router, "/chain", Some("s1")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["success"], true);
        let blocks = json["data"].as_array().unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0]["data"], "Genesis Block");
        assert_eq!(blocks[0]["previousHash"], "0");
        assert_eq!(blocks[0]["isCorrupted"], false);
        assert_eq!(sessions.len(), 1);
    }

    #[tokio::test]
    async fn mine_appends_block() {
        let (router, _) = test_router();
        let json = mine(&router, "s1", "Test Block").await;

        let blocks = json["data"].as_array().unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[1]["data"], "Test Block");
        assert_eq!(blocks[1]["index"], 1);
        assert_eq!(blocks[1]["previousHash"], blocks[0]["hash"]);
        assert!(blocks[1]["hash"].as_str().unwrap().starts_with('0'));
    }

    #[tokio::test]
    async fn mine_rejects_bad_data() {
        let (router, _) = test_router();
        let bodies = [
            serde_json::json!({}),
            serde_json::json!({ "data": { "invalid": "object" } }),
            serde_json::json!({ "data": null }),
            serde_json::json!({ "data": "" }),
            serde_json::json!({ "data": 42 }),
        ];

        for body in bodies {
            let (status, json) = post_json(&router, "/mine", Some("s1"), body).await;
            assert_rejected(status, &json, "Block data must be a string");
        }
    }

    #[tokio::test]
    async fn malformed_json_is_a_shape_error() {
        let (router, _) = test_router();
        let req = Request::builder()
            .method("POST")
            .uri("/mine")
            .header("content-type", "application/json")
            .header("X-Session-ID", "s1")
            .body(Body::from("{not json"))
            .unwrap();

        let (status, json) = send(&router, req).await;
        assert_rejected(status, &json, "Block data must be a string");
    }

    #[tokio::test]
    async fn sessions_are_isolated() {
        let (router, _) = test_router();
        mine(&router, "alice", "only alice").await;

        let (_, json) = get(&router, "/chain", Some("bob")).await;
        assert_eq!(json["data"].as_array().unwrap().len(), 1);

        let (_, json) = get(&router, "/chain", Some("alice")).await;
        assert_eq!(json["data"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn reset_returns_genesis_only() {
        let (router, _) = test_router();
        mine(&router, "s1", "one").await;
        mine(&router, "s1", "two").await;

        let (status, json) = post_json(&router, "/reset", Some("s1"), Value::Null).await;

        assert_eq!(status, StatusCode::OK);
        let blocks = json["data"].as_array().unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0]["data"], "Genesis Block");
    }

    #[tokio::test]
    async fn tamper_and_repair_flow() {
        let (router, _) = test_router();
        mine(&router, "s1", "Block 1").await;
        mine(&router, "s1", "Block 2").await;

        let (_, json) = get(&router, "/validate", Some("s1")).await;
        assert_eq!(json["data"]["isValid"], true);
        assert!(json["data"].get("fault").is_none());

        let (status, json) = post_json(
            &router,
            "/block/update",
            Some("s1"),
            serde_json::json!({ "index": 1, "data": "X" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let blocks = json["data"].as_array().unwrap();
        assert_eq!(blocks[1]["data"], "X");
        assert_eq!(blocks[1]["isCorrupted"], true);
        assert_eq!(blocks[2]["isCorrupted"], true);

        let (_, json) = get(&router, "/validate", Some("s1")).await;
        assert_eq!(json["data"]["isValid"], false);
        assert_eq!(json["data"]["fault"], "block 1 is marked corrupted");

        let (status, json) = post_json(
            &router,
            "/block/remine",
            Some("s1"),
            serde_json::json!({ "index": 1 }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let blocks = json["data"].as_array().unwrap();
        assert_eq!(blocks[1]["isCorrupted"], false);
        assert_eq!(blocks[2]["previousHash"], blocks[1]["hash"]);
        assert_eq!(blocks[2]["isCorrupted"], true);

        let (_, json) = get(&router, "/validate", Some("s1")).await;
        assert_eq!(json["data"]["isValid"], false);
    }

    #[tokio::test]
    async fn update_rejects_bad_shape() {
        let (router, _) = test_router();
        let bodies = [
            serde_json::json!({}),
            serde_json::json!({ "index": "invalid" }),
            serde_json::json!({ "index": 1, "data": null }),
            serde_json::json!({ "index": 1.5, "data": "x" }),
            serde_json::json!({ "index": 0, "data": 7 }),
        ];

        for body in bodies {
            let (status, json) = post_json(&router, "/block/update", Some("s1"), body).await;
            assert_rejected(status, &json, "Block index and data are required");
        }
    }

    #[tokio::test]
    async fn out_of_range_index_is_rejected() {
        let (router, _) = test_router();

        let (status, json) = post_json(
            &router,
            "/block/update",
            Some("s1"),
            serde_json::json!({ "index": 999, "data": "Invalid" }),
        )
        .await;
        assert_rejected(status, &json, "invalid block index 999 (chain length 1)");

        let (status, json) = post_json(
            &router,
            "/block/remine",
            Some("s1"),
            serde_json::json!({ "index": 1 }),
        )
        .await;
        assert_rejected(status, &json, "invalid block index 1 (chain length 1)");

        let (status, json) = post_json(
            &router,
            "/block/remine",
            Some("s1"),
            serde_json::json!({ "index": -1 }),
        )
        .await;
        assert_rejected(status, &json, "invalid block index -1 (chain length 1)");

        let (status, json) = post_json(
            &router,
            "/block/update",
            Some("s1"),
            serde_json::json!({ "index": -1, "data": "Invalid" }),
        )
        .await;
        assert_rejected(status, &json, "invalid block index -1 (chain length 1)");

        let (_, json) = get(&router, "/validate", Some("s1")).await;
        assert_eq!(json["data"]["isValid"], true);
    }

    #[tokio::test]
    async fn remine_requires_integer_index() {
        let (router, _) = test_router();
        for body in [serde_json::json!({}), serde_json::json!({ "index": "invalid" })] {
            let (status, json) = post_json(&router, "/block/remine", Some("s1"), body).await;
            assert_rejected(status, &json, "Block index is required");
        }
    }

    #[tokio::test]
    async fn cors_exposes_session_header() {
        let (router, _) = test_router();
        let req = Request::builder()
            .uri("/health")
            .header("origin", "http://example.test")
            .body(Body::empty())
            .unwrap();
        let resp = router.clone().oneshot(req).await.unwrap();

        let exposed = resp
            .headers()
            .get("access-control-expose-headers")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();
        assert!(exposed.contains("x-session-id"));
        assert_eq!(resp.headers()["access-control-allow-origin"], "*");
    }

    #[tokio::test]
    async fn unknown_path_falls_through_to_static_assets() {
        let (router, _) = test_router();
        let req = Request::builder()
            .uri("/missing.html")
            .body(Body::empty())
            .unwrap();
        let resp = router.clone().oneshot(req).await.unwrap();

        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
