//! Axum routes for the tag API.

use axum::error_handling::HandleErrorLayer;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::{header, HeaderValue, Method};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{BoxError, Router};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower::timeout::error::Elapsed;
use tower::timeout::TimeoutLayer;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use crate::config::TagScoutConfig;
use crate::credentials::CredentialStore;
use crate::errors::TagScoutResult;
use crate::node::Node;
use crate::search::{search_with, CancelSignal, SearchOptions};
use crate::server::error::ApiError;

/// Shared application state
pub struct AppState {
    pub tree: Node,
    pub credentials: CredentialStore,
    pub options: SearchOptions,
    /// Fired on server shutdown; in-flight searches stop dispatching
    pub shutdown: CancelSignal,
}

impl AppState {
    pub fn new(tree: Node, credentials: CredentialStore, options: SearchOptions) -> Self {
        Self {
            tree,
            credentials,
            options,
            shutdown: CancelSignal::new(),
        }
    }
}

// ─── Route builder ───────────────────────────────────────────────

pub fn build_router(state: Arc<AppState>, request_timeout: Duration) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(HeaderValue::from_static("http://localhost"))
        .allow_methods([Method::GET])
        .allow_headers([header::ORIGIN, header::ACCEPT, header::CONTENT_TYPE]);

    Router::new()
        .route(
            "/taggedContent",
            get(tagged_content).fallback(method_not_allowed),
        )
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_timeout_error))
                .layer(TimeoutLayer::new(request_timeout)),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ─── Handlers ────────────────────────────────────────────────────

/// Query parameters of `taggedContent`
#[derive(Debug, Default, PartialEq, Eq)]
struct TagQuery {
    token: String,
    tag: String,
}

impl TagQuery {
    /// Picks `token` and `tag` out of decoded pairs; the first value of a
    /// repeated key wins
    fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut token = None;
        let mut tag = None;
        for (key, value) in pairs {
            match key.as_str() {
                "token" if token.is_none() => token = Some(value),
                "tag" if tag.is_none() => tag = Some(value),
                _ => {}
            }
        }
        Self {
            token: token.unwrap_or_default(),
            tag: tag.unwrap_or_default(),
        }
    }
}

async fn tagged_content(
    State(state): State<Arc<AppState>>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<Response, ApiError> {
    // An unreadable query string carries no token, so it fails authentication.
    let query = match query {
        Ok(Query(pairs)) => TagQuery::from_pairs(pairs),
        Err(rejection) => {
            debug!("Unreadable query string: {}", rejection);
            TagQuery::default()
        }
    };

    if !state.credentials.is_authenticated(&query.token) {
        return Err(ApiError::Unauthorized);
    }
    if query.tag.is_empty() {
        return Err(ApiError::MissingTag);
    }

    debug!("Looking up tag '{}'", query.tag);
    let tag = query.tag;
    let search_state = Arc::clone(&state);
    let target = tag.clone();

    // The search blocks on its own worker pool, so keep it off the async runtime.
    let encoded = tokio::task::spawn_blocking(move || {
        let outcome = search_with(
            &search_state.options,
            &search_state.shutdown,
            Some(&search_state.tree),
            &target,
        );
        outcome.map(serde_json::to_vec).into_option().transpose()
    })
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))??;

    match encoded {
        Some(body) => Ok(([(header::CONTENT_TYPE, "application/json")], body).into_response()),
        None => Err(ApiError::TagNotFound(tag)),
    }
}

async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

async fn handle_timeout_error(err: BoxError) -> ApiError {
    if err.is::<Elapsed>() {
        ApiError::Timeout
    } else {
        ApiError::Internal(err.to_string())
    }
}

// ─── Server startup ──────────────────────────────────────────────

/// Start the tag server and run it until Ctrl+C
pub async fn serve(config: &TagScoutConfig, tree: Node) -> TagScoutResult<()> {
    let addr = config.socket_addr()?;
    let listener = TcpListener::bind(addr).await?;
    info!("Tag server listening on http://{}", listener.local_addr()?);

    let credentials = config.credential_store();
    if credentials.is_empty() {
        warn!("No API tokens configured, every request will be rejected");
    }
    let state = Arc::new(AppState::new(tree, credentials, config.search_options()));
    serve_with_shutdown(listener, state, config.request_timeout(), ctrl_c()).await
}

/// Run the tag server on `listener` until `signal` completes
///
/// Completion of `signal` also fires the state's shutdown signal, so
/// searches still running stop dispatching work.
pub async fn serve_with_shutdown<F>(
    listener: TcpListener,
    state: Arc<AppState>,
    request_timeout: Duration,
    signal: F,
) -> TagScoutResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let shutdown = state.shutdown.clone();
    let router = build_router(state, request_timeout);

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            signal.await;
            info!("Shutting down server...");
            shutdown.cancel();
        })
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to install Ctrl+C handler: {}", e);
        std::future::pending::<()>().await;
    }
}
