//! HTTP server setup and the relay handler.
//!
//! # Responsibilities
//! - Create Axum Router with the fixed site endpoints and the relay fallback
//! - Wire up middleware (request ID, tracing, CORS)
//! - Run the per-request relay state machine
//! - Apply reloaded configuration atomically
//! - Stop on the shutdown broadcast

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use arc_swap::ArcSwap;
use axum::{
    body::{to_bytes, Body},
    extract::State,
    http::{header, HeaderValue, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::Instrument;

use crate::cache::{extension_of, CachePolicy, ResponseCache};
use crate::config::GatewayConfig;
use crate::error::RelayError;
use crate::http::request::{request_id, MakeRequestUuidV4};
use crate::http::response::{body_response, CacheHeaders};
use crate::http::upstream::{forward_headers, forwards_body, UpstreamClient, UpstreamRequest};
use crate::observability::{metrics, LogBuffer};
use crate::routing::{is_raw_request, parse_query, RouteError, Router as RuleTable};
use crate::site::{self, handlers as site_handlers, SiteAssets};
use crate::units::{format_size, UnitError};

/// Errors raised while assembling the server from configuration.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Route(#[from] RouteError),

    #[error(transparent)]
    Unit(#[from] UnitError),

    #[error("failed to build upstream client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Everything derived from one configuration, swapped as a unit on reload.
#[derive(Debug)]
pub struct GatewaySnapshot {
    pub config: GatewayConfig,
    pub rules: RuleTable,
    pub policy: CachePolicy,
    pub cache_headers: CacheHeaders,
    pub max_body_size: usize,
}

impl GatewaySnapshot {
    /// Compile rules and parse unit strings. Expects a validated config.
    pub fn build(config: GatewayConfig) -> Result<Self, ServerError> {
        let rules = RuleTable::from_config(&config.proxies)?;
        let policy = CachePolicy::from_config(&config.cache)?;
        let cache_headers = CacheHeaders::new(config.cache.max_time.secs()?);
        let max_body_size =
            usize::try_from(config.listener.max_body_size.bytes()?).unwrap_or(usize::MAX);

        Ok(Self {
            config,
            rules,
            policy,
            cache_headers,
            max_body_size,
        })
    }
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub snapshot: Arc<ArcSwap<GatewaySnapshot>>,
    pub cache: Arc<ResponseCache>,
    pub upstream: UpstreamClient,
    pub assets: Arc<SiteAssets>,
    pub logs: LogBuffer,
    pub started_at: Instant,
}

/// HTTP server for the relay gateway.
pub struct HttpServer {
    router: Router,
    state: AppState,
}

impl HttpServer {
    /// Create a server with a fresh cache and log buffer.
    pub fn new(config: GatewayConfig) -> Result<Self, ServerError> {
        let capacity = config.cache.capacity.bytes()?;
        let logs = LogBuffer::new(config.observability.log_buffer_lines);
        Self::with_parts(config, Arc::new(ResponseCache::new(capacity)), logs)
    }

    /// Create a server around an existing cache and log buffer.
    pub fn with_parts(
        config: GatewayConfig,
        cache: Arc<ResponseCache>,
        logs: LogBuffer,
    ) -> Result<Self, ServerError> {
        let assets = SiteAssets::load(Path::new(&config.site.public_dir));
        let status_path = config.site.status_path.clone();
        let snapshot = GatewaySnapshot::build(config)?;

        let state = AppState {
            snapshot: Arc::new(ArcSwap::from_pointee(snapshot)),
            cache,
            upstream: UpstreamClient::new()?,
            assets: Arc::new(assets),
            logs,
            started_at: Instant::now(),
        };

        let router = Self::build_router(&status_path, state.clone());
        Ok(Self { router, state })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(status_path: &str, state: AppState) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        Router::new()
            .route(site::HOME_PATH, any(site_handlers::get_home))
            .route(site::FAVICON_PATH, any(site_handlers::get_favicon))
            .route(site::LOGS_PATH, any(site_handlers::get_logs))
            .route(status_path, any(site_handlers::get_status))
            .fallback(relay_handler)
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV4))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(cors),
            )
    }

    /// Shared state, for inspection by callers and tests.
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Run the server, accepting connections on the given listener until
    /// `shutdown` fires. Configs received on `config_updates` replace the
    /// active snapshot and clear the cache.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<GatewayConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let state = self.state.clone();
        let reloader = tokio::spawn(async move {
            while let Some(config) = config_updates.recv().await {
                apply_config(&state, config);
            }
        });

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        reloader.abort();
        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Swap in a new configuration. Routes registered at startup (the status
/// path) and the cache capacity keep their startup values.
pub fn apply_config(state: &AppState, config: GatewayConfig) {
    let current = state.snapshot.load();
    if config.site.status_path != current.config.site.status_path {
        tracing::warn!("site.status_path changes take effect after restart");
    }
    if config.cache.capacity.bytes().ok() != Some(state.cache.capacity()) {
        tracing::warn!("cache.capacity changes take effect after restart");
    }

    match GatewaySnapshot::build(config) {
        Ok(next) => {
            let rules = next.rules.len();
            state.snapshot.store(Arc::new(next));
            state.cache.clear();
            tracing::info!(rules, "Configuration reloaded, cache cleared");
        }
        Err(e) => {
            tracing::error!(error = %e, "Rejected reloaded configuration");
        }
    }
}

/// Fallback handler: relays every path not claimed by a site endpoint.
async fn relay_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let span = tracing::info_span!(
        "relay",
        request_id = %request_id(request.headers()),
        method = %method,
        path = %request.uri().path(),
    );

    async move {
        let snapshot = state.snapshot.load_full();
        let (response, outcome) = match relay(&state, &snapshot, request).await {
            Ok(relayed) => relayed,
            Err(e) => {
                let outcome = e.outcome();
                (e.into_response(), outcome)
            }
        };

        tracing::info!(status = %response.status(), outcome, "Request finished");
        metrics::record_request(method.as_str(), response.status().as_u16(), outcome, start);
        response
    }
    .instrument(span)
    .await
}

/// One pass through the relay state machine. Returns the response and
/// its metrics outcome label.
async fn relay(
    state: &AppState,
    snapshot: &GatewaySnapshot,
    request: Request<Body>,
) -> Result<(Response, &'static str), RelayError> {
    let (parts, body) = request.into_parts();
    let path = parts.uri.path();

    // 1. Match
    let route = snapshot
        .rules
        .match_path(path)
        .ok_or_else(|| RelayError::NoRouteMatch {
            path: path.to_string(),
        })?;

    // 2-3. Sanitize + resolve
    let target = route.target_url()?;
    tracing::debug!(prefix = route.rule.prefix(), target = %target, "Route matched");
    let query = parse_query(parts.uri.query());

    // 4. Raw mode
    if is_raw_request(&query) {
        let location = route.redirect_location(&query)?;
        let value = HeaderValue::from_str(&location)
            .map_err(|_| RelayError::InvalidLocation(location.clone()))?;
        tracing::info!(location = %location, "Redirecting");
        let response = (StatusCode::FOUND, [(header::LOCATION, value)]).into_response();
        return Ok((response, "redirect"));
    }

    // 5. Cache lookup
    let policy = &snapshot.policy;
    let cache_key = policy.cache_key(&parts.uri);
    if policy.enabled() {
        if let Some(hit) = state.cache.get(&cache_key) {
            metrics::record_cache_event("hit");
            tracing::info!(
                key = %cache_key,
                size = %format_size(hit.data.len() as u64),
                "Cache hit"
            );
            let response = body_response(&hit.content_type, hit.data, &snapshot.cache_headers);
            return Ok((response, "cache_hit"));
        }
        metrics::record_cache_event("miss");
    }

    // 6. Upstream fetch
    let url = route.upstream_url(&query)?;
    let body = if forwards_body(&parts.method) {
        let bytes = to_bytes(body, snapshot.max_body_size)
            .await
            .map_err(|e| RelayError::from_body_error(e, snapshot.max_body_size))?;
        Some(bytes)
    } else {
        None
    };
    let fetched = state
        .upstream
        .fetch(UpstreamRequest {
            method: parts.method.clone(),
            url: url.clone(),
            headers: forward_headers(&parts.headers),
            body,
        })
        .await?;

    // 8. Success: maybe store, then respond
    let size = fetched.body.len() as u64;
    if policy.enabled() && policy.is_cacheable(&extension_of(&url), size) {
        let stored = state.cache.set(
            &cache_key,
            fetched.body.clone(),
            &fetched.content_type,
            Some(policy.ttl()),
        );
        tracing::info!(key = %cache_key, size = %format_size(size), stored, "Cache store");
    }

    tracing::debug!(status = %fetched.status, size, "Relayed upstream response");
    let response = body_response(&fetched.content_type, fetched.body, &snapshot.cache_headers);
    Ok((response, "relayed"))
}
