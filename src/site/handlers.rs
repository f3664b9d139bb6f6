use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::config::GatewayConfig;
use crate::http::response::body_response;
use crate::http::server::AppState;

#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_secs: u64,
    pub established: Option<String>,
    pub cache_days: u64,
    pub site: SiteInfo,
    pub proxies: Vec<ProxyListing>,
}

#[derive(Debug, Serialize)]
pub struct SiteInfo {
    pub title: String,
    pub description: String,
    pub footer: String,
}

#[derive(Debug, Serialize)]
pub struct ProxyListing {
    pub prefix: String,
    pub target: String,
    pub description: String,
    pub redirect_template: String,
    pub examples: UsageExamples,
}

#[derive(Debug, Serialize)]
pub struct UsageExamples {
    pub proxy: String,
    pub redirect: String,
}

/// Assemble the status listing; hidden rules are left out.
pub fn build_status(
    config: &GatewayConfig,
    origin: &str,
    uptime_secs: u64,
    max_age: u64,
) -> StatusReport {
    StatusReport {
        status: "running",
        version: env!("CARGO_PKG_VERSION"),
        uptime_secs,
        established: config.site.establish_time.clone(),
        cache_days: max_age / 86400,
        site: SiteInfo {
            title: config.site.title.clone(),
            description: config.site.description.clone(),
            footer: config.site.footer.clone(),
        },
        proxies: config
            .proxies
            .iter()
            .filter(|p| p.visible)
            .map(|p| ProxyListing {
                prefix: p.prefix.clone(),
                target: p.target.clone(),
                description: p
                    .description
                    .clone()
                    .unwrap_or_else(|| "No description provided".to_string()),
                redirect_template: p
                    .raw_redirect
                    .clone()
                    .unwrap_or_else(|| "Uses default target URL".to_string()),
                examples: UsageExamples {
                    proxy: format!("{}{}", origin, p.prefix),
                    redirect: format!("{}{}?raw=true", origin, p.prefix),
                },
            })
            .collect(),
    }
}

pub async fn get_status(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let snapshot = state.snapshot.load();
    let host = headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("localhost");
    let report = build_status(
        &snapshot.config,
        &format!("http://{host}"),
        state.started_at.elapsed().as_secs(),
        snapshot.cache_headers.max_age(),
    );

    let mut response = Json(report).into_response();
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json; charset=utf-8"),
    );
    snapshot.cache_headers.apply(response.headers_mut());
    response
}

pub async fn get_home(State(state): State<AppState>) -> Response {
    match &state.assets.index {
        Some(index) => body_response(
            "text/html; charset=utf-8",
            index.clone(),
            &state.snapshot.load().cache_headers,
        ),
        None => (StatusCode::SERVICE_UNAVAILABLE, "Service Unavailable").into_response(),
    }
}

pub async fn get_favicon(State(state): State<AppState>) -> Response {
    match &state.assets.favicon {
        Some(icon) => body_response("image/x-icon", icon.clone(), &state.snapshot.load().cache_headers),
        None => (StatusCode::NOT_FOUND, "Not Found").into_response(),
    }
}

pub async fn get_logs(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        state.logs.render(),
    )
}
