//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router: status endpoint plus catch-all proxy handler
//! - Build the shared upstream client, resolver, mapper and forwarder
//! - Wire up middleware (request ID, tracing, timeout)
//! - Serve until the shutdown signal fires

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{header::InvalidHeaderValue, HeaderValue, Request},
    response::{IntoResponse, Response},
    routing::{any, get},
    Router,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use url::Url;

use crate::config::ProxyConfig;
use crate::http::forward::Forwarder;
use crate::http::request::{request_id, MakeRequestUuidV4};
use crate::http::response::ProxyError;
use crate::http::status::{self, status_handler, ProxyStats};
use crate::observability::metrics;
use crate::resolver::{KrakenUserLookup, UserIdResolver};
use crate::routing::{PathMapper, RouteTable};

/// Path of the status endpoint. Never proxied.
pub const STATUS_PATH: &str = "/apiproxy/status";

/// Errors building the server from configuration.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to build upstream client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("invalid upstream URL: {0}")]
    UpstreamUrl(#[from] url::ParseError),

    #[error("invalid upstream Accept header: {0}")]
    Accept(#[from] InvalidHeaderValue),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub mapper: PathMapper,
    pub resolver: UserIdResolver,
    pub forwarder: Forwarder,
    pub stats: Arc<ProxyStats>,
    pub hostname: Arc<str>,
}

/// HTTP server for the API proxy.
pub struct HttpServer {
    router: Router,
    state: AppState,
}

impl HttpServer {
    /// Create a new HTTP server from the configuration and a loaded route table.
    pub fn new(config: &ProxyConfig, routes: RouteTable) -> Result<Self, ServerError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.upstream.connect_timeout_secs))
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        let lookup = KrakenUserLookup::new(client.clone(), &config.upstream)?;
        tracing::debug!(endpoint = %lookup.endpoint(), "User lookup endpoint");

        let resolver = UserIdResolver::new(Arc::new(lookup), &config.cache);
        let mapper = PathMapper::new(Arc::new(routes), resolver.clone());
        let forwarder = Forwarder::new(
            client,
            Url::parse(&config.upstream.base_url)?,
            HeaderValue::from_str(&config.upstream.accept)?,
            config.limits.max_body_bytes,
        );

        let state = AppState {
            mapper,
            resolver,
            forwarder,
            stats: Arc::new(ProxyStats::new()),
            hostname: status::hostname().into(),
        };

        let router = Self::build_router(config, state.clone());
        Ok(Self { router, state })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ProxyConfig, state: AppState) -> Router {
        Router::new()
            .route(STATUS_PATH, get(status_handler))
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV4))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs))),
            )
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(self, listener: TcpListener, mut shutdown: broadcast::Receiver<()>) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            routes = self.state.mapper.routes().len(),
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Main proxy handler.
/// Maps the legacy path, then forwards the request upstream.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    state.stats.record_request();

    let method = request.method().clone();
    let request_id = request_id(request.headers()).to_string();

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        uri = %request.uri(),
        "Proxying request"
    );

    let mapped = state.mapper.map_uri(&method, request.uri()).await;
    let result = match mapped {
        Ok(target) => state.forwarder.forward(request, &target).await,
        Err(e) => Err(ProxyError::from(e)),
    };

    let response = match result {
        Ok(response) => response,
        Err(e) => {
            if e.is_client_fault() {
                tracing::warn!(request_id = %request_id, method = %method, error = %e, "Request rejected");
            } else {
                tracing::error!(request_id = %request_id, method = %method, error = %e, "Request failed");
            }
            e.into_response()
        }
    };

    metrics::record_request(method.as_str(), response.status().as_u16(), start_time);
    response
}
