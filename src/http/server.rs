//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (request ID, tracing, timeout, body limit, metrics)
//! - Bind server to listener
//! - Drain in-flight requests on shutdown

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{DefaultBodyLimit, MatchedPath},
    http::Request,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::blockchain::{AnchorSigner, ChainClient, TransactionSigner};
use crate::config::AppConfig;
use crate::hashing::ContentHasher;
use crate::http::request::{request_id, MakeRequestUuid};
use crate::http::{anchor, credential, health, network, receipt, verify};
use crate::identity::NetworkRegistry;
use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::receipt::ReceiptStore;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    /// `None` when the node was unreachable at startup or chain access is off.
    pub chain: Option<ChainClient>,
    /// Server-held key for `/api/anchor`.
    pub signer: Option<Arc<dyn TransactionSigner>>,
    pub receipts: Arc<ReceiptStore>,
    pub hasher: ContentHasher,
    /// Outbound client for the anchor backend.
    pub http: reqwest::Client,
    pub networks: Arc<NetworkRegistry>,
}

impl AppState {
    /// State without a chain connection. The signer is loaded from config;
    /// a bad key URI disables `/api/anchor` instead of failing startup.
    pub fn new(config: AppConfig) -> Self {
        let outbound = Duration::from_secs(config.timeouts.outbound_secs);

        let signer = match AnchorSigner::from_uri(&config.anchor.signer_uri) {
            Ok(signer) => Some(Arc::new(signer) as Arc<dyn TransactionSigner>),
            Err(e) => {
                tracing::warn!(error = %e, "Anchor signer unavailable; /api/anchor disabled");
                None
            }
        };

        let http = reqwest::Client::builder()
            .timeout(outbound)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Falling back to default HTTP client");
                reqwest::Client::new()
            });

        Self {
            chain: None,
            signer,
            receipts: Arc::new(ReceiptStore::new()),
            hasher: ContentHasher::new(config.hashing.max_input_bytes, outbound),
            http,
            networks: Arc::new(NetworkRegistry::new(config.networks.clone())),
            config: Arc::new(config),
        }
    }

    /// State with a live chain connection when one can be made.
    ///
    /// A connection failure is logged and the server starts anyway; chain
    /// routes then answer with an error.
    pub async fn connect(config: AppConfig) -> Self {
        let chain = if config.chain.enabled {
            match ChainClient::connect(&config.chain).await {
                Ok(client) => Some(client),
                Err(e) => {
                    tracing::warn!(endpoint = %config.chain.endpoint, error = %e, "Chain unavailable at startup");
                    None
                }
            }
        } else {
            None
        };
        Self { chain, ..Self::new(config) }
    }

    pub fn with_chain(mut self, chain: ChainClient) -> Self {
        self.chain = Some(chain);
        self
    }

    pub fn with_signer(mut self, signer: Arc<dyn TransactionSigner>) -> Self {
        self.signer = Some(signer);
        self
    }
}

/// The API server.
pub struct HttpServer {
    router: Router,
    config: Arc<AppConfig>,
}

impl HttpServer {
    pub fn new(state: AppState) -> Self {
        let config = state.config.clone();
        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &AppConfig, state: AppState) -> Router {
        let max_body = config.security.max_body_size;

        Router::new()
            .route("/api/health", get(health::health))
            .route("/api/chain", get(health::chain_info))
            .route("/api/credential", post(credential::issue))
            .route("/api/anchor", post(anchor::anchor))
            .route("/api/verify", post(verify::verify_payload))
            .route("/api/verify/file", post(verify::verify_file))
            .route("/api/receipt", post(receipt::store).get(receipt::fetch))
            .route("/api/network", get(network::resolve))
            .route("/api/qr", get(network::qr))
            .route_layer(middleware::from_fn(track_metrics))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                        tracing::info_span!(
                            "request",
                            method = %request.method(),
                            path = %request.uri().path(),
                            request_id = %request_id(request.headers()),
                        )
                    }))
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
                    .layer(DefaultBodyLimit::max(max_body)),
            )
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(self, listener: TcpListener, shutdown: Shutdown) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            chain = %self.config.chain.network,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown.wait())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// The fully layered router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }
}

async fn track_metrics(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(request).await;
    metrics::record_request(&route, response.status().as_u16(), start);
    response
}
