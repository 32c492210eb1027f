use crate::config::Config;
use crate::synthesis::{PiperEngine, SynthesisEngine, Synthesizer};
use anyhow::Result;
use axum::{
    response::{Html, IntoResponse},
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::select;
use tokio_util::sync::CancellationToken;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    services::ServeDir,
};
use tracing::info;

pub struct AppStateInner {
    pub config: Arc<Config>,
    pub synthesizer: Arc<Synthesizer>,
    pub token: CancellationToken,
}

pub type AppState = Arc<AppStateInner>;

pub struct AppStateBuilder {
    pub config: Option<Config>,
    pub engine: Option<Arc<dyn SynthesisEngine>>,
}

impl AppStateBuilder {
    pub fn new() -> Self {
        Self {
            config: None,
            engine: None,
        }
    }

    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Substitute the external engine, used by tests
    pub fn engine(mut self, engine: Arc<dyn SynthesisEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    pub fn build(self) -> Result<AppState> {
        let config = Arc::new(self.config.unwrap_or_default());
        let token = CancellationToken::new();
        let synthesis = config.synthesis.clone().unwrap_or_default();
        let engine = self
            .engine
            .unwrap_or_else(|| Arc::new(PiperEngine::new(synthesis.command.as_str())));
        let synthesizer = Arc::new(Synthesizer::new(engine, &synthesis));

        Ok(Arc::new(AppStateInner {
            config,
            synthesizer,
            token,
        }))
    }
}

pub async fn run(state: AppState) -> Result<()> {
    let token = state.token.clone();
    let app = create_router(state.clone());
    let addr: SocketAddr = state.config.http_addr.parse()?;
    let listener = match TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!("Failed to bind to {}: {}", addr, e);
            return Err(anyhow::anyhow!("Failed to bind to {}: {}", addr, e));
        }
    };
    info!("listening on {}", addr);

    let http_task = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    );

    select! {
        http_result = http_task => {
            match http_result {
                Ok(_) => info!("Server shut down gracefully"),
                Err(e) => {
                    tracing::error!("Server error: {}", e);
                    return Err(anyhow::anyhow!("Server error: {}", e));
                }
            }
        }
        _ = token.cancelled() => {
            info!("Application shutting down due to cancellation");
        }
    }
    Ok(())
}

// Index page handler
async fn index_handler() -> impl IntoResponse {
    match std::fs::read_to_string("static/index.html") {
        Ok(content) => Html(content).into_response(),
        Err(e) => {
            tracing::error!("Failed to read index.html: {}", e);
            Html("<html><body><h1>Error loading page</h1></body></html>").into_response()
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    let static_files_service = ServeDir::new("static");

    // CORS configuration to allow cross-origin requests
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::ACCEPT,
            axum::http::header::ORIGIN,
        ]);

    let api_routes = crate::handler::router().with_state(state);

    Router::new()
        .route("/", get(index_handler))
        .nest_service("/static", static_files_service)
        .merge(api_routes)
        .layer(cors)
}
