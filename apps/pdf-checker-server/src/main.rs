//! PDF Rule Checker Server
//!
//! Accepts a PDF upload plus up to three natural-language rules and returns
//! an evidence-backed pass/fail verdict per rule. Provides REST endpoints for:
//!
//! - Rule analysis (`POST /api/pdf/analyze`)
//! - Liveness checks (`GET /ping`, `GET /health`)
//!
//! ## Architecture
//!
//! The server is a thin layer over `rule_engine::AnalysisPipeline`, adding:
//!
//! - Multipart upload parsing and body size limits
//! - Rate limiting via tower-governor
//! - CORS and request tracing

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use clap::Parser;
use model_judge::{GeminiClient, JudgeConfig, ModelJudge};
use rule_engine::{AnalysisPipeline, PipelineLimits};
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod api;
mod error;

use api::{handle_analyze, handle_health, handle_ping};

/// Command-line arguments for the PDF checker server
#[derive(Parser, Debug)]
#[command(name = "pdf-checker-server")]
#[command(about = "Checks PDF documents against natural-language rules")]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value = "5000")]
    port: u16,

    /// Host address to bind to
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: String,

    /// Rate limit: requests per second per IP
    #[arg(long, default_value = "10")]
    rate_limit: u32,

    /// Maximum upload size in megabytes
    #[arg(long, default_value = "10")]
    max_upload_mb: usize,

    /// Gemini API key
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    gemini_api_key: String,

    /// Gemini model name
    #[arg(long, env = "GEMINI_MODEL", default_value = model_judge::gemini::DEFAULT_MODEL)]
    gemini_model: String,

    /// Gemini API base URL
    #[arg(long, env = "GEMINI_BASE_URL", default_value = model_judge::gemini::DEFAULT_BASE_URL)]
    gemini_base_url: String,

    /// Per-attempt model request timeout in seconds
    #[arg(long, default_value = "60")]
    judge_timeout_secs: u64,

    /// Retries for transient model failures (5xx, 429, timeouts)
    #[arg(long, default_value = "2")]
    judge_max_retries: u32,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<AnalysisPipeline>,
    /// Upload size limit in bytes
    pub max_upload_bytes: usize,
}

/// Routes and middleware shared by `main` and the tests
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let body_limit = state.max_upload_bytes;

    Router::new()
        .route("/ping", get(handle_ping))
        .route("/health", get(handle_health))
        .route("/api/pdf/analyze", post(handle_analyze))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting PDF checker server on {}:{}", args.host, args.port);

    // Judge client is created once and shared read-only by all requests
    let judge_config = JudgeConfig {
        api_key: args.gemini_api_key,
        model: args.gemini_model,
        base_url: args.gemini_base_url,
        timeout_secs: args.judge_timeout_secs,
        max_retries: args.judge_max_retries,
        ..JudgeConfig::default()
    };
    info!("Judge config: {:?}", judge_config);
    let client = GeminiClient::new(judge_config)?;
    let pipeline = AnalysisPipeline::new(ModelJudge::new(Arc::new(client)))
        .with_limits(PipelineLimits::default());

    let state = AppState {
        pipeline: Arc::new(pipeline),
        max_upload_bytes: args.max_upload_mb * 1024 * 1024,
    };

    // Create rate limiter configuration
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(args.rate_limit.into())
            .burst_size(args.rate_limit * 2)
            .finish()
            .ok_or_else(|| anyhow::anyhow!("Invalid rate limit: {}", args.rate_limit))?,
    );

    let app = build_router(state).layer(GovernorLayer {
        config: governor_conf,
    });

    // Start server
    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("Server listening on http://{}", addr);
    info!("Rate limit: {} requests/second per IP", args.rate_limit);
    info!("Upload limit: {} MB", args.max_upload_mb);

    // The governor keys on peer IP, which needs connect info
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
