use anyhow::{Context, Result};
use clap::Parser;
use mock_interview::session::{IntervalTicker, JsonFileStorage, SystemClock};
use mock_interview::{create_router, AppState, ChatCompletionsModel, Config, QuestionService, SessionDeps};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Timed mock-interview session service", long_about = None)]
struct Cli {
    /// Config file path (extension optional)
    #[arg(short, long, default_value = "config/mock-interview")]
    config: String,

    /// Override the HTTP port from the config file
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let cfg = Config::load(&cli.config)?;

    info!("Mock Interview v{}", env!("CARGO_PKG_VERSION"));
    info!("Loaded config: {}", cfg.service.name);

    let model = Arc::new(ChatCompletionsModel::from_config(&cfg.question_service));
    let service = QuestionService::new(model)
        .with_request_timeout(cfg.question_service.request_timeout());

    let deps = SessionDeps {
        service: Arc::new(service),
        storage: Arc::new(JsonFileStorage::new(&cfg.storage.path)?),
        ticker: Arc::new(IntervalTicker::new(cfg.timing.tick_period())),
        clock: Arc::new(SystemClock),
    };

    let app = create_router(AppState::new(deps, cfg.timing.budget()));

    let port = cli.port.unwrap_or(cfg.service.http.port);
    let addr = format!("{}:{}", cfg.service.http.bind, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("HTTP server listening on {}", addr);
    axum::serve(listener, app).await.context("HTTP server failed")?;

    Ok(())
}
