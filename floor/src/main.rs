//! Trading Floor Dashboard
//!
//! HTTP service over the shared simulation database: per-trader card
//! slots with change detection, a manual "run trades" trigger that fans
//! out one engine process per agent, and on-demand CSV exports.
//!
//! Usage: cargo run --bin floor-dashboard
//! Then open http://localhost:3000

mod account;
mod config;
mod error;
mod export;
mod floor;
mod logs;
mod market;
mod refresh;
mod runner;
mod trader;
mod types;

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use axum::extract::{Path as AxumPath, State};
use axum::http::StatusCode;
use axum::response::{Html, Json};
use axum::routing::{get, post};
use axum::Router;
use clap::Parser;
use serde::Serialize;
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::account::AccountStore;
use crate::config::Config;
use crate::floor::TradingFloor;
use crate::logs::LogReader;
use crate::market::{MarketClock, MarketHours, PriceBook};
use crate::refresh::{Refresh, LOG_POLL_INTERVAL, SLOW_POLL_INTERVAL};
use crate::runner::EngineRunner;
use crate::trader::{HoldingRow, TraderView, ValueCard};
use crate::types::{LogEntry, RunOutcome, Transaction, ValuePoint};

#[derive(Parser)]
#[command(
    name = "floor-dashboard",
    about = "Dashboard service for the autonomous trading-floor simulation"
)]
struct Cli {
    /// Serve on this port (overrides DASHBOARD_PORT)
    #[arg(long)]
    port: Option<u16>,

    /// Load config from a specific .env file
    #[arg(long)]
    config_file: Option<String>,

    /// Shared simulation database (overrides DB_PATH)
    #[arg(long)]
    db: Option<String>,
}

struct AppState {
    cfg: Config,
    start_time: Instant,
    views: Mutex<HashMap<String, TraderView>>,
    store: AccountStore,
    log_reader: LogReader,
    prices: PriceBook,
    market: MarketClock,
    floor: TradingFloor<EngineRunner, MarketClock>,
}

type SharedState = Arc<AppState>;

const INDEX_HTML: &str = "<!doctype html>\n<html><head><title>Trading Floor</title></head>\n<body>\n<h1>🚀 Trading Floor Dashboard</h1>\n<p>Data: GET /api/status, /api/traders, /api/trader/{name}/value|chart|logs|holdings|transactions</p>\n<p>Actions: POST /api/run, POST /api/export</p>\n</body></html>\n";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    let mut cfg = Config::from_env_file(cli.config_file.as_deref())?;
    if let Some(port) = cli.port {
        cfg.dashboard_port = port;
    }
    if let Some(db) = cli.db {
        cfg.db_path = db;
    }

    let roster: Vec<&str> = cfg.traders.iter().map(|t| t.name.as_str()).collect();
    info!("══════════════════════════════════════════════");
    info!("  TRADING FLOOR DASHBOARD");
    info!("  Traders: {}", roster.join(", "));
    info!("  DB: {} | Engine: {}", cfg.db_path, cfg.engine_cmd);
    info!(
        "  Market override: {} | Log tail: {}",
        cfg.run_even_when_closed, cfg.log_tail
    );
    info!("  http://localhost:{}", cfg.dashboard_port);
    info!("══════════════════════════════════════════════");

    let store = AccountStore::new(&cfg.db_path, cfg.initial_balance);
    let log_reader = LogReader::new(&cfg.db_path);
    let prices = PriceBook::new(&cfg.db_path);
    let market = MarketClock::new(&cfg.polygon_api_key, cfg.run_even_when_closed);
    let runner = EngineRunner::from_command(&cfg.engine_cmd);
    let floor = TradingFloor::new(cfg.traders.clone(), runner, market.clone());

    let views: HashMap<String, TraderView> = cfg
        .traders
        .iter()
        .map(|spec| (spec.name.clone(), TraderView::new(spec.clone())))
        .collect();

    let port = cfg.dashboard_port;
    let state: SharedState = Arc::new(AppState {
        cfg,
        start_time: Instant::now(),
        views: Mutex::new(views),
        store,
        log_reader,
        prices,
        market,
        floor,
    });

    let app = Router::new()
        .route("/", get(serve_index))
        .route("/api/status", get(api_status))
        .route("/api/traders", get(api_traders))
        .route("/api/trader/:name/value", get(api_value))
        .route("/api/trader/:name/chart", get(api_chart))
        .route("/api/trader/:name/logs", get(api_logs))
        .route("/api/trader/:name/holdings", get(api_holdings))
        .route("/api/trader/:name/transactions", get(api_transactions))
        .route("/api/run", post(api_run))
        .route("/api/export", post(api_export))
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Bind dashboard port {addr}"))?;
    info!("Dashboard running at http://localhost:{port}");
    axum::serve(listener, app).await.context("serve failed")?;
    Ok(())
}

// ── API payloads ──

/// `{changed, data}` envelope for one slot poll: `data` is present only
/// when the slot actually changed, so pollers skip redundant re-renders.
#[derive(Serialize)]
struct SlotPayload<T> {
    changed: bool,
    data: Option<T>,
}

impl<T> From<Refresh<T>> for SlotPayload<T> {
    fn from(refresh: Refresh<T>) -> Self {
        Self {
            changed: refresh.is_changed(),
            data: refresh.into_option(),
        }
    }
}

#[derive(Serialize)]
struct TraderCard {
    name: String,
    lastname: String,
    model: String,
    title: String,
}

#[derive(Serialize)]
struct FloorStatus {
    market_open: bool,
    phase: String,
    traders: usize,
    uptime_secs: u64,
    log_poll_ms: u64,
    slow_poll_secs: u64,
}

#[derive(Serialize)]
struct RunStatus {
    status: String,
    outcome: RunOutcome,
}

#[derive(Serialize)]
struct ExportStatus {
    status: String,
}

// ── Handlers ──

async fn serve_index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn api_status(State(state): State<SharedState>) -> Json<FloorStatus> {
    Json(FloorStatus {
        market_open: state.market.is_open().await,
        phase: state.floor.phase().to_string(),
        traders: state.floor.traders().len(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        log_poll_ms: LOG_POLL_INTERVAL.as_millis() as u64,
        slow_poll_secs: SLOW_POLL_INTERVAL.as_secs(),
    })
}

async fn api_traders(State(state): State<SharedState>) -> Json<Vec<TraderCard>> {
    let cards = state
        .floor
        .traders()
        .iter()
        .map(|spec| TraderCard {
            name: spec.name.clone(),
            lastname: spec.lastname.clone(),
            model: spec.model.clone(),
            title: spec.title(),
        })
        .collect();
    Json(cards)
}

async fn api_value(
    AxumPath(name): AxumPath<String>,
    State(state): State<SharedState>,
) -> Result<Json<SlotPayload<ValueCard>>, StatusCode> {
    let mut views = state.views.lock().await;
    let view = views.get_mut(&name).ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(view.poll_value(&state.store, &state.prices).into()))
}

async fn api_chart(
    AxumPath(name): AxumPath<String>,
    State(state): State<SharedState>,
) -> Result<Json<SlotPayload<Vec<ValuePoint>>>, StatusCode> {
    let mut views = state.views.lock().await;
    let view = views.get_mut(&name).ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(view.poll_chart(&state.store).into()))
}

async fn api_logs(
    AxumPath(name): AxumPath<String>,
    State(state): State<SharedState>,
) -> Result<Json<SlotPayload<Vec<LogEntry>>>, StatusCode> {
    let mut views = state.views.lock().await;
    let view = views.get_mut(&name).ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(
        view.poll_logs(&state.log_reader, state.cfg.log_tail).into(),
    ))
}

async fn api_holdings(
    AxumPath(name): AxumPath<String>,
    State(state): State<SharedState>,
) -> Result<Json<SlotPayload<Vec<HoldingRow>>>, StatusCode> {
    let mut views = state.views.lock().await;
    let view = views.get_mut(&name).ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(view.poll_holdings(&state.store).into()))
}

async fn api_transactions(
    AxumPath(name): AxumPath<String>,
    State(state): State<SharedState>,
) -> Result<Json<SlotPayload<Vec<Transaction>>>, StatusCode> {
    let mut views = state.views.lock().await;
    let view = views.get_mut(&name).ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(view.poll_transactions(&state.store).into()))
}

/// Manual trigger: one full round across all agents, answered with the
/// aggregated outcome. Refresh polls keep serving snapshots while the
/// round is in flight.
async fn api_run(State(state): State<SharedState>) -> Json<RunStatus> {
    let outcome = state.floor.run_round().await;
    Json(RunStatus {
        status: outcome.status_line(),
        outcome,
    })
}

async fn api_export(State(state): State<SharedState>) -> Json<ExportStatus> {
    let status = match export::write_exports(
        state.floor.traders(),
        &state.store,
        &state.prices,
        Path::new(&state.cfg.export_dir),
    ) {
        Ok(report) => report.status_line(),
        Err(e) => format!("❌ Error generating summary: {e:#}"),
    };
    Json(ExportStatus { status })
}
