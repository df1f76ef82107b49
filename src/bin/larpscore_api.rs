//! LarpScore API Server
//!
//! REST API over the scan pipeline
//!
//! Usage:
//!   cargo run --bin larpscore_api
//!
//! Environment:
//!   LARP_PORT / PORT        - Server port (default: 8080)
//!   LARP_HOST               - Server host (default: 0.0.0.0)
//!   LARP_ADAPTER_TIMEOUT_MS - Per-adapter timeout (default: 8000)
//!   LARP_CACHE_DIR          - On-disk report store (default: memory)
//!   LARP_TRUST_PROXY        - Rate limit by X-Forwarded-For (default: peer address)
//!   RUST_LOG                - Log filter (default: info)

use larpscore::api::{create_router, AppState};
use larpscore::utils::constants::{APP_NAME, APP_VERSION};
use larpscore::{ScanConfig, ScanManager, ServerConfig};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    print_banner();

    let scan_config = ScanConfig::default();
    scan_config.scoring.validate()?;
    let manager = Arc::new(ScanManager::from_config(&scan_config)?);
    let manager_for_shutdown = Arc::clone(&manager);

    let state = Arc::new(AppState::with_maintenance(manager, scan_config.job_retention));
    info!("🧹 Background maintenance task started");

    let app = create_router(state);

    let server = ServerConfig::default();
    let addr: SocketAddr = format!("{}:{}", server.host, server.port).parse()?;

    info!("🚀 {} API v{} starting on http://{}", APP_NAME, APP_VERSION, addr);
    info!("");
    info!("Endpoints:");
    info!("  POST /v1/scan                    - Submit a scan {{ query, force_fresh }}");
    info!("  GET  /v1/scan/:job_id            - Job status / report");
    info!("  GET  /v1/report/:canonical_id    - Cached report");
    info!("  GET  /v1/resolve?q=              - Classification preview");
    info!("  GET  /v1/stats                   - Scan telemetry");
    info!("  GET  /v1/health                  - Health check");
    info!("");
    info!("Press Ctrl+C for graceful shutdown");

    let listener = TcpListener::bind(addr).await?;

    let shutdown_signal = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    // Peer addresses key anonymous rate limits
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("");
    info!("🛑 Shutdown signal received");

    let stats = manager_for_shutdown.telemetry().stats();
    info!("📊 Final telemetry:");
    info!("   Jobs submitted: {}", stats.jobs_submitted);
    info!("   Jobs completed: {} (avg {:.0}ms)", stats.jobs_completed, stats.avg_scan_ms);
    info!("   Served from cache: {}", stats.jobs_served_from_cache);
    info!("   Jobs failed: {}", stats.jobs_failed);

    info!("👋 LarpScore API shutdown complete");
    Ok(())
}

fn print_banner() {
    println!(
        r#"
    ╔══════════════════════════════════════════════════════════════╗
    ║                                                              ║
    ║     L A R P S C O R E                                        ║
    ║                                                              ║
    ║              C L O U D   A P I                               ║
    ║         Trust intelligence for crypto projects               ║
    ║                                                              ║
    ╚══════════════════════════════════════════════════════════════╝
    "#
    );
    println!("    {} v{}\n", APP_NAME, APP_VERSION);
}
