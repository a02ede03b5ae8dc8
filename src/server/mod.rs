/// HTTP API Server module for pulse-cli
/// Serves the metrics snapshots the dashboard and status command consume

#[cfg(feature = "server")]
pub mod routes;

#[cfg(feature = "server")]
pub mod handlers;

#[cfg(feature = "server")]
pub use routes::create_router;

#[cfg(feature = "server")]
pub async fn run(
    host: String,
    port: u16,
    enable_cors: bool,
    settings: crate::core::config::Settings,
) -> anyhow::Result<()> {
    use std::net::SocketAddr;
    use std::sync::Arc;

    use crate::core::metrics::MetricsProvider;

    let provider = Arc::new(MetricsProvider::new(&settings));
    let app = create_router(provider, enable_cors);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    println!("🚀 Pulse Metrics API");
    println!("   📍 Listening on http://{}", addr);
    println!("   🌍 Environment: {}", settings.environment);
    println!();
    println!("📚 API Endpoints:");
    println!("   GET  /api/v1/hello  - Greeting with version and timestamp");
    println!("   GET  /api/v1/info   - CPU / memory / disk snapshot");
    println!("   GET  /health        - Liveness check");
    println!();

    if enable_cors {
        tracing::info!("CORS enabled (permissive)");
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
