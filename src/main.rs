use axum::routing::get;
use axum_prometheus::PrometheusMetricLayer;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;

use mindmap_server::config::Config;
use mindmap_server::preview::{LinkPreviewResolver, ResolverOptions};
use mindmap_server::state::AppState;
use mindmap_server::{db, routes};

#[tokio::main]
async fn main() {
    // Initialize tracing — JSON in production, human-readable in dev.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "mindmap_server=info,tower_http=info,sqlx=warn"
            .parse()
            .unwrap()
    });

    if std::env::var("APP_ENV").as_deref() == Ok("production") {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    info!("🚀 Mindmap Server starting...");

    let config = Config::from_env();
    info!("📝 Configuration loaded");

    let pool = db::create_pool(&config.database_url)
        .await
        .expect("Failed to create database pool");

    // Auto-run pending migrations on startup.
    db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    info!("✅ Database migrations applied");

    db::health_check(&pool)
        .await
        .expect("Database health check failed");
    info!("✅ Database health check passed");

    let preview = LinkPreviewResolver::new(ResolverOptions {
        block_private_networks: config.preview_block_private_networks,
        ..ResolverOptions::default()
    })
    .expect("Failed to build link preview HTTP client");
    if config.preview_block_private_networks {
        info!("🛡️ Link preview: private network targets blocked");
    }

    // CORS: permissive in dev, restrictive in production.
    let cors = if config.is_dev {
        info!("🔓 CORS: permissive (dev mode)");
        CorsLayer::permissive()
    } else {
        tracing::warn!("🔒 CORS: restrictive (production mode)");
        CorsLayer::new()
    };

    let addr = config.server_addr();
    let app_state = AppState { pool, preview };

    let (prometheus_layer, metric_handle) = PrometheusMetricLayer::pair();

    let app = routes::router(app_state)
        .route(
            "/metrics",
            get(move || async move { metric_handle.render() }),
        )
        .layer(prometheus_layer)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    info!("🎧 Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .await
        .expect("Server failed to start");
}
