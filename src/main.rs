use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use smdb_api::config::{self, Environment};
use smdb_api::database::manager::DatabaseManager;
use smdb_api::middleware::jwt_auth_middleware;

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    // Initialize configuration (this loads the config singleton)
    let config = config::config();
    tracing::info!("Starting SMDB API in {:?} mode", config.environment);

    // Apply schema migrations up front; a missing database degrades /health
    // instead of killing the process
    if let Err(e) = DatabaseManager::run_migrations().await {
        tracing::warn!("database not ready at startup: {}", e);
    }

    let app = app();

    // Allow tests or deployments to override port via env
    let port = std::env::var("SMDB_API_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(8000);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    println!("SMDB API server listening on http://{}", bind_addr);

    axum::serve(listener, app).await.expect("server");
}

fn app() -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .merge(account_routes())
        .merge(vendor_routes())
        .merge(risk_assessment_routes())
        .merge(site_routes())
        // Global middleware
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(
            config::config().api.max_request_size_bytes,
        ))
}

fn account_routes() -> Router {
    use smdb_api::handlers::account;

    Router::new()
        .route("/account/login", post(account::login))
        .route("/account/signup", post(account::signup))
        .route("/account/refresh", post(account::refresh))
        // Only endpoint behind the JWT middleware
        .route(
            "/account/me",
            get(account::me).route_layer(axum_middleware::from_fn(jwt_auth_middleware)),
        )
}

fn vendor_routes() -> Router {
    use smdb_api::handlers::vendor;

    Router::new().route("/vendor/create", post(vendor::create))
}

fn risk_assessment_routes() -> Router {
    use smdb_api::handlers::risk_assessment;

    Router::new().route("/risk-assessment/create", post(risk_assessment::create))
}

fn site_routes() -> Router {
    use smdb_api::handlers::site;

    Router::new()
        .route("/sites/create", post(site::create))
        .route("/sites/all", get(site::list))
        .route("/sites/import-excel", post(site::import_excel))
}

fn cors_layer() -> CorsLayer {
    let config = config::config();
    if !config.security.enable_cors {
        return CorsLayer::new();
    }

    match config.environment {
        Environment::Development => CorsLayer::permissive(),
        _ => {
            let origins: Vec<HeaderValue> = config
                .security
                .cors_origins
                .iter()
                .filter_map(|origin| origin.parse().ok())
                .collect();
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods(Any)
                .allow_headers(Any)
        }
    }
}

async fn root() -> axum::response::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::response::Json(json!({
        "name": "SMDB API",
        "version": version,
        "description": "Site management backend - sites, vendors, risk assessments, accounts",
        "endpoints": {
            "home": "/ (public)",
            "health": "/health (public)",
            "account": "/account/login, /account/signup, /account/refresh (public), /account/me (JWT)",
            "vendors": "/vendor/create (public)",
            "risk_assessments": "/risk-assessment/create (public)",
            "sites": "/sites/create, /sites/all, /sites/import-excel (public)",
        }
    }))
}

async fn health() -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match DatabaseManager::health_check().await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            axum::response::Json(json!({
                "status": "ok",
                "timestamp": now,
                "database": "ok"
            })),
        ),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            axum::response::Json(json!({
                "status": "degraded",
                "timestamp": now,
                "database_error": e.to_string()
            })),
        ),
    }
}
