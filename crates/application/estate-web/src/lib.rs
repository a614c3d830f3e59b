//! Real-estate analytics dashboard, web front end
//!
//! Two views behind a collapsible sidebar, served as HTMX fragments:
//!
//! - **Data Analysis**: precomputed market charts by category, with a
//!   per-city district breakdown and a chart viewer
//! - **Price Prediction**: a form backed by the price model's metadata that
//!   posts to the prediction backend
//!
//! Controller state lives server-side, one session per browser.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;
pub mod templates;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_cookies::CookieManagerLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

pub use error::WebError;
pub use state::AppState;

/// Create the main router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let charts = ServeDir::new(&state.config.assets.charts_dir);
    let charts_url = state.config.assets.charts_url.clone();

    Router::new()
        .route("/", get(handlers::index))
        // View router
        .route("/view/:name", get(handlers::view))
        .route("/view/:name/reload", post(handlers::view_reload))
        // Analysis view
        .route("/analysis/category/:key", post(handlers::analysis_category))
        .route("/analysis/city", post(handlers::analysis_city))
        .route("/analysis/modal", get(handlers::analysis_modal_open))
        .route("/analysis/modal/close", post(handlers::analysis_modal_close))
        // Prediction view
        .route("/prediction/districts", get(handlers::prediction_districts))
        .route("/prediction/months", get(handlers::prediction_months))
        .route("/prediction/submit", post(handlers::prediction_submit))
        // Chrome
        .route("/sidebar/toggle", post(handlers::sidebar_toggle))
        .route("/sidebar/resize", post(handlers::sidebar_resize))
        // API + static
        .route("/api/health", get(handlers::health))
        .route("/static/style.css", get(handlers::style_css))
        .nest_service(&charts_url, charts)
        .layer(CookieManagerLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Start the web server
pub async fn serve(state: Arc<AppState>, addr: &str) -> Result<(), WebError> {
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Estate dashboard listening on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
