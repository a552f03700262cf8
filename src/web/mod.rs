mod handlers;
mod templates;

use crate::auth;
use crate::AppState;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{services::ServeDir, trace::TraceLayer};

/// Build the application router
pub fn router(state: Arc<AppState>) -> Router {
    // HTML pages: redirect to /login without a session
    let pages = Router::new()
        .route("/dashboard", get(handlers::dashboard))
        .route(
            "/github",
            get(handlers::github_page).post(handlers::analyze_repository),
        )
        .route("/github/connect", post(handlers::github_connect))
        .route("/profile", get(handlers::profile))
        .route("/resume", get(handlers::resume))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_page_session,
        ));

    // JSON endpoints: 401 without a session
    let api = Router::new()
        .route("/github/progress/:id", get(handlers::github_progress))
        .route("/github/improvements/:id", get(handlers::github_improvements))
        .route("/github/refresh", post(handlers::github_refresh))
        .route("/profile/summary", get(handlers::profile_summary))
        .route("/learning/generate", post(handlers::learning_generate))
        .route("/learning/current", get(handlers::learning_current))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_api_session,
        ));

    let public = Router::new()
        .route("/", get(handlers::login_page).post(handlers::login))
        .route("/login", get(handlers::login_page).post(handlers::login))
        .route("/signup", get(handlers::register_page).post(handlers::signup))
        .route("/logout", get(handlers::logout))
        .route("/learning", get(handlers::learning_page))
        .route("/learning/submit", post(handlers::learning_submit))
        .route("/learning/roadmap", post(handlers::learning_roadmap))
        .route("/learning/evaluate", post(handlers::learning_evaluate));

    Router::new()
        .merge(public)
        .merge(pages)
        .merge(api)
        .nest_service("/static", ServeDir::new(&state.config.web.static_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the web server
pub async fn start_server(state: Arc<AppState>) -> anyhow::Result<()> {
    let addr = format!("{}:{}", state.config.web.host, state.config.web.port);
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Web server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
