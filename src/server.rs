use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::AppState;
use crate::api::{document, insights, options, sessions};
use crate::config::AppConfig;
use crate::llm::ChatCompletionsDriver;
use crate::ui;

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let body_limit = state.config.server.max_upload_bytes;

    Router::new()
        .route("/", get(ui::index))
        .route("/api/options", get(options::get_options))
        .route("/api/sessions", post(sessions::create_session))
        .route(
            "/api/sessions/{id}",
            get(sessions::get_session).delete(sessions::delete_session),
        )
        .route("/api/sessions/{id}/document", post(document::upload_document))
        .route(
            "/api/sessions/{id}/insights",
            post(insights::generate_insights),
        )
        .route("/api/sessions/{id}/export", get(insights::export_report))
        .route("/api/sessions/{id}/reset", post(sessions::reset_session))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the Axum server with the provided configuration.
pub async fn start_server(config: Arc<AppConfig>) -> anyhow::Result<()> {
    let settings = config.llm.settings();

    info!(
        name: "llm.config.loaded",
        base_url = %settings.base_url,
        provider = ?settings.provider,
        default_model = %config.llm.default_model,
        server_credential = config.llm.api_key().is_some(),
        "LLM configuration loaded"
    );

    let driver = Arc::new(ChatCompletionsDriver::new(settings));
    let state = AppState::new(Arc::clone(&config), driver);
    let app = router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(
        name: "server.started",
        address = %addr,
        max_upload_bytes = config.server.max_upload_bytes,
        "Server started"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
