use super::assistant;
use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all API routes
pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        // Conversation turns
        .route("/agent", post(handlers::post_agent))
        // Vendor-backed
        .route("/chat", post(assistant::chat))
        .route("/tts", post(assistant::tts))
        .route("/solution", post(assistant::solution))
        .route("/summary", post(assistant::summary))
        .route("/realtime/session", post(assistant::realtime_session))
        .route("/realtime/say", post(assistant::realtime_say))
        // Admin
        .route("/transcripts", get(handlers::list_transcripts))
        .route(
            "/transcripts/:id",
            get(handlers::get_transcript).delete(handlers::delete_transcript),
        )
        // Blog
        .route(
            "/articles",
            get(handlers::list_articles).post(handlers::create_article),
        )
        .route(
            "/articles/:id",
            get(handlers::get_article)
                .put(handlers::update_article)
                .delete(handlers::delete_article),
        )
        // Voice relays
        .route("/stt", get(handlers::stt_socket))
        .route("/evi", get(handlers::evi_socket));

    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/api", api)
        .layer(CorsLayer::permissive())
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
