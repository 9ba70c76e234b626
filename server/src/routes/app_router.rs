use axum::{
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method, StatusCode,
    },
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;

use crate::{request_tracing, ServerState};

use super::handlers::{auth, email, stats};

pub struct AppRouter;

impl AppRouter {
    pub fn create(state: ServerState) -> Router {
        let origin = state
            .frontend
            .origin()
            .parse::<HeaderValue>()
            .expect("Frontend origin is not a valid header value");

        let cors_layer = CorsLayer::new()
            .allow_origin(origin)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([AUTHORIZATION, CONTENT_TYPE])
            .allow_credentials(true);

        Router::new()
            .route("/", get(|| async { "Gmail AI assistant" }))
            .route("/auth/url", get(auth::handler_auth_url))
            .route(
                "/auth/callback",
                get(auth::handler_auth_callback).post(auth::handler_exchange_code),
            )
            .route("/emails", get(email::list_emails))
            .route("/emails/:message_id/trash", post(email::trash_email))
            .route("/emails/:message_id/analyze", get(email::analyze_email))
            .route(
                "/emails/:message_id/draft-response",
                post(email::draft_response),
            )
            .route("/stats", get(stats::get_stats))
            .layer(request_tracing::trace_with_request_id_layer())
            .layer(cors_layer)
            .with_state(state)
            .fallback(handler_404)
    }
}

pub async fn handler_404() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "Route does not exist")
}
