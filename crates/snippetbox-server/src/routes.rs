// ABOUTME: Route definitions and middleware stack for the snippetbox web server.
// ABOUTME: Assembles page routes, static files, and health check into a single Axum Router.

use std::any::Any;

use axum::Router;
use axum::http::header::{CONNECTION, CONTENT_TYPE};
use axum::http::{HeaderValue, Response, StatusCode};
use axum::routing::get;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::app_state::SharedState;
use crate::headers::SecureHeadersLayer;
use crate::session::SessionLayer;
use crate::web;

/// Build the complete Axum router with all routes and shared state.
pub fn create_router(state: SharedState) -> Router {
    let pages = Router::new()
        .route("/", get(web::home))
        .route("/snippet/view/{id}", get(web::snippet_view))
        .route(
            "/snippet/create",
            get(web::snippet_create_form).post(web::snippet_create_post),
        )
        .layer(SessionLayer::new(
            state.sessions.clone(),
            state.session_lifetime,
        ));

    Router::new()
        .merge(pages)
        .route("/health", get(health))
        .nest_service("/static", ServeDir::new(&state.static_dir))
        .fallback(web::not_found)
        .with_state(state)
        .layer(SecureHeadersLayer)
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(handle_panic))
}

/// Health check handler. Returns 200 OK with a simple JSON body.
async fn health() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({ "status": "ok" }))
}

/// Log a handler panic and answer with a bare 500, closing the connection.
fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response<String> {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };
    tracing::error!(panic = %detail, "request handler panicked");

    let mut resp = Response::new("Internal Server Error".to_string());
    *resp.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    let headers = resp.headers_mut();
    headers.insert(CONNECTION, HeaderValue::from_static("close"));
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"));
    resp
}
