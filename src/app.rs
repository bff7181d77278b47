use std::net::SocketAddr;

use anyhow::Context;
use axum::{
    http::{header, HeaderValue, Method},
    routing::get,
    Router,
};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::state::AppState;
use crate::{auth, categories, profile, recipes};

pub fn build_app(state: AppState) -> anyhow::Result<Router> {
    let cors = cors_layer(&state.config.cors_origin)?;
    let uploads = ServeDir::new(&state.config.uploads.dir);
    let max_upload = state.config.uploads.max_bytes;

    let app = Router::new()
        .nest(
            "/api",
            Router::new()
                .merge(auth::router())
                .merge(categories::router())
                .merge(recipes::router(max_upload))
                .merge(profile::router())
                .route("/health", get(|| async { "ok" })),
        )
        .nest_service("/uploads", uploads)
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!("http_request", %method, uri = %uri, status = tracing::field::Empty)
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        let latency_ms = latency.as_millis() as u64;
                        if status.is_server_error() {
                            tracing::error!(%status, latency_ms, "response");
                        } else {
                            tracing::info!(%status, latency_ms, "response");
                        }
                    },
                ),
        );
    Ok(app)
}

/// One configured origin, or anything when set to `*`.
fn cors_layer(origin: &str) -> anyhow::Result<CorsLayer> {
    if origin.trim() == "*" {
        return Ok(CorsLayer::permissive());
    }
    let origin: HeaderValue = origin
        .trim()
        .parse()
        .with_context(|| format!("invalid CORS_ORIGIN {origin:?}"))?;
    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]))
}

pub async fn serve(app: Router, host: &str, port: u16) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
