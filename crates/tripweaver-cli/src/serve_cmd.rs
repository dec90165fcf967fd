use std::net::{IpAddr, SocketAddr};

use anyhow::{Context, Result};
use axum::routing::{delete, get, post};
use axum::{Json, Router, middleware};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api::{AppState, auth, legacy, trips, users};

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn build_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/users/delete/{user_id}", delete(users::delete_user))
        .route("/trips", get(trips::list))
        .route("/trips/generate", post(trips::generate))
        .route("/trips/save", post(trips::save))
        .route(
            "/trips/{trip_id}",
            get(trips::get).put(trips::update).delete(trips::delete),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_bearer,
        ));

    let mut router = Router::new()
        .route("/health", get(health))
        .route("/users/register", post(users::register))
        .route("/users/login", post(users::login))
        .route("/users/refresh", post(users::refresh))
        .route("/users/logout", post(users::logout))
        .merge(protected);

    if state.api_password.is_some() {
        router = router.route(
            "/generate_trip",
            post(legacy::generate_trip).route_layer(middleware::from_fn_with_state(
                state.clone(),
                legacy::require_api_password,
            )),
        );
    }

    router
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub async fn run_serve(state: AppState, bind: &str, port: u16) -> Result<()> {
    let legacy_enabled = state.api_password.is_some();
    let app = build_router(state);
    let ip: IpAddr = bind
        .parse()
        .with_context(|| format!("invalid bind address: {bind}"))?;
    let addr = SocketAddr::new(ip, port);
    tracing::info!(legacy_enabled, "tripweaver listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("tripweaver shut down");
    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install Ctrl+C handler");
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
