use anyhow::Context;
use axum::{
  extract::rejection::JsonRejection,
  extract::{Query, State, WebSocketUpgrade},
  http::{Method, StatusCode},
  response::IntoResponse,
  routing::{get, post},
  Json, Router,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::EnvFilter;

mod arcade;
mod config;
mod game;
mod profile;
mod protocol;
mod runtime;
mod store;
mod transport;

use arcade::Arcade;
use config::Config;
use profile::catalog::MemoryCatalog;
use profile::{Profile, ProfilePatch, DEFAULT_NAME};
use protocol::Command;
use runtime::Runtime;
use store::{LeaderboardEntry, RankBy, SqliteStore, DEFAULT_LIMIT};
use transport::ws_session::handle_socket;

#[derive(Clone)]
struct AppState {
  runtime: Runtime,
  store: SqliteStore,
}

#[derive(Debug, Serialize)]
struct OkResponse {
  ok: bool,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
  ok: bool,
  error: String,
}

#[derive(Debug, Serialize)]
struct ProfileResponse {
  profile: Option<Profile>,
}

#[derive(Debug, Serialize)]
struct LeaderboardResponse {
  scores: Vec<LeaderboardEntry>,
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
  name: Option<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .init();

  let config = Config::from_env().context("invalid configuration")?;
  let store = SqliteStore::connect(&config.database_url).await?;

  let mut arcade = Arcade::new(
    &config,
    Arc::new(MemoryCatalog::seeded()),
    StdRng::from_entropy(),
  );
  match store.load_profile().await {
    Ok(Some(profile)) => {
      tracing::info!(username = %profile.username, "restored profile");
      arcade.restore(profile);
    }
    Ok(None) => {}
    Err(error) => tracing::warn!(?error, "ignoring unreadable profile snapshot"),
  }

  let state = Arc::new(AppState {
    runtime: Runtime::new(arcade, Some(store.clone())),
    store,
  });

  let cors = CorsLayer::new()
    .allow_origin(Any)
    .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
    .allow_headers(Any);

  let app: Router = Router::new()
    .route("/api/health", get(health))
    .route("/api/state", get(state_get))
    .route("/api/command", post(command_post))
    .route("/api/ws", get(ws_handler))
    .route(
      "/api/profile",
      get(profile_get)
        .post(profile_post)
        .patch(profile_patch)
        .delete(profile_delete),
    )
    .route("/api/leaderboard", get(leaderboard_get))
    .layer(cors)
    .with_state(state);

  let address = format!("0.0.0.0:{}", config.port);
  tracing::info!("listening on {address}");
  let listener = tokio::net::TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;
  axum::serve(listener, app).await?;

  Ok(())
}

fn error_response(status: StatusCode, error: &str) -> axum::response::Response {
  (
    status,
    Json(ErrorResponse {
      ok: false,
      error: error.to_string(),
    }),
  )
    .into_response()
}

async fn health() -> impl IntoResponse {
  Json(OkResponse { ok: true })
}

async fn state_get(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(state.runtime.view().await)
}

async fn command_post(
  State(state): State<Arc<AppState>>,
  payload: Result<Json<Command>, JsonRejection>,
) -> impl IntoResponse {
  let Ok(Json(command)) = payload else {
    return error_response(StatusCode::BAD_REQUEST, "Invalid command");
  };
  Json(state.runtime.dispatch(command).await).into_response()
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  let runtime = state.runtime.clone();
  ws.on_upgrade(move |socket| handle_socket(socket, runtime))
}

async fn profile_get(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(ProfileResponse {
    profile: state.runtime.profile().await,
  })
}

async fn profile_post(
  State(state): State<Arc<AppState>>,
  payload: Result<Json<LoginRequest>, JsonRejection>,
) -> impl IntoResponse {
  let Ok(Json(request)) = payload else {
    return error_response(StatusCode::BAD_REQUEST, "Invalid JSON");
  };
  let name = request.name.unwrap_or_else(|| DEFAULT_NAME.to_string());
  let profile = state.runtime.login(&name).await;
  Json(ProfileResponse {
    profile: Some(profile),
  })
  .into_response()
}

async fn profile_patch(
  State(state): State<Arc<AppState>>,
  payload: Result<Json<ProfilePatch>, JsonRejection>,
) -> impl IntoResponse {
  let Ok(Json(patch)) = payload else {
    return error_response(StatusCode::BAD_REQUEST, "Invalid JSON");
  };
  match state.runtime.patch_profile(patch).await {
    Some(profile) => Json(ProfileResponse {
      profile: Some(profile),
    })
    .into_response(),
    None => error_response(StatusCode::NOT_FOUND, "Not signed in"),
  }
}

async fn profile_delete(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(OkResponse {
    ok: state.runtime.logout().await,
  })
}

async fn leaderboard_get(
  State(state): State<Arc<AppState>>,
  Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
  let by = RankBy::parse(params.get("by").map(String::as_str));
  let limit = params
    .get("limit")
    .and_then(|value| value.parse::<i64>().ok())
    .unwrap_or(DEFAULT_LIMIT);

  match state.store.leaderboard(by, limit).await {
    Ok(scores) => Json(LeaderboardResponse { scores }).into_response(),
    Err(error) => {
      tracing::warn!(?error, "leaderboard query failed");
      error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to load leaderboard")
    }
  }
}
