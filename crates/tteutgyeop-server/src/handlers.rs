use axum::extract::{Query, State};
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;
use tteutgyeop_engine::{EngineError, Game, MemoryCache};
use tteutgyeop_lexicon::MemoryLexicon;
use tteutgyeop_types::{DateKey, RankEntry};

pub type AppGame = Game<MemoryLexicon, MemoryCache>;

const NO_STORE: &str = "no-store";
const SHORT_CACHE: &str = "public, max-age=60";
const TOP_CACHE: &str = "public, max-age=300";

#[derive(Clone)]
pub struct AppState {
    pub game: AppGame,
    pub disable_cache: bool,
}

#[derive(Deserialize)]
pub struct GuessQuery {
    pub word: Option<String>,
}

#[derive(Deserialize)]
pub struct HintQuery {
    pub level: Option<u8>,
}

#[derive(Deserialize)]
pub struct TopQuery {
    pub limit: Option<usize>,
}

#[derive(Serialize)]
pub struct TopResponse {
    date_key: DateKey,
    items: Vec<RankEntry>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/meta", get(meta))
        .route("/api/guess", get(guess))
        .route("/api/hint", get(hint))
        .route("/api/giveup", post(give_up))
        .route("/api/top", get(top))
        .with_state(state)
}

async fn healthz() -> impl IntoResponse {
    "ok"
}

async fn meta(State(state): State<AppState>) -> Result<Response, ApiError> {
    let summary = state.game.meta(&DateKey::today()).await?;
    Ok(cached(&state, SHORT_CACHE, Json(summary)))
}

async fn guess(
    State(state): State<AppState>,
    Query(params): Query<GuessQuery>,
) -> Result<Response, ApiError> {
    let word = params.word.unwrap_or_default();
    if word.trim().is_empty() {
        return Err(ApiError::bad_request("word is required"));
    }
    let outcome = state.game.guess(&DateKey::today(), &word).await?;
    Ok(no_store(Json(outcome)))
}

async fn hint(
    State(state): State<AppState>,
    Query(params): Query<HintQuery>,
) -> Result<Response, ApiError> {
    let hint = state
        .game
        .hints(&DateKey::today(), params.level.unwrap_or(1))
        .await?;
    Ok(no_store(Json(hint)))
}

async fn give_up(State(state): State<AppState>) -> Result<Response, ApiError> {
    let answer = state.game.give_up(&DateKey::today()).await?;
    Ok(no_store(Json(answer)))
}

async fn top(
    State(state): State<AppState>,
    Query(params): Query<TopQuery>,
) -> Result<Response, ApiError> {
    if params.limit == Some(0) {
        return Err(ApiError::bad_request("limit must be >= 1"));
    }
    let date_key = DateKey::today();
    let items = state.game.top(&date_key, params.limit).await?;
    Ok(cached(&state, TOP_CACHE, Json(TopResponse { date_key, items })))
}

fn no_store(body: impl IntoResponse) -> Response {
    (
        [(header::CACHE_CONTROL, HeaderValue::from_static(NO_STORE))],
        body,
    )
        .into_response()
}

fn cached(state: &AppState, policy: &'static str, body: impl IntoResponse) -> Response {
    if state.disable_cache {
        return body.into_response();
    }
    (
        [(header::CACHE_CONTROL, HeaderValue::from_static(policy))],
        body,
    )
        .into_response()
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Unavailable(String),
    #[error("internal server error")]
    Internal,
}

impl ApiError {
    fn bad_request<T: Into<String>>(msg: T) -> Self {
        ApiError::BadRequest(msg.into())
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Input(msg) => ApiError::BadRequest(msg),
            EngineError::NotFound(word) => {
                ApiError::NotFound(format!("{word} is not in the dictionary"))
            }
            EngineError::DataUnavailable(msg) => {
                error!("data unavailable: {msg}");
                ApiError::Unavailable("dictionary is temporarily unavailable".into())
            }
            err @ EngineError::EligibilityExhausted { .. } => {
                error!("{err}");
                ApiError::Internal
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(ErrorResponse {
            error: self.to_string(),
        });
        (
            status,
            [(header::CACHE_CONTROL, HeaderValue::from_static(NO_STORE))],
            body,
        )
            .into_response()
    }
}
