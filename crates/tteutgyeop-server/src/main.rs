use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use axum::http::HeaderName;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{Level, info, warn};
use tracing_subscriber::EnvFilter;
use tteutgyeop_engine::rank::{DEFAULT_CANDIDATE_FLOOR, DEFAULT_CANDIDATE_LIMIT, DEFAULT_TOP_K};
use tteutgyeop_engine::{EngineConfig, Game, MemoryCache, RankConfig, SimilarityScorer};
use tteutgyeop_lexicon::{LoadMode, MemoryLexicon};
use tteutgyeop_text::ConceptTable;

use tteutgyeop_server::rate_limit::{DEFAULT_CLIENT_IP_HEADER, RateLimiterLayer};
use tteutgyeop_server::{AppState, router};

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_LEXICON_PATH: &str = "data/lexicon.jsonl";
const DEFAULT_CONCEPTS_PATH: &str = "data/concepts.txt";
const DEFAULT_RATE_LIMIT_RPS: u32 = 5;
const DEFAULT_RATE_LIMIT_BURST: u32 = 20;
const DEFAULT_RATE_LIMIT_IDLE_SECS: u64 = 600;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = load_config();
    info!("binding to {}:{}", config.host, config.port);
    info!(
        "using lexicon at {} (mode: {:?})",
        config.lexicon_path.display(),
        config.lexicon_mode
    );
    if config.disable_cache {
        info!("cache headers disabled");
    }
    info!(
        "rate limit: {} req/s (burst {}) keyed on {}",
        config.rate_limit_rps, config.rate_limit_burst, config.client_ip_header
    );

    let start = Instant::now();
    let lexicon = MemoryLexicon::open(&config.lexicon_path, config.lexicon_mode)?;
    info!("lexicon loaded in {} ms", start.elapsed().as_millis());
    if lexicon.is_empty() {
        warn!("lexicon is empty; daily answers will be unavailable");
    }

    let concepts = ConceptTable::load_with_builtin(&config.concepts_path)?;
    info!(
        "concept table has {} entries (extra clusters from {})",
        concepts.len(),
        config.concepts_path.display()
    );

    let engine_config = EngineConfig {
        rank: config.rank.clone(),
        ..EngineConfig::default()
    };
    let game = Game::new(
        Arc::new(lexicon),
        Arc::new(MemoryCache::new()),
        engine_config,
    )
    .with_scorer(SimilarityScorer::new(Arc::new(concepts)));

    let state = AppState {
        game,
        disable_cache: config.disable_cache,
    };

    let rate_limiter = RateLimiterLayer::new(config.rate_limit_rps, config.rate_limit_burst)
        .with_client_header(config.client_ip_header.clone())
        .with_idle_ttl(config.rate_limit_idle);
    let app = router(state)
        .layer(rate_limiter)
        .layer(TraceLayer::new_for_http());
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("invalid listen address {}:{}", config.host, config.port))?;
    let listener = TcpListener::bind(addr).await?;

    axum::serve(listener, app).await?;
    Ok(())
}

#[derive(Debug, Clone)]
struct Config {
    host: String,
    port: u16,
    lexicon_path: PathBuf,
    lexicon_mode: LoadMode,
    concepts_path: PathBuf,
    rank: RankConfig,
    disable_cache: bool,
    rate_limit_rps: u32,
    rate_limit_burst: u32,
    rate_limit_idle: Duration,
    client_ip_header: HeaderName,
}

fn load_config() -> Config {
    let mut disable_cache = false;
    let mut cli_lexicon: Option<PathBuf> = None;
    let mut cli_lexicon_mode: Option<LoadMode> = None;
    let mut args = env::args().skip(1).peekable();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--no-cache" => disable_cache = true,
            "--lexicon" => {
                if let Some(path) = args.next() {
                    cli_lexicon = Some(PathBuf::from(path));
                }
            }
            _ => {
                if let Some(path) = arg.strip_prefix("--lexicon=") {
                    cli_lexicon = Some(PathBuf::from(path));
                } else if let Some(mode) = arg.strip_prefix("--lexicon-mode=") {
                    cli_lexicon_mode = mode.parse().ok();
                }
            }
        }
    }

    let host = env::var("HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string());
    let port = env_parse("PORT").unwrap_or(DEFAULT_PORT);
    let lexicon_path = cli_lexicon
        .or_else(|| env::var("LEXICON_PATH").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_LEXICON_PATH));
    let lexicon_mode = cli_lexicon_mode
        .or_else(|| env_parse("LEXICON_LOAD_MODE"))
        .unwrap_or_default();
    let concepts_path = env::var("CONCEPTS_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONCEPTS_PATH));

    let rank = RankConfig {
        top_k: env_positive("RANK_TOPK").unwrap_or(DEFAULT_TOP_K),
        candidate_limit: env_positive("RANK_CANDIDATE_LIMIT").unwrap_or(DEFAULT_CANDIDATE_LIMIT),
        candidate_floor: env_parse("RANK_CANDIDATE_FLOOR").unwrap_or(DEFAULT_CANDIDATE_FLOOR),
        ..RankConfig::default()
    };

    let rate_limit_rps = env_positive("RATE_LIMIT_RPS").unwrap_or(DEFAULT_RATE_LIMIT_RPS);
    let rate_limit_burst = env_positive("RATE_LIMIT_BURST").unwrap_or(DEFAULT_RATE_LIMIT_BURST);
    let rate_limit_idle = Duration::from_secs(
        env_positive("RATE_LIMIT_IDLE_SECS").unwrap_or(DEFAULT_RATE_LIMIT_IDLE_SECS),
    );
    let client_ip_header = env::var("CLIENT_IP_HEADER")
        .ok()
        .and_then(|raw| HeaderName::from_str(raw.trim()).ok())
        .unwrap_or_else(|| HeaderName::from_static(DEFAULT_CLIENT_IP_HEADER));

    Config {
        host,
        port,
        lexicon_path,
        lexicon_mode,
        concepts_path,
        rank,
        disable_cache,
        rate_limit_rps,
        rate_limit_burst,
        rate_limit_idle,
        client_ip_header,
    }
}

fn env_parse<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse::<T>().ok())
}

fn env_positive<T: FromStr + Default + PartialOrd>(name: &str) -> Option<T> {
    env_parse(name).filter(|v: &T| *v > T::default())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let max_level = env_filter
        .max_level_hint()
        .and_then(|hint| hint.into_level())
        .unwrap_or(Level::INFO);
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_level(true)
        .with_max_level(max_level)
        .init();
}
