pub mod handlers;
pub mod rate_limit;

pub use handlers::{AppGame, AppState, router};
pub use rate_limit::RateLimiterLayer;
