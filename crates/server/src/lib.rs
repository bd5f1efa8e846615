use axum::{
    Router,
    http::{HeaderValue, Method},
    middleware::from_fn_with_state,
};
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;

use config::Config;
use state::AppState;

fn cors(config: &Config) -> CorsLayer {
    let origin = if config.is_development() {
        AllowOrigin::mirror_request()
    } else {
        let origins: Vec<HeaderValue> = config
            .origins()
            .into_iter()
            .filter_map(|o| match HeaderValue::from_str(&o) {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!(origin = %o, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

pub fn build_router(state: AppState) -> Router {
    let api = routes::router(&state).layer(from_fn_with_state(
        state.clone(),
        middleware::rate_limit::api,
    ));

    Router::new()
        .nest("/api", api)
        .layer(cors(&state.config))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
