use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

use crate::config::ApiConfig;
use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

pub use services::AppServices;

/// Build the full router: public system routes plus JWT-protected invoice routes.
pub fn build_app(config: &ApiConfig) -> Router {
    let jwt = Arc::new(ledger_auth::Hs256JwtValidator::new(config.jwt_secret.as_bytes()));
    let auth_state = middleware::AuthState { jwt };

    let services = Arc::new(AppServices::new(&config.ledger));

    // Protected routes: require a bearer token (caller identity).
    let protected = routes::router().layer(axum::middleware::from_fn_with_state(
        auth_state,
        middleware::auth_middleware,
    ));

    Router::new()
        .route("/health", get(routes::system::health))
        .route("/chain/height", get(routes::system::chain_height))
        .merge(protected)
        .layer(ServiceBuilder::new().layer(Extension(services)))
}
