use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use chrono::Utc;

use ledger_auth::JwtValidator;

use crate::app::errors::json_error;
use crate::context::CallerContext;

#[derive(Clone)]
pub struct AuthState {
    pub jwt: Arc<dyn JwtValidator>,
}

pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let token = match extract_bearer(req.headers()) {
        Ok(t) => t,
        Err(msg) => return unauthenticated(msg),
    };

    let claims = match state.jwt.validate(token, Utc::now()) {
        Ok(c) => c,
        Err(e) => {
            tracing::debug!(error = %e, "rejected bearer token");
            return unauthenticated(&e.to_string());
        }
    };

    req.extensions_mut().insert(CallerContext::new(claims.sub));

    next.run(req).await
}

fn unauthenticated(message: &str) -> Response {
    json_error(
        StatusCode::UNAUTHORIZED,
        "unauthenticated",
        401,
        message,
    )
}

fn extract_bearer(headers: &HeaderMap) -> Result<&str, &'static str> {
    let header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or("missing authorization header")?;

    let header = header
        .to_str()
        .map_err(|_| "authorization header is not valid ascii")?;

    let header = header
        .strip_prefix("Bearer ")
        .ok_or("expected a bearer token")?;

    let token = header.trim();
    if token.is_empty() {
        return Err("empty bearer token");
    }

    Ok(token)
}
