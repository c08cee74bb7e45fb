use axum::{Router, routing::get};

pub mod invoices;
pub mod system;

/// Router for all authenticated endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .nest("/invoices", invoices::router())
}
