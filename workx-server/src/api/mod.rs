//! HTTP API.
//!
//! Everything under `/api/v1` is called by the form bot and the admin
//! panel and requires a signed body.

pub mod events;
pub mod extractors;

use crate::state::AppState;
use axum::Router;

/// Build the `/api/v1` router.
pub fn router() -> Router<AppState> {
    Router::new().merge(events::router())
}
