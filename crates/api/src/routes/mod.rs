pub mod health;
pub mod remote;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /remote/get/{secret}                 sync document for a target site (GET)
/// /remote/sites                        list, register
/// /remote/sites/{uuid}                 get, delete
/// /remote/sites/{uuid}/access          set project access levels (PUT)
/// /remote/sites/{uuid}/sync            pull from a source site (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/remote", remote::router())
}
