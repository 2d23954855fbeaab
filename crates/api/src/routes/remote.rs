//! Route definitions for remote site federation.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::remote;
use crate::state::AppState;

/// Remote routes mounted at `/remote`.
///
/// ```text
/// GET    /get/{secret}          -> get_remote_data
/// GET    /sites                 -> list_sites
/// POST   /sites                 -> create_site
/// GET    /sites/{uuid}          -> get_site
/// DELETE /sites/{uuid}          -> delete_site
/// PUT    /sites/{uuid}/access   -> set_site_access
/// POST   /sites/{uuid}/sync     -> sync_site
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/get/{secret}", get(remote::get_remote_data))
        .route("/sites", get(remote::list_sites).post(remote::create_site))
        .route(
            "/sites/{uuid}",
            get(remote::get_site).delete(remote::delete_site),
        )
        .route("/sites/{uuid}/access", put(remote::set_site_access))
        .route("/sites/{uuid}/sync", post(remote::sync_site))
}
