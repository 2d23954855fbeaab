//! Shared response envelope types for API handlers.
//!
//! Registry endpoints respond with a `{ "data": ... }` envelope. The
//! remote-get endpoint returns the bare sync document instead, since that
//! body is the wire contract peers decode.

use serde::Serialize;

/// Standard `{ "data": T }` response envelope.
///
/// ```ignore
/// Ok(Json(DataResponse { data: sites }))
/// ```
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}
