use axum::http::StatusCode;

/// Liveness probe: 200 with empty body, for any method.
///
/// Registered as a real route so it is resolved before the submission
/// handler's method and route checks ever run.
pub async fn health_check() -> StatusCode {
    StatusCode::OK
}
