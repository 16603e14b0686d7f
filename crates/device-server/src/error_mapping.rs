//! Translation of HTTP outcomes into [`DirectoryError`].

use directory::DirectoryError;
use reqwest::{Response, StatusCode};
use tracing::warn;

/// Maps a failed `reqwest` call.
pub(crate) fn map_reqwest_error(operation: &str, err: reqwest::Error) -> DirectoryError {
    if err.is_decode() {
        DirectoryError::protocol(format!("{operation}: undecodable response: {err}"))
    } else if err.is_builder() {
        DirectoryError::invalid_argument(format!("{operation}: {err}"))
    } else {
        // connect, timeout, request, body and redirect failures
        DirectoryError::transport(format!("{operation}: {err}"))
    }
}

/// Maps a non-success status, given the response body text.
pub(crate) fn map_status(
    operation: &str,
    target: &str,
    status: StatusCode,
    body: &str,
) -> DirectoryError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => DirectoryError::Authentication {
            message: format!("{operation}: {status}: {body}"),
        },
        StatusCode::NOT_FOUND => DirectoryError::not_found("resource", target),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            DirectoryError::invalid_argument(format!("{operation}: {status}: {body}"))
        }
        _ => DirectoryError::protocol(format!("{operation}: unexpected status {status}: {body}")),
    }
}

/// Passes successful responses through and maps the rest.
pub(crate) async fn check_response(
    operation: &str,
    target: &str,
    resp: Response,
) -> Result<Response, DirectoryError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.text().await.unwrap_or_else(|e| {
        warn!("failed to read error body: {e}");
        String::new()
    });
    Err(map_status(operation, target, status, &body))
}
