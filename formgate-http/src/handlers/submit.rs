use crate::server::AppState;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use formgate_core::GateError;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info};

/// The front door: every non-healthcheck request lands here.
///
/// Order per request: method check → route match → form decode → append log
/// → notify. The first failing step short-circuits with its mapped status;
/// nothing runs after an error response is chosen.
pub async fn handle_submission(
    State(state): State<Arc<AppState>>,
    method: Method,
    uri: Uri,
    body: Bytes,
) -> Response {
    match process(&state, &method, uri.path(), &body).await {
        Ok(()) => StatusCode::OK.into_response(),
        Err(e) => {
            error!(error = %e, method = %method, path = %uri.path(), "request failed");
            let status = StatusCode::from_u16(e.status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (status, e.to_string()).into_response()
        }
    }
}

async fn process(
    state: &AppState,
    method: &Method,
    path: &str,
    body: &[u8],
) -> Result<(), GateError> {
    if method != Method::POST {
        return Err(GateError::MethodNotAllowed);
    }

    let cleaned = clean_path(path);
    let route = cleaned
        .strip_prefix(state.base_path.as_str())
        .filter(|suffix| state.registry.contains(suffix))
        .map(str::to_owned)
        .ok_or_else(|| GateError::RouteNotFound(cleaned.clone()))?;

    let values = parse_form(body)?;
    info!(route = %route, fields = values.len(), "new contact submission");

    state.log.append(&route, &values).await?;
    state.notifier.notify(&state.registry, &route, &values).await?;
    Ok(())
}

/// Decode an `application/x-www-form-urlencoded` body into a flat map.
/// Multi-value fields collapse to their first entry.
fn parse_form(body: &[u8]) -> Result<HashMap<String, String>, GateError> {
    let text = std::str::from_utf8(body).map_err(|e| GateError::BadForm(e.to_string()))?;
    let mut values = HashMap::new();
    for (key, value) in url::form_urlencoded::parse(text.as_bytes()) {
        values.entry(key.into_owned()).or_insert_with(|| value.into_owned());
    }
    Ok(values)
}

/// Lexical path cleaning: collapses repeated separators and resolves `.`
/// and `..` segments, so `/base//contact/.` and `/base/contact` compare
/// equal. Never escapes above the root. Output has no trailing slash.
fn clean_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    let mut cleaned = String::from("/");
    cleaned.push_str(&segments.join("/"));
    cleaned
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── clean_path ────────────────────────────────────────────────

    #[test]
    fn clean_path_is_identity_for_clean_input() {
        assert_eq!(clean_path("/contact-notification/hello"), "/contact-notification/hello");
    }

    #[test]
    fn clean_path_collapses_duplicate_separators() {
        assert_eq!(clean_path("//a///b"), "/a/b");
    }

    #[test]
    fn clean_path_resolves_dot_segments() {
        assert_eq!(clean_path("/a/./b"), "/a/b");
        assert_eq!(clean_path("/a/c/../b"), "/a/b");
    }

    #[test]
    fn clean_path_never_escapes_root() {
        assert_eq!(clean_path("/../../a"), "/a");
        assert_eq!(clean_path("/.."), "/");
    }

    #[test]
    fn clean_path_strips_trailing_slash() {
        assert_eq!(clean_path("/a/b/"), "/a/b");
        assert_eq!(clean_path("/"), "/");
    }

    // ── parse_form ────────────────────────────────────────────────

    #[test]
    fn parse_form_decodes_pairs() {
        let values = parse_form(b"name=Alice&email=a%40x.com").unwrap();
        assert_eq!(values["name"], "Alice");
        assert_eq!(values["email"], "a@x.com");
        assert_eq!(values.len(), 2);
    }

    #[test]
    fn parse_form_keeps_first_value_of_repeated_field() {
        let values = parse_form(b"name=first&name=second").unwrap();
        assert_eq!(values["name"], "first");
    }

    #[test]
    fn parse_form_decodes_plus_as_space() {
        let values = parse_form(b"message=hello+world").unwrap();
        assert_eq!(values["message"], "hello world");
    }

    #[test]
    fn parse_form_rejects_invalid_utf8() {
        assert!(matches!(
            parse_form(&[0x80, 0x81]).unwrap_err(),
            GateError::BadForm(_)
        ));
    }

    #[test]
    fn parse_form_of_empty_body_is_empty_map() {
        assert!(parse_form(b"").unwrap().is_empty());
    }
}
