//! ETag headers and path parameter parsing shared by the route modules.

use std::str::FromStr;

use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use super::error::ApiError;

/// Value of the `If-Match` header.
///
/// # Errors
///
/// - `BadRequest` if the header is missing or not ASCII
pub fn if_match(headers: &HeaderMap) -> Result<String, ApiError> {
    headers
        .get(header::IF_MATCH)
        .ok_or_else(|| ApiError::bad_request("The If-Match header is required"))?
        .to_str()
        .map(str::to_owned)
        .map_err(|_| ApiError::bad_request("The If-Match header is not readable"))
}

/// JSON response carrying a strong `ETag` header.
pub fn with_etag(status: StatusCode, etag: &str, body: impl Serialize) -> Response {
    let mut response = (status, Json(body)).into_response();
    if let Ok(value) = HeaderValue::from_str(&format!("\"{}\"", etag)) {
        response.headers_mut().insert(header::ETAG, value);
    }
    response
}

/// Parses an id taken from the path or query string.
pub fn parse_id<T: FromStr>(raw: &str, what: &str) -> Result<T, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::bad_request(format!("Invalid {} id '{}'", what, raw)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::UnitId;

    #[test]
    fn missing_if_match_is_a_bad_request() {
        let err = if_match(&HeaderMap::new()).unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn if_match_is_passed_through_verbatim() {
        let mut headers = HeaderMap::new();
        headers.insert(header::IF_MATCH, HeaderValue::from_static("W/\"abc\""));
        assert_eq!(if_match(&headers).unwrap(), "W/\"abc\"");
    }

    #[test]
    fn etag_header_is_quoted() {
        let response = with_etag(StatusCode::OK, "abc", serde_json::json!({}));
        assert_eq!(response.headers()[header::ETAG], "\"abc\"");
    }

    #[test]
    fn ids_parse_or_name_the_offender() {
        let id = UnitId::new();
        assert_eq!(parse_id::<UnitId>(&id.to_string(), "unit").unwrap(), id);

        match parse_id::<UnitId>("nope", "unit") {
            Err(ApiError::BadRequest(msg)) => assert_eq!(msg, "Invalid unit id 'nope'"),
            other => panic!("unexpected {:?}", other),
        }
    }
}
