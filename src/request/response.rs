//! Mapping of HTTP responses onto JSON values and typed errors

use super::HttpMethod;
use crate::error::{ApiError, Result};
use reqwest::StatusCode;
use reqwest::blocking::Response;
use serde_json::{Map, Value};

/// Maps a received response onto its JSON result or a status error
pub(super) fn map_response(method: HttpMethod, response: Response) -> Result<Value> {
    let status = response.status();

    if status == StatusCode::OK {
        if method == HttpMethod::Head {
            let headers = response.headers();
            return Ok(synthesize_header_json(headers.keys().map(|name| {
                let values = headers
                    .get_all(name)
                    .iter()
                    .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
                    .collect::<Vec<_>>();
                (name.as_str().to_string(), values)
            })));
        }

        let body = response
            .text()
            .map_err(|source| ApiError::Communication { method, source })?;

        // Some write operations answer with an empty body
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }

        return Ok(serde_json::from_str(&body)?);
    }

    // HEAD responses carry no body to extract a message from
    let body = match method {
        HttpMethod::Head => String::new(),
        _ => response.text().unwrap_or_default(),
    };
    let message = error_message(&body);

    Err(match status {
        StatusCode::UNAUTHORIZED => ApiError::NotAuthorized { message },
        StatusCode::NOT_FOUND => ApiError::NotFound { message },
        StatusCode::CONFLICT => ApiError::Conflict { message },
        StatusCode::SERVICE_UNAVAILABLE => ApiError::ServiceUnavailable,
        other => ApiError::UnexpectedResponse {
            status: other.as_u16(),
            message,
        },
    })
}

/// Extracts the remote error message from an error response body
///
/// The remote API reports failures as `{"Error": "..."}`. Anything else,
/// including a body that is not JSON at all, yields an empty message.
pub fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|json| json.get("Error").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_default()
}

/// Builds a JSON object from response headers
///
/// Each header name becomes a key. A header without values maps to `null`,
/// a single value to a string and multiple values to an array of strings.
pub fn synthesize_header_json<I, N>(headers: I) -> Value
where
    I: IntoIterator<Item = (N, Vec<String>)>,
    N: Into<String>,
{
    let mut object = Map::new();

    for (name, mut values) in headers {
        let value = match values.len() {
            0 => Value::Null,
            1 => Value::String(values.remove(0)),
            _ => Value::Array(values.into_iter().map(Value::String).collect()),
        };
        object.insert(name.into(), value);
    }

    Value::Object(object)
}
