//! Login and token refresh exchanges
//!
//! These build the requests the connection issues whenever the session has
//! to be (re-)authorized, and read the bearer token out of the answer.

use crate::error::Result;
use crate::request::ApiRequest;
use crate::session::Session;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Resource path of the login exchange
pub const LOGIN_PATH: &str = "/login";

/// Resource path of the token refresh exchange
pub const REFRESH_TOKEN_PATH: &str = "/refresh_token";

/// Body of the login request
#[derive(Debug, Serialize)]
struct Credentials<'a> {
    apikey: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    userkey: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    username: Option<&'a str>,
}

/// Answer of both the login and refresh exchanges
#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: String,
}

/// Builds the `POST /login` request for the session's credentials
///
/// User credentials are only sent when both user key and user name are set.
pub(crate) fn login_request(session: &Session) -> Result<ApiRequest> {
    let with_user = session.user_authentication();
    let credentials = Credentials {
        apikey: session.api_key(),
        userkey: session.user_key().filter(|_| with_user),
        username: session.user_name().filter(|_| with_user),
    };

    Ok(ApiRequest::post(LOGIN_PATH, serde_json::to_string(&credentials)?))
}

/// Builds the `GET /refresh_token` request
pub(crate) fn refresh_request() -> ApiRequest {
    ApiRequest::get(REFRESH_TOKEN_PATH)
}

/// Reads the bearer token out of a login or refresh response
pub(crate) fn token_from_response(response: Value) -> Result<String> {
    let TokenResponse { token } = serde_json::from_value(response)?;
    Ok(token)
}
