//! Single HTTP round trips against the remote API
//!
//! An [`ApiRequest`] is a small per-call value (verb, resource path, optional
//! payload and query parameters). [`execute`] turns it into exactly one HTTP
//! request, decorated with the headers the remote API expects and the
//! authorization of the bound session, and maps the outcome onto either a
//! JSON value or a typed [`ApiError`].
mod response;

pub use response::{error_message, synthesize_header_json};

use crate::endpoint::RemoteEndpoint;
use crate::error::{ApiError, Result};
use crate::session::Session;
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE, USER_AGENT};
use serde_json::Value;
use std::fmt;

/// Content type sent with every request
pub const CONTENT_TYPE_JSON: &str = "application/json; charset=utf-8";

/// Accept header pinning the remote API version
pub const ACCEPT_API_VERSION: &str = "application/json, application/vnd.thetvdb.v3.0.0";

/// User agent sent with every request
pub const USER_AGENT_VALUE: &str = concat!("tvdb_client/", env!("CARGO_PKG_VERSION"));

/// HTTP verbs supported by the remote API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Head,
    Put,
    Delete,
}

impl HttpMethod {
    /// The verb as it appears on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Head => "HEAD",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for HttpMethod {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "HEAD" => Ok(HttpMethod::Head),
            "PUT" => Ok(HttpMethod::Put),
            "DELETE" => Ok(HttpMethod::Delete),
            other => Err(ApiError::InvalidArgument(format!(
                "unsupported HTTP method '{}'",
                other
            ))),
        }
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Head => reqwest::Method::HEAD,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

/// A single request against a resource path
///
/// Constructed fresh for every call and discarded once the response has
/// been handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    method: HttpMethod,
    path: String,
    payload: Option<String>,
    query: Vec<(String, String)>,
}

impl ApiRequest {
    fn new(method: HttpMethod, path: impl Into<String>, payload: Option<String>) -> Self {
        Self {
            method,
            path: path.into(),
            payload,
            query: Vec::new(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path, None)
    }

    pub fn head(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Head, path, None)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Put, path, None)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, path, None)
    }

    /// Creates a POST request; the payload is written to the request body
    pub fn post(path: impl Into<String>, payload: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, path, Some(payload.into()))
    }

    /// Creates a request from a verb name and an optional payload
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidArgument` for an unknown verb.
    pub fn from_parts(method: &str, path: impl Into<String>, payload: Option<String>) -> Result<Self> {
        Ok(Self::new(method.parse()?, path, payload))
    }

    /// Appends a query parameter
    #[must_use]
    pub fn with_query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn payload(&self) -> Option<&str> {
        self.payload.as_deref()
    }

    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    /// Checks the preconditions that must hold before any network I/O
    fn validate(&self) -> Result<()> {
        if self.path.trim().is_empty() {
            return Err(ApiError::InvalidArgument(
                "resource path must not be empty".to_string(),
            ));
        }

        if self.method == HttpMethod::Post
            && self.payload.as_deref().is_none_or(|p| p.is_empty())
        {
            return Err(ApiError::InvalidArgument(
                "POST requests require a non-empty payload".to_string(),
            ));
        }

        Ok(())
    }
}

/// Performs one HTTP round trip for the given request
///
/// Authorization and language headers are only attached while the session
/// is initialized. The response body of a HEAD request is replaced by a JSON
/// object built from the response headers.
///
/// # Errors
///
/// Fails with `ApiError::InvalidArgument` before any I/O if the request
/// violates its preconditions, with `ApiError::Communication` on transport
/// failures and with the matching status error for any non-200 response.
pub(crate) fn execute(
    client: &Client,
    endpoint: &RemoteEndpoint,
    session: &Session,
    request: &ApiRequest,
) -> Result<Value> {
    request.validate()?;

    let method = request.method;
    let url = endpoint.for_resource_with_query(&request.path, &request.query)?;

    let mut builder = client
        .request(method.into(), url.clone())
        .header(CONTENT_TYPE, CONTENT_TYPE_JSON)
        .header(ACCEPT, ACCEPT_API_VERSION)
        .header(USER_AGENT, USER_AGENT_VALUE);

    if let Some(token) = session.token().filter(|_| session.is_initialized()) {
        builder = builder
            .bearer_auth(token)
            .header(ACCEPT_LANGUAGE, session.language());
    }

    if let Some(payload) = &request.payload {
        builder = builder.body(payload.clone());
    }

    let response = builder
        .send()
        .map_err(|source| ApiError::Communication { method, source })?;

    tracing::debug!(
        method = %method,
        url = %url,
        status = response.status().as_u16(),
        "API round trip"
    );

    response::map_response(method, response)
}
