//! Connection to the remote API
//!
//! The [`Connection`] is the single entry point every route goes through.
//! It binds requests to its [`Session`] and [`RemoteEndpoint`], retries
//! requests that were rejected with HTTP 401 after re-authorizing the
//! session, and serializes all calls so that session updates never race.

use crate::authentication;
use crate::endpoint::RemoteEndpoint;
use crate::error::{ApiError, Result};
use crate::request::{self, ApiRequest};
use crate::session::{Session, Status};
use reqwest::blocking::Client;
use serde_json::Value;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Number of attempts a request gets before giving up on repeated HTTP 401
pub const MAX_AUTHENTICATION_RETRY_COUNT: u32 = 3;

/// Connect and read timeout of the underlying HTTP client
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Authorized connection to the remote API
///
/// A connection owns its session exclusively. Concurrent calls on the same
/// connection are serialized, calls on different connections are fully
/// independent.
#[derive(Debug)]
pub struct Connection {
    client: Client,
    endpoint: RemoteEndpoint,
    session: Mutex<Session>,
}

impl Connection {
    /// Creates a connection to the public API authenticating with the API key only
    ///
    /// # Errors
    ///
    /// Returns an error if the API key is empty or the HTTP client cannot be built.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::builder().api_key(api_key).build()
    }

    /// Creates a new builder
    pub fn builder() -> ConnectionBuilder {
        ConnectionBuilder::default()
    }

    /// Sends a request and returns the parsed JSON response
    ///
    /// A request rejected with HTTP 401 re-authorizes the session and is sent
    /// again, up to [`MAX_AUTHENTICATION_RETRY_COUNT`] attempts in total.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::MaxRetriesExceeded` once every attempt was rejected,
    /// `ApiError::AuthorizationFailed` if the session could not be authorized,
    /// and any other error of the request itself unchanged.
    pub fn send(&self, request: ApiRequest) -> Result<Value> {
        let mut session = self.lock_session();
        self.send_with_session(&mut session, &request)
    }

    /// Authorizes the session right away instead of on the first HTTP 401
    ///
    /// # Errors
    ///
    /// Returns an error if the login exchange fails.
    pub fn authorize(&self) -> Result<()> {
        let mut session = self.lock_session();
        self.authorize_session(&mut session)
    }

    /// Exchanges the current token for a fresh one
    ///
    /// # Errors
    ///
    /// Returns an error if the refresh exchange fails or yields an invalid token.
    pub fn refresh_token(&self) -> Result<()> {
        let mut session = self.lock_session();
        let response = self.send_with_session(&mut session, &authentication::refresh_request())?;
        session.set_token(authentication::token_from_response(response)?)?;
        tracing::info!("Session token refreshed");
        Ok(())
    }

    /// Installs a bearer token, e.g. one persisted from an earlier run
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidToken` if the token is malformed.
    pub fn set_token(&self, token: impl Into<String>) -> Result<()> {
        self.lock_session().set_token(token)
    }

    pub fn set_status(&self, status: Option<Status>) {
        self.lock_session().set_status(status);
    }

    pub fn set_language(&self, language: impl Into<String>) {
        self.lock_session().set_language(language);
    }

    /// Returns true if the session carries complete user credentials
    pub fn user_authentication(&self) -> bool {
        self.lock_session().user_authentication()
    }

    pub fn api_key(&self) -> String {
        self.lock_session().api_key().to_string()
    }

    pub fn user_key(&self) -> Option<String> {
        self.lock_session().user_key().map(str::to_string)
    }

    pub fn user_name(&self) -> Option<String> {
        self.lock_session().user_name().map(str::to_string)
    }

    pub fn token(&self) -> Option<String> {
        self.lock_session().token().map(str::to_string)
    }

    pub fn language(&self) -> String {
        self.lock_session().language().to_string()
    }

    pub fn status(&self) -> Status {
        self.lock_session().status()
    }

    pub fn endpoint(&self) -> &RemoteEndpoint {
        &self.endpoint
    }

    fn lock_session(&self) -> MutexGuard<'_, Session> {
        // A panic while holding the lock cannot leave the session half-updated,
        // every mutation is a single assignment
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Retry loop shared by regular requests and the login exchange
    fn send_with_session(&self, session: &mut Session, request: &ApiRequest) -> Result<Value> {
        for attempt in 1..=MAX_AUTHENTICATION_RETRY_COUNT {
            match request::execute(&self.client, &self.endpoint, session, request) {
                Err(error) if error.is_not_authorized() => {
                    tracing::warn!(
                        attempt,
                        max_attempts = MAX_AUTHENTICATION_RETRY_COUNT,
                        method = %request.method(),
                        path = request.path(),
                        "Request not authorized, re-authorizing session"
                    );
                    self.authorize_session(session)?;
                }
                result => return result,
            }
        }

        Err(ApiError::MaxRetriesExceeded {
            retries: MAX_AUTHENTICATION_RETRY_COUNT,
        })
    }

    /// Runs the login exchange, guarded against nested authorization attempts
    ///
    /// The login request itself goes through the retry loop. If it is
    /// rejected, the loop lands back here while the status is still
    /// `AuthorizationInProgress` and the whole call fails instead of
    /// retrying forever.
    fn authorize_session(&self, session: &mut Session) -> Result<()> {
        if session.status() == Status::AuthorizationInProgress {
            session.set_status(Some(Status::NotAuthorized));
            tracing::error!("Session authorization failed, check API key and login credentials");
            return Err(ApiError::AuthorizationFailed);
        }

        session.set_status(Some(Status::AuthorizationInProgress));
        let result = self.login(session);

        if result.is_err() && session.status() == Status::AuthorizationInProgress {
            session.set_status(Some(Status::NotAuthorized));
        }

        result
    }

    fn login(&self, session: &mut Session) -> Result<()> {
        let request = authentication::login_request(session)?;
        let response = self.send_with_session(session, &request)?;
        session.set_token(authentication::token_from_response(response)?)?;

        tracing::info!(
            user_authentication = session.user_authentication(),
            "Session authorized"
        );
        Ok(())
    }
}

/// Builder for [`Connection`]
#[derive(Debug, Default)]
pub struct ConnectionBuilder {
    api_key: Option<String>,
    user_credentials: Option<(String, String)>,
    endpoint: Option<RemoteEndpoint>,
    language: Option<String>,
    timeout: Option<Duration>,
}

impl ConnectionBuilder {
    /// Sets the API key (required)
    #[must_use]
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Sets user key and user name for the user scoped routes
    #[must_use]
    pub fn user_credentials(
        mut self,
        user_key: impl Into<String>,
        user_name: impl Into<String>,
    ) -> Self {
        self.user_credentials = Some((user_key.into(), user_name.into()));
        self
    }

    /// Redirects requests to another endpoint, e.g. a proxy
    #[must_use]
    pub fn endpoint(mut self, endpoint: RemoteEndpoint) -> Self {
        self.endpoint = Some(endpoint);
        self
    }

    /// Sets the preferred response language (default: `en`)
    #[must_use]
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Sets the connect and read timeout (default: 30 seconds)
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Builds the connection
    ///
    /// # Errors
    ///
    /// - `api_key` is not set or empty.
    /// - The HTTP client cannot be built.
    pub fn build(self) -> Result<Connection> {
        let api_key = self
            .api_key
            .ok_or_else(|| ApiError::InvalidArgument("api_key is required".to_string()))?;

        let mut session = match self.user_credentials {
            Some((user_key, user_name)) => Session::with_user(api_key, user_key, user_name)?,
            None => Session::new(api_key)?,
        };
        if let Some(language) = self.language {
            session.set_language(language);
        }

        let timeout = self.timeout.unwrap_or(DEFAULT_TIMEOUT);
        let client = Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
            .map_err(ApiError::HttpClient)?;

        Ok(Connection {
            client,
            endpoint: self.endpoint.unwrap_or_default(),
            session: Mutex::new(session),
        })
    }
}
