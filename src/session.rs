//! Authentication state of a single connection
//!
//! The [`Session`] holds the credentials used to log in, the bearer token
//! handed out by the remote API and the preferred response language. Its
//! [`Status`] tracks where the session stands in the authorization cycle.

use crate::error::{ApiError, Result};

/// Language used for responses unless configured otherwise
pub const DEFAULT_LANGUAGE: &str = "en";

/// Authorization status of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Status {
    /// No trusted token is available
    #[default]
    NotAuthorized,
    /// A login exchange is currently running
    AuthorizationInProgress,
    /// A token obtained from a successful login is installed
    Authorized,
}

/// Mutable authentication state owned by exactly one connection
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    api_key: String,
    user_key: Option<String>,
    user_name: Option<String>,
    token: Option<String>,
    language: String,
    status: Status,
}

impl Session {
    /// Creates a session authenticating with the API key only
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidArgument` if the API key is empty.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(ApiError::InvalidArgument(
                "API key must not be empty".to_string(),
            ));
        }

        Ok(Self {
            api_key,
            user_key: None,
            user_name: None,
            token: None,
            language: DEFAULT_LANGUAGE.to_string(),
            status: Status::NotAuthorized,
        })
    }

    /// Creates a session that also authenticates a user, granting access to
    /// the user scoped routes
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidArgument` if the API key is empty.
    pub fn with_user(
        api_key: impl Into<String>,
        user_key: impl Into<String>,
        user_name: impl Into<String>,
    ) -> Result<Self> {
        let mut session = Self::new(api_key)?;
        session.user_key = Some(user_key.into());
        session.user_name = Some(user_name.into());
        Ok(session)
    }

    /// Installs a bearer token and marks the session as authorized
    ///
    /// The token has to consist of three non-empty, dot separated segments.
    /// An invalid token leaves the session untouched.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidToken` if the token is empty or malformed.
    pub fn set_token(&mut self, token: impl Into<String>) -> Result<()> {
        let token = token.into();
        validate_token(&token)?;

        self.token = Some(token);
        self.status = Status::Authorized;
        Ok(())
    }

    /// Sets the preferred response language
    ///
    /// The code is not validated locally; the remote API rejects unknown
    /// languages at request time.
    pub fn set_language(&mut self, language: impl Into<String>) {
        self.language = language.into();
    }

    /// Sets the authorization status, `None` resets it to `NotAuthorized`
    ///
    /// The token is kept, but it is not used again until the session is
    /// authorized anew.
    pub fn set_status(&mut self, status: Option<Status>) {
        self.status = status.unwrap_or_default();
    }

    /// Returns true if requests may carry the current token
    pub fn is_initialized(&self) -> bool {
        self.status == Status::Authorized
    }

    /// Returns true if both user key and user name are present and non-empty
    pub fn user_authentication(&self) -> bool {
        fn present(value: &Option<String>) -> bool {
            value.as_deref().is_some_and(|v| !v.is_empty())
        }

        present(&self.user_key) && present(&self.user_name)
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn user_key(&self) -> Option<&str> {
        self.user_key.as_deref()
    }

    pub fn user_name(&self) -> Option<&str> {
        self.user_name.as_deref()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn status(&self) -> Status {
        self.status
    }
}

// Credentials and tokens never end up in log output
impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("user_name", &self.user_name)
            .field("has_token", &self.token.is_some())
            .field("language", &self.language)
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

/// Checks that a token has the three segment `header.payload.signature` shape
fn validate_token(token: &str) -> Result<()> {
    if token.is_empty() {
        return Err(ApiError::InvalidToken("token must not be empty".to_string()));
    }

    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 || segments.iter().any(|s| s.is_empty()) {
        return Err(ApiError::InvalidToken(format!(
            "expected three non-empty dot separated segments, found {}",
            segments.len()
        )));
    }

    Ok(())
}
