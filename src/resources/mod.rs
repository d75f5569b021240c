/// Typed routes of TheTVDB API.
///
/// Every route is a thin wrapper that builds an [`ApiRequest`], sends it
/// through the [`Connection`] and maps the `data` member of the response
/// envelope onto a typed structure.
mod types;

pub use types::{
    Envelope, Episode, Favorites, JsonErrors, Language, Links, Series, SeriesSearchResult,
    Updated, User,
};

use crate::connection::Connection;
use crate::error::{ApiError, Result};
use crate::request::ApiRequest;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Route level client for TheTVDB API
#[derive(Debug)]
pub struct TheTvDb {
    connection: Connection,
}

impl TheTvDb {
    /// Creates a client on top of an existing connection
    pub fn new(connection: Connection) -> Self {
        Self { connection }
    }

    /// The underlying connection, for raw requests and session control
    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    /// Logs in right away instead of waiting for the first rejected request
    ///
    /// # Errors
    ///
    /// Returns an error if the login exchange fails.
    pub fn login(&self) -> Result<()> {
        self.connection.authorize()
    }

    /// Replaces the current token with a fresh one
    ///
    /// # Errors
    ///
    /// Returns an error if the refresh exchange fails.
    pub fn refresh_token(&self) -> Result<()> {
        self.connection.refresh_token()
    }

    /// Fetches a series by id
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` for an unknown id, or any request error.
    pub fn series(&self, series_id: u64) -> Result<Series> {
        self.data(ApiRequest::get(format!("/series/{}", series_id)))
    }

    /// Fetches only the response headers of a series, e.g. `last-modified`
    ///
    /// # Errors
    ///
    /// Returns any request error.
    pub fn series_head(&self, series_id: u64) -> Result<Value> {
        self.connection
            .send(ApiRequest::head(format!("/series/{}", series_id)))
    }

    /// Fetches one page (100 entries) of a series' episodes
    ///
    /// The returned envelope carries the pagination links.
    ///
    /// # Errors
    ///
    /// Returns any request or deserialization error.
    pub fn series_episodes(&self, series_id: u64, page: u32) -> Result<Envelope<Vec<Episode>>> {
        self.envelope(
            ApiRequest::get(format!("/series/{}/episodes", series_id)).with_query("page", page),
        )
    }

    /// Fetches a single episode by id
    ///
    /// # Errors
    ///
    /// Returns any request or deserialization error.
    pub fn episode(&self, episode_id: u64) -> Result<Episode> {
        self.data(ApiRequest::get(format!("/episodes/{}", episode_id)))
    }

    /// Searches series by name
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if nothing matched, or any request error.
    pub fn search_series(&self, name: &str) -> Result<Vec<SeriesSearchResult>> {
        self.data(ApiRequest::get("/search/series").with_query("name", name))
    }

    /// Lists all languages the remote API supports
    ///
    /// # Errors
    ///
    /// Returns any request or deserialization error.
    pub fn languages(&self) -> Result<Vec<Language>> {
        self.data(ApiRequest::get("/languages"))
    }

    /// Lists series updated between `from_time` and `to_time` (Unix epoch seconds)
    ///
    /// # Errors
    ///
    /// Returns any request or deserialization error.
    pub fn updated(&self, from_time: i64, to_time: Option<i64>) -> Result<Vec<Updated>> {
        let mut request = ApiRequest::get("/updated/query").with_query("fromTime", from_time);
        if let Some(to_time) = to_time {
            request = request.with_query("toTime", to_time);
        }

        // No updates in the time frame come back as `"data": null`
        let updated: Option<Vec<Updated>> = self.data(request)?;
        Ok(updated.unwrap_or_default())
    }

    /// Fetches the settings of the authenticated user
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidArgument` without user credentials, or any request error.
    pub fn user(&self) -> Result<User> {
        self.require_user_authentication()?;
        self.data(ApiRequest::get("/user"))
    }

    /// Lists the favorite series of the authenticated user
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidArgument` without user credentials, or any request error.
    pub fn user_favorites(&self) -> Result<Vec<String>> {
        self.require_user_authentication()?;
        let favorites: Favorites = self.data(ApiRequest::get("/user/favorites"))?;
        Ok(favorites.favorites)
    }

    /// Adds a series to the user's favorites and returns the updated list
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Conflict` if the series is already a favorite, or any request error.
    pub fn add_favorite(&self, series_id: u64) -> Result<Vec<String>> {
        self.require_user_authentication()?;
        let favorites: Favorites =
            self.data(ApiRequest::put(format!("/user/favorites/{}", series_id)))?;
        Ok(favorites.favorites)
    }

    /// Removes a series from the user's favorites and returns the updated list
    ///
    /// # Errors
    ///
    /// Returns any request error.
    pub fn remove_favorite(&self, series_id: u64) -> Result<Vec<String>> {
        self.require_user_authentication()?;
        let favorites: Favorites =
            self.data(ApiRequest::delete(format!("/user/favorites/{}", series_id)))?;
        Ok(favorites.favorites)
    }

    fn require_user_authentication(&self) -> Result<()> {
        if self.connection.user_authentication() {
            Ok(())
        } else {
            Err(ApiError::InvalidArgument(
                "user scoped routes require a user key and user name".to_string(),
            ))
        }
    }

    fn data<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T> {
        Ok(self.envelope(request)?.data)
    }

    fn envelope<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<Envelope<T>> {
        let path = request.path().to_string();
        let envelope: Envelope<T> = serde_json::from_value(self.connection.send(request)?)?;

        if let Some(errors) = &envelope.errors {
            tracing::warn!(path = %path, ?errors, "API reported soft errors");
        }

        Ok(envelope)
    }
}
