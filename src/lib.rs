//! tvdb_client - Typed blocking client for TheTVDB REST API
//!
//! This library handles the session with the remote API: it logs in with
//! the configured API key (and optionally user credentials), attaches the
//! bearer token to every request, transparently re-authorizes once the token
//! expires and reports every failure as a typed [`ApiError`].
//!
//! # Examples
//!
//! ```no_run
//! use tvdb_client::{Connection, TheTvDb};
//!
//! let connection = Connection::builder()
//!     .api_key("YOUR_API_KEY")
//!     .language("de")
//!     .build()?;
//! let tvdb = TheTvDb::new(connection);
//!
//! for hit in tvdb.search_series("Breaking Bad")? {
//!     println!("{}: {}", hit.id, hit.series_name.unwrap_or_default());
//! }
//! # Ok::<(), tvdb_client::ApiError>(())
//! ```
//!
//! Requests for routes without a typed wrapper can be sent through the
//! connection directly:
//!
//! ```no_run
//! use tvdb_client::{ApiRequest, Connection};
//!
//! let connection = Connection::new("YOUR_API_KEY")?;
//! let actors = connection.send(ApiRequest::get("/series/81189/actors"))?;
//! println!("{}", actors);
//! # Ok::<(), tvdb_client::ApiError>(())
//! ```

mod authentication;
mod connection;
mod endpoint;
mod error;
mod request;
mod resources;
mod session;
mod token_store;

pub use authentication::{LOGIN_PATH, REFRESH_TOKEN_PATH};
pub use connection::{Connection, ConnectionBuilder, MAX_AUTHENTICATION_RETRY_COUNT};
pub use endpoint::{DEFAULT_HOST, DEFAULT_PORT, DEFAULT_PROTOCOL, RemoteEndpoint, RemoteEndpointBuilder};
pub use error::{ApiError, Result};
pub use request::{
    ACCEPT_API_VERSION, ApiRequest, CONTENT_TYPE_JSON, HttpMethod, USER_AGENT_VALUE,
    error_message, synthesize_header_json,
};
pub use session::{DEFAULT_LANGUAGE, Session, Status};
pub use token_store::{TokenStore, TokenStoreError};

// Re-export the route layer
pub use resources::{
    Envelope, Episode, Favorites, JsonErrors, Language, Links, Series, SeriesSearchResult,
    TheTvDb, Updated, User,
};
