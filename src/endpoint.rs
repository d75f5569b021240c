//! Remote endpoint description
//!
//! A [`RemoteEndpoint`] is the protocol/host/port triple requests are sent
//! to. By default it points at the public TheTVDB API, but it can be
//! redirected to a proxy (or a local mock server) through the builder.

use crate::error::{ApiError, Result};
use reqwest::Url;

/// Protocol used by the public API
pub const DEFAULT_PROTOCOL: &str = "https";

/// Host of the public API
pub const DEFAULT_HOST: &str = "api.thetvdb.com";

/// Port of the public API
pub const DEFAULT_PORT: u32 = 443;

/// Protocols a remote endpoint may use
const SUPPORTED_PROTOCOLS: &[&str] = &["http", "https"];

/// Immutable protocol/host/port triple identifying where requests go
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEndpoint {
    protocol: String,
    host: String,
    port: u16,
}

impl RemoteEndpoint {
    /// Creates a builder with all fields unset
    pub fn builder() -> RemoteEndpointBuilder {
        RemoteEndpointBuilder::default()
    }

    /// The protocol, either `http` or `https`
    pub fn protocol(&self) -> &str {
        &self.protocol
    }

    /// The remote host name
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The remote port
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Builds the full request URI for a resource path
    ///
    /// # Arguments
    ///
    /// * `path` - Resource path, e.g. `/series/80379`. A missing leading slash is added.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::MalformedEndpoint` if the endpoint and path do not
    /// form a valid URI.
    pub fn for_resource(&self, path: &str) -> Result<Url> {
        self.for_resource_with_query(path, &[])
    }

    /// Builds the full request URI for a resource path with query parameters
    ///
    /// # Errors
    ///
    /// Returns `ApiError::MalformedEndpoint` if the endpoint and path do not
    /// form a valid URI.
    pub fn for_resource_with_query(&self, path: &str, query: &[(String, String)]) -> Result<Url> {
        let separator = if path.starts_with('/') { "" } else { "/" };
        let raw = format!(
            "{}://{}:{}{}{}",
            self.protocol, self.host, self.port, separator, path
        );

        let mut url = Url::parse(&raw)
            .map_err(|e| ApiError::MalformedEndpoint(format!("{}: {}", raw, e)))?;

        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }

        Ok(url)
    }
}

impl Default for RemoteEndpoint {
    fn default() -> Self {
        Self {
            protocol: DEFAULT_PROTOCOL.to_string(),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT as u16,
        }
    }
}

/// Builder accepting partial overrides of the default endpoint
#[derive(Debug, Default, Clone)]
pub struct RemoteEndpointBuilder {
    protocol: Option<String>,
    host: Option<String>,
    port: Option<u32>,
}

impl RemoteEndpointBuilder {
    /// Sets the protocol (`http` or `https`)
    #[must_use]
    pub fn protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = Some(protocol.into());
        self
    }

    /// Sets the host name
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Sets the port (1-65535)
    #[must_use]
    pub fn port(mut self, port: u32) -> Self {
        self.port = Some(port);
        self
    }

    /// Builds the endpoint, defaulting unset fields to the public API values
    ///
    /// # Errors
    ///
    /// Returns `ApiError::MalformedEndpoint` for an unrecognized protocol,
    /// a host that is not a valid URI host (IPv6 addresses need brackets)
    /// or a port outside of 1-65535.
    pub fn build(self) -> Result<RemoteEndpoint> {
        let protocol = self
            .protocol
            .unwrap_or_else(|| DEFAULT_PROTOCOL.to_string())
            .to_lowercase();
        if !SUPPORTED_PROTOCOLS.contains(&protocol.as_str()) {
            return Err(ApiError::MalformedEndpoint(format!(
                "unsupported protocol '{}', expected one of: {}",
                protocol,
                SUPPORTED_PROTOCOLS.join(", ")
            )));
        }

        let host = self.host.unwrap_or_else(|| DEFAULT_HOST.to_string());
        if host.trim().is_empty() {
            return Err(ApiError::MalformedEndpoint("host must not be empty".to_string()));
        }

        let port = self.port.unwrap_or(DEFAULT_PORT);
        let port = u16::try_from(port)
            .ok()
            .filter(|p| *p != 0)
            .ok_or_else(|| {
                ApiError::MalformedEndpoint(format!("port {} is out of range (1-65535)", port))
            })?;

        // The triple has to survive a round trip through a parsed authority,
        // otherwise a host like "a/b" would leak into the path
        let authority = format!("{}://{}:{}/", protocol, host, port);
        let parsed = Url::parse(&authority)
            .map_err(|e| ApiError::MalformedEndpoint(format!("{}: {}", authority, e)))?;
        let host_matches = parsed
            .host_str()
            .is_some_and(|parsed_host| parsed_host.eq_ignore_ascii_case(&host));
        if !host_matches || parsed.port_or_known_default() != Some(port) {
            return Err(ApiError::MalformedEndpoint(format!(
                "'{}:{}' is not a valid host:port authority",
                host, port
            )));
        }

        Ok(RemoteEndpoint {
            protocol,
            host,
            port,
        })
    }
}
