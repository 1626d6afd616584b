//! Wait targets parsed from dependency descriptors.
//!
//! # Responsibilities
//! - Extract host and port from connection URLs (`DATABASE_URL`, `REDIS_URL`)
//! - Apply the conventional default port per scheme
//! - Recognise descriptors with no network endpoint (sqlite, unix sockets)
//! - Keep credentials out of target names, which end up in logs

use serde::Serialize;
use thiserror::Error;
use url::{Host, Url};

/// Errors produced while turning a descriptor into a wait target.
#[derive(Debug, Error)]
pub enum TargetError {
    #[error("invalid URL '{raw}': {source}")]
    InvalidUrl {
        raw: String,
        #[source]
        source: url::ParseError,
    },

    #[error("'{0}' has no host to connect to")]
    MissingHost(String),

    #[error("'{0}' needs an explicit port")]
    MissingPort(String),

    #[error("invalid port in '{0}'")]
    InvalidPort(String),

    #[error("'{0}' has no network endpoint to probe")]
    NoNetworkEndpoint(String),
}

/// How a target is probed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeKind {
    /// Ready once a TCP connection is accepted.
    Tcp,
    /// Ready once a GET returns a 2xx status.
    Http(Url),
}

/// A dependency endpoint to wait for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WaitTarget {
    /// Display name without credentials, e.g. `postgres://db:5432`.
    pub name: String,
    pub host: String,
    pub port: u16,
    #[serde(skip)]
    pub kind: ProbeKind,
}

impl WaitTarget {
    /// Plain TCP target.
    pub fn tcp(host: impl Into<String>, port: u16) -> Self {
        let host = host.into();
        Self {
            name: format!("{}:{}", display_host(&host), port),
            host,
            port,
            kind: ProbeKind::Tcp,
        }
    }

    /// Resolve a database descriptor.
    ///
    /// Returns `Ok(None)` for file-based engines and socket paths: there is
    /// nothing to connect to before the application starts. The same goes for
    /// a scheme with no known default port when the URL gives none; the
    /// application may still understand it, so it is not an error.
    pub fn from_database_url(raw: &str) -> Result<Option<Self>, TargetError> {
        Self::from_descriptor(raw)
    }

    /// Resolve a Redis (Celery broker) descriptor.
    pub fn from_redis_url(raw: &str) -> Result<Option<Self>, TargetError> {
        Self::from_descriptor(raw)
    }

    fn from_descriptor(raw: &str) -> Result<Option<Self>, TargetError> {
        match Self::from_service_url(raw) {
            Err(TargetError::MissingPort(_)) => Ok(None),
            other => other,
        }
    }

    /// Parse an explicit wait target.
    ///
    /// Accepts `host:port`, `tcp://host:port`, `http(s)://...` and service URLs
    /// with a known default port.
    pub fn parse(raw: &str) -> Result<Self, TargetError> {
        let raw = raw.trim();
        if !raw.contains("://") {
            return parse_host_port(raw);
        }

        let url = parse_url(raw)?;
        match url.scheme() {
            "http" | "https" => {
                let (host, port) = endpoint(&url, raw)?;
                Ok(Self {
                    name: format!(
                        "{}://{}:{}{}",
                        url.scheme(),
                        display_host(&host),
                        port,
                        url.path()
                    ),
                    host,
                    port,
                    kind: ProbeKind::Http(url),
                })
            }
            _ => Self::from_service_url(raw)?
                .ok_or_else(|| TargetError::NoNetworkEndpoint(raw.to_string())),
        }
    }

    /// Address suitable for `TcpStream::connect`.
    pub fn address(&self) -> (&str, u16) {
        (self.host.as_str(), self.port)
    }

    fn from_service_url(raw: &str) -> Result<Option<Self>, TargetError> {
        let raw = raw.trim();

        // sqlite://:memory: and friends are not valid authorities, so decide
        // on the scheme before handing the rest to the URL parser.
        if let Some((scheme, _)) = raw.split_once("://") {
            if is_local_scheme(&scheme.to_ascii_lowercase()) {
                return Ok(None);
            }
        }

        let url = match parse_url(raw) {
            Ok(url) => url,
            // `postgres://user@/db`: libpq falls back to the local socket.
            Err(TargetError::MissingHost(_)) => return Ok(None),
            Err(e) => return Err(e),
        };

        match url.host() {
            None => return Ok(None),
            Some(Host::Domain(d)) if d.is_empty() || is_socket_path(d) => return Ok(None),
            Some(_) => {}
        }

        let (host, port) = endpoint(&url, raw)?;
        Ok(Some(Self {
            name: format!("{}://{}:{}", url.scheme(), display_host(&host), port),
            host,
            port,
            kind: ProbeKind::Tcp,
        }))
    }
}

fn parse_url(raw: &str) -> Result<Url, TargetError> {
    Url::parse(raw).map_err(|source| match source {
        url::ParseError::InvalidPort => TargetError::InvalidPort(raw.to_string()),
        url::ParseError::EmptyHost => TargetError::MissingHost(raw.to_string()),
        source => TargetError::InvalidUrl {
            raw: raw.to_string(),
            source,
        },
    })
}

fn endpoint(url: &Url, raw: &str) -> Result<(String, u16), TargetError> {
    let host = match url.host() {
        Some(Host::Domain(d)) if !d.is_empty() => d.to_string(),
        Some(Host::Ipv4(addr)) => addr.to_string(),
        Some(Host::Ipv6(addr)) => addr.to_string(),
        _ => return Err(TargetError::MissingHost(raw.to_string())),
    };
    let port = url
        .port_or_known_default()
        .or_else(|| default_port(url.scheme()))
        .ok_or_else(|| TargetError::MissingPort(raw.to_string()))?;
    Ok((host, port))
}

fn parse_host_port(raw: &str) -> Result<WaitTarget, TargetError> {
    let (host, port) = raw
        .rsplit_once(':')
        .ok_or_else(|| TargetError::MissingPort(raw.to_string()))?;

    let host = host.trim_start_matches('[').trim_end_matches(']');
    if host.is_empty() {
        return Err(TargetError::MissingHost(raw.to_string()));
    }
    let port: u16 = port
        .parse()
        .map_err(|_| TargetError::InvalidPort(raw.to_string()))?;
    if port == 0 {
        return Err(TargetError::InvalidPort(raw.to_string()));
    }

    Ok(WaitTarget::tcp(host, port))
}

/// Conventional port for a service scheme.
pub fn default_port(scheme: &str) -> Option<u16> {
    match scheme {
        "postgres" | "postgresql" | "pgsql" | "postgis" | "psql" | "timescale"
        | "timescalegis" => Some(5432),
        "redshift" => Some(5439),
        "mysql" | "mysql2" | "mysqlgis" | "mysql-connector" | "mariadb" => Some(3306),
        "oracle" | "oraclegis" => Some(1521),
        "mssql" | "mssqlms" => Some(1433),
        "cockroach" | "cockroachdb" => Some(26257),
        "redis" | "rediss" => Some(6379),
        "amqp" => Some(5672),
        "amqps" => Some(5671),
        "memcache" | "pymemcache" => Some(11211),
        "http" => Some(80),
        "https" => Some(443),
        _ => None,
    }
}

fn is_local_scheme(scheme: &str) -> bool {
    matches!(
        scheme,
        "sqlite" | "spatialite" | "file" | "unix" | "redis+socket" | "ldapi"
    )
}

/// Percent-encoded socket directories, e.g. `postgres://%2Fvar%2Frun%2Fpostgresql/db`.
fn is_socket_path(host: &str) -> bool {
    host.len() >= 3 && host[..3].eq_ignore_ascii_case("%2F")
}

fn display_host(host: &str) -> String {
    if host.contains(':') {
        format!("[{}]", host)
    } else {
        host.to_string()
    }
}
