//! Parsing of the `host:port` connection endpoint.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use crate::{AppError, Result};

/// Immutable address of the control server.
///
/// Parsed once from a `host:port` string. The string must contain exactly one
/// colon; IPv6 literals are therefore not accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    host: String,
    port: u16,
}

impl Endpoint {
    /// Parse an endpoint from `host:port`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Endpoint`] when the string does not split into
    /// exactly two colon-delimited segments, the host is empty, or the port is
    /// not a valid `u16`.
    pub fn parse(raw: &str) -> Result<Self> {
        let mut parts = raw.split(':');
        let (Some(host), Some(port), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(AppError::Endpoint(format!(
                "expected `host:port`, got `{raw}`"
            )));
        };

        if host.is_empty() {
            return Err(AppError::Endpoint(format!("missing host in `{raw}`")));
        }

        let port = port
            .parse::<u16>()
            .map_err(|err| AppError::Endpoint(format!("invalid port in `{raw}`: {err}")))?;

        Ok(Self {
            host: host.to_owned(),
            port,
        })
    }

    /// Host name or address.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// TCP port.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }
}

impl FromStr for Endpoint {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Display for Endpoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}
