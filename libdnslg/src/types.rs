use serde::Serialize;
use std::{fmt, time::Duration};
use thiserror::Error;

/// Base URL of one looking-glass instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint(String);

impl Endpoint {
    pub fn new(url: impl Into<String>) -> Self {
        let url: String = url.into();
        Self(url.trim().trim_end_matches('/').to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Endpoint {
    fn from(url: &str) -> Self {
        Self::new(url)
    }
}

impl From<String> for Endpoint {
    fn from(url: String) -> Self {
        Self::new(url)
    }
}

/// What a probe asks each endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    /// Liveness check: the NS set of example.org.
    Health,
    /// Address lookup for `name`.
    Addresses { name: String },
}

impl Query {
    pub fn addresses(name: impl Into<String>) -> Self {
        Query::Addresses { name: name.into() }
    }

    pub fn url_for(&self, endpoint: &Endpoint) -> String {
        match self {
            Query::Health => format!("{}/example.org/NS?format=json", endpoint),
            Query::Addresses { name } => format!("{}/{}/ADDR?format=json", endpoint, name),
        }
    }

    pub fn user_agent(&self) -> &'static str {
        match self {
            Query::Health => "DNS Looking Glass Checker",
            Query::Addresses { .. } => "DNS Looking Glass Querier",
        }
    }
}

/// The part of a successful reply that gets reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Health { bytes: usize, versions: String },
    Addresses(Vec<String>),
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payload::Health { bytes, versions } => write!(f, "OK ({} bytes) {}", bytes, versions),
            Payload::Addresses(addresses) => write!(f, "[{}]", addresses.join(" ")),
        }
    }
}

/// Per-endpoint failure, in the order the phases run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeError {
    #[error("Cannot create request: {0}")]
    Request(String),
    #[error("Cannot get: {0}")]
    Transport(String),
    #[error("Cannot get: timed out: {0}")]
    Timeout(String),
    #[error("Bad status: {0}")]
    Status(String),
    #[error("Got an empty body")]
    EmptyBody,
    #[error("Cannot parse the JSON result: {0}")]
    Json(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome {
    pub endpoint: Endpoint,
    pub result: Result<Payload, ProbeError>,
}

impl ProbeOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }

    pub fn message(&self) -> String {
        match &self.result {
            Ok(payload) => payload.to_string(),
            Err(e) => e.to_string(),
        }
    }

    /// Flat view used for NDJSON output.
    pub fn record(&self) -> OutcomeRecord<'_> {
        let (bytes, versions, addresses) = match &self.result {
            Ok(Payload::Health { bytes, versions }) => (Some(*bytes), Some(versions.as_str()), None),
            Ok(Payload::Addresses(addresses)) => (None, None, Some(addresses.as_slice())),
            Err(_) => (None, None, None),
        };
        OutcomeRecord {
            endpoint: self.endpoint.as_str(),
            ok: self.is_ok(),
            message: self.message(),
            bytes,
            versions,
            addresses,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OutcomeRecord<'a> {
    pub endpoint: &'a str,
    pub ok: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bytes: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub versions: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub addresses: Option<&'a [String]>,
}

#[derive(Debug, Clone)]
pub struct ProbeConfig {
    pub connect_timeout: Duration,
    pub read_write_timeout: Duration,
}

impl ProbeConfig {
    /// Backstop for one whole request. The read/write budget itself is
    /// enforced per read by the client, so a reply that stalls longer than
    /// `read_write_timeout` fails well before this.
    pub fn request_timeout(&self) -> Duration {
        self.connect_timeout + self.read_write_timeout
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            read_write_timeout: Duration::from_secs(5),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_drops_trailing_slash() {
        let endpoint = Endpoint::new("https://dns.example.net/dns-lg/ ");
        assert_eq!(endpoint.as_str(), "https://dns.example.net/dns-lg");
    }

    #[test]
    fn query_urls() {
        let endpoint = Endpoint::from("http://lg.example");
        assert_eq!(
            Query::Health.url_for(&endpoint),
            "http://lg.example/example.org/NS?format=json"
        );
        assert_eq!(
            Query::addresses("www.ietf.org").url_for(&endpoint),
            "http://lg.example/www.ietf.org/ADDR?format=json"
        );
    }

    #[test]
    fn messages_per_phase() {
        assert_eq!(ProbeError::EmptyBody.to_string(), "Got an empty body");
        assert_eq!(
            ProbeError::Status("404 Not Found".into()).to_string(),
            "Bad status: 404 Not Found"
        );
        let ok = Payload::Health { bytes: 120, versions: "DNS-LG 2013".into() };
        assert_eq!(ok.to_string(), "OK (120 bytes) DNS-LG 2013");
        let addrs = Payload::Addresses(vec!["192.0.2.1".into(), "2001:db8::1".into()]);
        assert_eq!(addrs.to_string(), "[192.0.2.1 2001:db8::1]");
    }

    #[test]
    fn record_serializes_only_relevant_fields() {
        let outcome = ProbeOutcome {
            endpoint: Endpoint::from("http://lg.example"),
            result: Err(ProbeError::EmptyBody),
        };
        let json = serde_json::to_string(&outcome.record()).unwrap();
        assert_eq!(
            json,
            r#"{"endpoint":"http://lg.example","ok":false,"message":"Got an empty body"}"#
        );
    }
}
