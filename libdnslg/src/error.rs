use std::{io, net::SocketAddr, path::PathBuf};
use thiserror::Error;

/// Errors that stop a run before any endpoint is probed.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("Cannot read {}: {source}", .path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Cannot parse {}: {source}", .path.display())]
    ParseFile {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("Cannot read the resolver configuration: {0}")]
    ResolverConfig(String),
    #[error("No name server in the resolver configuration")]
    NoNameServer,
    #[error("Cannot get info for {name} from {server}: {reason}")]
    Exchange {
        name: String,
        server: SocketAddr,
        reason: String,
    },
    #[error("Bad answer from the resolver: {0}")]
    ResponseCode(String),
    #[error("Zero answer for {0}")]
    NoAnswer(String),
    #[error("No TXT record in the answer for {0}")]
    NoEndpoints(String),
    #[error("Cannot build the HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}
