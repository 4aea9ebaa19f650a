use crate::{error::SetupError, types::Endpoint};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, warn};

/// One entry of the instance database (`dns-lg.yaml`).
#[derive(Debug, Clone, Deserialize)]
pub struct InstanceRecord {
    #[serde(rename = "endpoint", alias = "Endpoint", default)]
    pub endpoint: Option<String>,
    #[serde(rename = "contact", alias = "Contact", default)]
    pub contact: Option<String>,
    #[serde(rename = "status", alias = "Status", default)]
    pub status: Option<String>,
}

pub fn parse_endpoints(path: &Path, content: &str) -> Result<Vec<Endpoint>, SetupError> {
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }
    let records: Option<Vec<InstanceRecord>> =
        serde_yaml::from_str(content).map_err(|source| SetupError::ParseFile {
            path: path.to_path_buf(),
            source,
        })?;

    // A record without an endpoint still gets probed so it shows up as a failure.
    let endpoints: Vec<Endpoint> = records
        .unwrap_or_default()
        .into_iter()
        .enumerate()
        .map(|(index, record)| {
            let url = record.endpoint.unwrap_or_default();
            if url.trim().is_empty() {
                warn!(index, contact = ?record.contact, "record without endpoint");
            }
            Endpoint::new(url)
        })
        .collect();

    debug!(path = %path.display(), count = endpoints.len(), "loaded endpoint database");
    Ok(endpoints)
}

pub fn load_endpoint_file(path: impl AsRef<Path>) -> Result<Vec<Endpoint>, SetupError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| SetupError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    parse_endpoints(path, &content)
}
