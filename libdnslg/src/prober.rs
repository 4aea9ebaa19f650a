use crate::{
    envelope::{AddressEnvelope, HealthEnvelope},
    error::SetupError,
    http::create_http_pool,
    types::{Endpoint, Payload, ProbeConfig, ProbeError, ProbeOutcome, Query},
};
use reqwest::{
    header::{ACCEPT, USER_AGENT},
    Client, StatusCode,
};
use tokio::sync::mpsc;
use tracing::debug;

#[derive(Clone)]
pub struct Prober {
    client: Client,
    config: ProbeConfig,
}

impl Prober {
    pub fn new() -> Result<Self, SetupError> {
        Self::with_config(ProbeConfig::default())
    }

    pub fn with_config(config: ProbeConfig) -> Result<Self, SetupError> {
        let client = create_http_pool(&config)?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    pub async fn probe_one(&self, endpoint: &Endpoint, query: &Query) -> ProbeOutcome {
        let result = self.fetch(endpoint, query).await;
        if let Err(e) = &result {
            debug!(%endpoint, error = %e, "probe failed");
        }
        ProbeOutcome {
            endpoint: endpoint.clone(),
            result,
        }
    }

    async fn fetch(&self, endpoint: &Endpoint, query: &Query) -> Result<Payload, ProbeError> {
        if endpoint.as_str().is_empty() {
            return Err(ProbeError::Request("no endpoint URL".into()));
        }
        let url = query.url_for(endpoint);
        debug!(%url, "GET");

        let request = self
            .client
            .get(&url)
            .header(ACCEPT, "application/json")
            .header(USER_AGENT, query.user_agent())
            .build()
            .map_err(|e| ProbeError::Request(e.to_string()))?;

        let response = self.client.execute(request).await.map_err(transport_error)?;

        if response.status() != StatusCode::OK {
            return Err(ProbeError::Status(response.status().to_string()));
        }

        let body = response.bytes().await.map_err(transport_error)?;
        if body.is_empty() {
            return Err(ProbeError::EmptyBody);
        }

        let json_error = |e: serde_json::Error| ProbeError::Json(e.to_string());
        match query {
            Query::Health => {
                let envelope: HealthEnvelope = serde_json::from_slice(&body).map_err(json_error)?;
                Ok(Payload::Health {
                    bytes: body.len(),
                    versions: envelope.query.versions,
                })
            }
            Query::Addresses { .. } => {
                let envelope: AddressEnvelope = serde_json::from_slice(&body).map_err(json_error)?;
                Ok(Payload::Addresses(envelope.into_addresses()))
            }
        }
    }

    /// Starts one detached task per endpoint, each sending its outcome into
    /// `tx`. Returns the number of tasks, which is the number of outcomes the
    /// receiving side must wait for.
    pub fn spawn_all(
        &self,
        endpoints: Vec<Endpoint>,
        query: &Query,
        tx: mpsc::Sender<ProbeOutcome>,
    ) -> usize {
        let count = endpoints.len();
        for endpoint in endpoints {
            let prober = self.clone();
            let query = query.clone();
            let tx = tx.clone();
            tokio::spawn(async move {
                let outcome = prober.probe_one(&endpoint, &query).await;
                if tx.send(outcome).await.is_err() {
                    debug!(%endpoint, "reporter gone, outcome discarded");
                }
            });
        }
        count
    }
}

fn transport_error(e: reqwest::Error) -> ProbeError {
    if e.is_timeout() || timed_out_io(&e) {
        ProbeError::Timeout(e.to_string())
    } else {
        ProbeError::Transport(e.to_string())
    }
}

/// A read that hit the read timeout surfaces as an io::Error somewhere in the chain.
fn timed_out_io(e: &(dyn std::error::Error + 'static)) -> bool {
    let mut source = e.source();
    while let Some(err) = source {
        if let Some(io) = err.downcast_ref::<std::io::Error>() {
            if io.kind() == std::io::ErrorKind::TimedOut {
                return true;
            }
        }
        source = err.source();
    }
    false
}
