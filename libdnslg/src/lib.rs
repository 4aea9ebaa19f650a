mod bootstrap;
mod endpoint;
mod envelope;
mod error;
mod http;
mod prober;
mod report;
mod types;

pub use bootstrap::{bootstrap_endpoints, system_name_server, BOOTSTRAP_NAME};
pub use endpoint::{load_endpoint_file, parse_endpoints, InstanceRecord};
pub use error::SetupError;
pub use prober::Prober;
pub use report::{OutputFormat, ReportConfig, ReportSummary, Reporter};
pub use types::{Endpoint, OutcomeRecord, Payload, ProbeConfig, ProbeError, ProbeOutcome, Query};

use std::io::Write;
use tokio::sync::{mpsc, oneshot};
use tracing::error;

/// Probes every endpoint concurrently and reports through `reporter`.
///
/// Returns once the reporter has consumed one outcome per endpoint.
pub async fn run_fleet<W>(
    prober: &Prober,
    endpoints: Vec<Endpoint>,
    query: &Query,
    reporter: Reporter<W>,
) -> ReportSummary
where
    W: Write + Send + 'static,
{
    let (tx, rx) = mpsc::channel(endpoints.len().max(1));
    let (done_tx, done_rx) = oneshot::channel();

    let expected = endpoints.len();
    let reporter = tokio::spawn(reporter.run(rx, done_tx, expected));
    let spawned = prober.spawn_all(endpoints, query, tx);
    debug_assert_eq!(spawned, expected);

    let summary = match done_rx.await {
        Ok(summary) => summary,
        Err(_) => {
            error!(expected, "reporter stopped without a summary");
            ReportSummary::default()
        }
    };
    if let Err(e) = reporter.await {
        error!(error = %e, "reporter task failed");
    }
    summary
}
