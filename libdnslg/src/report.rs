use crate::types::ProbeOutcome;
use std::io::{self, Write};
use tokio::sync::{mpsc, oneshot};
use tracing::{error, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Ndjson,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ReportConfig {
    /// Print successes too, not only failures.
    pub verbose: bool,
    /// Mark failed text lines with `ERROR` (query tool).
    pub error_prefix: bool,
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReportSummary {
    pub received: usize,
    pub failed: usize,
    pub printed: usize,
}

pub struct Reporter<W> {
    config: ReportConfig,
    out: W,
}

impl<W: Write> Reporter<W> {
    pub fn new(config: ReportConfig, out: W) -> Self {
        Self { config, out }
    }

    fn should_print(&self, outcome: &ProbeOutcome) -> bool {
        self.config.verbose || !outcome.is_ok()
    }

    fn write_outcome(&mut self, outcome: &ProbeOutcome) -> io::Result<()> {
        match self.config.format {
            OutputFormat::Text if self.config.error_prefix && !outcome.is_ok() => {
                writeln!(self.out, "{}: ERROR {}", outcome.endpoint, outcome.message())?
            }
            OutputFormat::Text => writeln!(self.out, "{}: {}", outcome.endpoint, outcome.message())?,
            OutputFormat::Ndjson => {
                let line = serde_json::to_string(&outcome.record()).map_err(io::Error::other)?;
                writeln!(self.out, "{}", line)?
            }
        }
        self.out.flush()
    }

    /// Consumes exactly `expected` outcomes, then sends the summary on `done`.
    pub async fn run(
        mut self,
        mut rx: mpsc::Receiver<ProbeOutcome>,
        done: oneshot::Sender<ReportSummary>,
        expected: usize,
    ) {
        let mut summary = ReportSummary::default();

        while summary.received < expected {
            let Some(outcome) = rx.recv().await else {
                error!(
                    received = summary.received,
                    expected, "result channel closed before every probe reported"
                );
                break;
            };
            summary.received += 1;
            if !outcome.is_ok() {
                summary.failed += 1;
            }
            if self.should_print(&outcome) {
                if let Err(e) = self.write_outcome(&outcome) {
                    warn!(endpoint = %outcome.endpoint, error = %e, "cannot write outcome");
                } else {
                    summary.printed += 1;
                }
            }
        }

        let _ = done.send(summary);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Endpoint, Payload, ProbeError};
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl SharedBuf {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().write(buf)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn good(url: &str) -> ProbeOutcome {
        ProbeOutcome {
            endpoint: Endpoint::from(url),
            result: Ok(Payload::Health { bytes: 42, versions: "v1".into() }),
        }
    }

    fn bad(url: &str) -> ProbeOutcome {
        ProbeOutcome {
            endpoint: Endpoint::from(url),
            result: Err(ProbeError::Status("500 Internal Server Error".into())),
        }
    }

    async fn report(config: ReportConfig, outcomes: Vec<ProbeOutcome>) -> (ReportSummary, String) {
        let buf = SharedBuf::default();
        let (tx, rx) = mpsc::channel(1);
        let (done_tx, done_rx) = oneshot::channel();
        let expected = outcomes.len();

        tokio::spawn(Reporter::new(config, buf.clone()).run(rx, done_tx, expected));
        for outcome in outcomes {
            tx.send(outcome).await.unwrap();
        }

        let summary = done_rx.await.unwrap();
        (summary, buf.contents())
    }

    #[tokio::test]
    async fn quiet_mode_prints_only_failures() {
        let (summary, out) = report(
            ReportConfig::default(),
            vec![good("http://up.example"), bad("http://down.example")],
        )
        .await;

        assert_eq!(out, "http://down.example: Bad status: 500 Internal Server Error\n");
        assert_eq!(summary, ReportSummary { received: 2, failed: 1, printed: 1 });
    }

    #[tokio::test]
    async fn verbose_mode_prints_everything() {
        let config = ReportConfig { verbose: true, error_prefix: true, ..Default::default() };
        let (summary, out) = report(config, vec![good("http://up.example"), bad("http://down.example")]).await;

        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(
            lines,
            vec![
                "http://up.example: OK (42 bytes) v1",
                "http://down.example: ERROR Bad status: 500 Internal Server Error",
            ]
        );
        assert_eq!(summary.printed, 2);
    }

    #[tokio::test]
    async fn failures_unmarked_without_error_prefix() {
        let config = ReportConfig { verbose: true, ..Default::default() };
        let (_, out) = report(config, vec![bad("http://down.example"), good("http://up.example")]).await;

        assert!(!out.contains("ERROR"));
        assert!(out.contains("http://down.example: Bad status: 500 Internal Server Error\n"));
    }

    #[tokio::test]
    async fn ndjson_lines() {
        let config = ReportConfig { verbose: true, format: OutputFormat::Ndjson, ..Default::default() };
        let (_, out) = report(config, vec![good("http://up.example")]).await;

        let value: serde_json::Value = serde_json::from_str(out.trim_end()).unwrap();
        assert_eq!(value["endpoint"], "http://up.example");
        assert_eq!(value["ok"], true);
        assert_eq!(value["versions"], "v1");
        assert_eq!(value["bytes"], 42);
    }

    #[tokio::test]
    async fn stops_after_expected_count() {
        let buf = SharedBuf::default();
        let (tx, rx) = mpsc::channel(4);
        let (done_tx, done_rx) = oneshot::channel();
        for i in 0..3 {
            tx.send(bad(&format!("http://{}.example", i))).await.unwrap();
        }

        tokio::spawn(Reporter::new(ReportConfig::default(), buf.clone()).run(rx, done_tx, 2));

        let summary = done_rx.await.unwrap();
        assert_eq!(summary.received, 2);
        assert_eq!(buf.contents().lines().count(), 2);
        drop(tx);
    }

    #[tokio::test]
    async fn closed_channel_signals_short_count() {
        let (tx, rx) = mpsc::channel(1);
        let (done_tx, done_rx) = oneshot::channel();
        tx.send(good("http://up.example")).await.unwrap();
        drop(tx);

        tokio::spawn(Reporter::new(ReportConfig::default(), io::sink()).run(rx, done_tx, 3));

        assert_eq!(done_rx.await.unwrap().received, 1);
    }

    #[tokio::test]
    async fn zero_expected_finishes_immediately() {
        let (_tx, rx) = mpsc::channel(1);
        let (done_tx, done_rx) = oneshot::channel();

        tokio::spawn(Reporter::new(ReportConfig::default(), io::sink()).run(rx, done_tx, 0));

        assert_eq!(done_rx.await.unwrap(), ReportSummary::default());
    }
}
