use clap::{error::ErrorKind, CommandFactory, Parser};
use dnslgcli::config::load_config;
use libdnslg::{
    bootstrap_endpoints, run_fleet, OutputFormat, Prober, Query, ReportConfig, Reporter, SetupError,
    BOOTSTRAP_NAME,
};
use std::{net::SocketAddr, process::ExitCode};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "dnslg-query")]
#[command(about = "Ask every public DNS looking-glass instance for the addresses of a name", long_about = None)]
struct Args {
    /// Domain name to resolve through every instance
    name: String,

    /// Output results as NDJSON stream (one JSON object per line)
    #[arg(long, short = 'j')]
    ndjson: bool,

    /// TXT record listing the instances
    #[arg(long, value_name = "NAME")]
    bootstrap: Option<String>,

    /// Name server for the bootstrap lookup (default: first from the system configuration)
    #[arg(long, value_name = "ADDR")]
    resolver: Option<SocketAddr>,

    /// Seconds allowed to connect to an instance
    #[arg(long, value_name = "SECS")]
    connect_timeout: Option<u64>,

    /// Seconds allowed to send the request and read the reply
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,
}

async fn run(args: Args) -> Result<(), SetupError> {
    let config = load_config();
    let bootstrap = args
        .bootstrap
        .or(config.bootstrap.name.clone())
        .unwrap_or_else(|| BOOTSTRAP_NAME.to_string());
    let resolver = args.resolver.or(config.bootstrap.resolver);

    let endpoints = bootstrap_endpoints(&bootstrap, resolver).await?;
    let prober = Prober::with_config(config.probe_config(args.connect_timeout, args.timeout))?;

    let reporter = Reporter::new(
        ReportConfig {
            verbose: true,
            error_prefix: true,
            format: if args.ndjson { OutputFormat::Ndjson } else { OutputFormat::Text },
        },
        std::io::stdout(),
    );
    let summary = run_fleet(&prober, endpoints, &Query::addresses(args.name), reporter).await;
    info!(instances = summary.received, failed = summary.failed, "query finished");
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    dnslgcli::init_logging();
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(_) => {
            println!("{}", Args::command().render_usage());
            return ExitCode::FAILURE;
        }
    };

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            println!("{}", e);
            ExitCode::FAILURE
        }
    }
}
