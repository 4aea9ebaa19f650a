use clap::Parser;
use dnslgcli::config::{config_path, default_config_toml, load_config, write_default_config, ConfigError};
use libdnslg::{
    load_endpoint_file, run_fleet, OutputFormat, Prober, Query, ReportConfig, Reporter, SetupError,
};
use std::{path::PathBuf, process::ExitCode};
use thiserror::Error;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "dnslg-check")]
#[command(about = "Check that every DNS looking-glass instance of a YAML database replies", long_about = None)]
struct Args {
    /// YAML database of instances (records with Endpoint, Contact and Status)
    file: Option<PathBuf>,

    /// Verbose mode, displays a line for every instance
    #[arg(short = 'v', long)]
    verbose: bool,

    /// Output results as NDJSON stream (one JSON object per line)
    #[arg(long, short = 'j')]
    ndjson: bool,

    /// Seconds allowed to connect to an instance
    #[arg(long, value_name = "SECS")]
    connect_timeout: Option<u64>,

    /// Seconds allowed to send the request and read the reply
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Print the default config to stdout and exit
    #[arg(long)]
    print_default_config: bool,

    /// Write the default config to the config path and exit
    #[arg(long)]
    write_default_config: bool,
}

#[derive(Debug, Error)]
enum CheckError {
    #[error("Usage: dnslg-check [-v] <filename.yaml>")]
    Usage,
    #[error(transparent)]
    Setup(#[from] SetupError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

async fn run(args: Args) -> Result<(), CheckError> {
    if args.print_default_config {
        print!("{}", default_config_toml());
        return Ok(());
    }
    if args.write_default_config {
        let path = write_default_config()?;
        println!("Wrote {}", path.display());
        return Ok(());
    }

    let file = args.file.ok_or(CheckError::Usage)?;
    let config = load_config();
    let endpoints = load_endpoint_file(&file)?;
    let prober = Prober::with_config(config.probe_config(args.connect_timeout, args.timeout))?;

    let reporter = Reporter::new(
        ReportConfig {
            verbose: args.verbose,
            error_prefix: false,
            format: if args.ndjson { OutputFormat::Ndjson } else { OutputFormat::Text },
        },
        std::io::stdout(),
    );
    let summary = run_fleet(&prober, endpoints, &Query::Health, reporter).await;
    info!(
        instances = summary.received,
        failed = summary.failed,
        config = ?config_path(),
        "check finished"
    );
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    dnslgcli::init_logging();
    let args = Args::parse();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
