//! Nonce Search Worker - Main Application
//!
//! Runs one assignment to completion and exits. The exit status tells the
//! scheduler whether the assignment was rejected before any work was done.

use nonce_search_worker::{
    utils::init_logging, Blake2sHasher, Config, Error, NonceSearchLoop, Result, RunSummary,
    SearchOptions, TcpReportClient, APP_NAME, APP_VERSION,
};
use std::process::ExitCode;
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    // Logging is not up until the config is known
    let config = match Config::load().await {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}: {}", APP_NAME, e);
            return ExitCode::from(e.exit_code());
        }
    };

    init_logging(config.log_level(), config.log_format());
    info!("Starting {} v{}", APP_NAME, APP_VERSION);

    match run(&config).await {
        Ok(summary) => {
            info!(
                solutions = summary.solutions,
                failed_reports = summary.failed_reports,
                "Worker finished: {}",
                summary
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            report_failure(&e);
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run(config: &Config) -> Result<RunSummary> {
    let request = config.work_request()?;
    let reporter = TcpReportClient::new(config.coordinator_addr()?);
    let options = SearchOptions {
        verbose: config.verbose,
    };

    info!(coordinator = %reporter.addr(), "Reporting to coordinator");

    let mut search = NonceSearchLoop::with_options(Blake2sHasher::new(), options);
    search.execute(request, &reporter).await
}

fn report_failure(e: &Error) {
    if e.is_rejected_assignment() {
        error!(category = e.category(), "Assignment rejected: {}", e);
    } else {
        error!(category = e.category(), "Worker failed: {}", e);
    }
}
