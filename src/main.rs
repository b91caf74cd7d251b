// src/main.rs
// =============================================================================
// This is the entry point of webpage-packer.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Install logging (tracing) at the requested verbosity
// 3. Build and validate the pack options (bad input fails before any fetch)
// 4. Run the packer, cancelling it on Ctrl-C
// 5. Print a report and exit with a proper code
//    (0 = written, 1 = crawl/encode failed, 2 = bad input, 130 = cancelled)
// =============================================================================

mod archive;
mod cli;
mod config;
mod crawl;
mod error;
mod packer;

#[cfg(test)]
mod testing;

use anyhow::{Context, Result};
use archive::PackReport;
use clap::Parser;
use cli::Cli;
use config::{parse_header_arg, CrawlConfig, PackOptions};
use error::PackError;
use tokio_util::sync::CancellationToken;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            // Typed failures carry their own exit code
            e.downcast_ref::<PackError>().map(PackError::exit_code).unwrap_or(1)
        }
    };

    std::process::exit(exit_code);
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    let options = build_options(&cli)?;
    println!("📦 Packing {}", options.crawl.seed);

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("Interrupted, stopping crawl...");
                cancel.cancel();
            }
        });
    }

    let document = packer::pack(&options, cli.pack_type, cancel).await?;

    let report = document.report(&options.output.display().to_string());
    print_report(&report, cli.json)?;
    Ok(0)
}

fn init_logging(verbose: u8) -> Result<()> {
    let level = match verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    // Logs go to stderr so --json output on stdout stays clean
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("installing logger")?;
    Ok(())
}

fn build_options(cli: &Cli) -> Result<PackOptions, PackError> {
    let mut crawl = CrawlConfig::new(&cli.url)?
        .with_timeout_secs(cli.timeout)
        .with_workers(cli.workers)
        .with_queue_capacity(cli.queue_capacity)
        .with_block_private_network(cli.block_private_network);

    for raw in &cli.headers {
        let (name, value) = parse_header_arg(raw)?;
        crawl = crawl.with_header(&name, &value)?;
    }

    Ok(PackOptions::new(crawl, &cli.output)?.with_clutter_free(cli.clutter_free))
}

fn print_report(report: &PackReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        println!("✅ Main resource: {} ({})", report.main_url, report.main_mime_type);
        println!("   Sub-resources: {}", report.subresources);
        println!("   Total size:    {} bytes", report.total_bytes);
        println!("output file: {}", report.output);
    }
    Ok(())
}
