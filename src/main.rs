//! LarpScore CLI
//!
//! Resolve a query, run one scan and print the report.
//!
//!   larpscore '$PEPE'
//!   larpscore example.xyz --force-fresh
//!   larpscore @somehandle --json

use clap::Parser;
use eyre::{bail, Result};
use larpscore::{Report, ScanConfig, ScanManager, ScanStatus};
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "larpscore", version, about = "Trust intelligence scan for a crypto project")]
struct Args {
    /// Ticker, contract address, social handle or URL, domain, or name-service record
    query: String,

    /// Ignore any cached report
    #[arg(long)]
    force_fresh: bool,

    /// Print the job as JSON instead of a summary
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Logs go to stderr so --json output stays clean
    FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let config = ScanConfig::default();
    let manager = Arc::new(ScanManager::from_config(&config)?);

    let outcome = manager.scan_query(&args.query, args.force_fresh)?;
    let job = manager.wait(&outcome.job_id).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&job)?);
        return Ok(());
    }

    match (job.status, &job.result) {
        (ScanStatus::Complete, Some(report)) => {
            println!("🔎 {} ({})", job.entity.canonical_id(), job.entity.kind.as_str());
            if job.cached {
                println!("💾 Served from cache");
            }
            print_report(report);
            Ok(())
        }
        _ => bail!(
            "scan failed: {}",
            job.error.as_deref().unwrap_or("no report produced")
        ),
    }
}

fn print_report(report: &Report) {
    println!();
    println!("{}", report.summary());
    println!();

    for module in &report.breakdown {
        println!("  {:<16} {:>3}/100", module.name.as_str(), module.score);
        for evidence in &module.evidence {
            println!("    - [{:?}] {}", evidence.severity, evidence.summary);
        }
    }

    if !report.sources.is_empty() {
        println!();
        println!("Sources:");
        for source in &report.sources {
            match &source.reason {
                None => println!("  ✅ {} ({}ms)", source.adapter, source.latency_ms),
                Some(reason) => println!("  📭 {} - {}", source.adapter, reason),
            }
        }
    }
}
