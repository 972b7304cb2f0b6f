//! link-scan CLI
//!
//! Renders a page with headless Chrome and reports broken links.

use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;

use link_scan::logging;
use link_scan::scan::{run_scan, ScanArgs};

#[derive(Parser)]
#[command(name = "link-scan")]
#[command(version)]
#[command(about = "Find broken links on a web page using headless Chrome")]
#[command(long_about = "Loads the page in headless Chrome, collects every link, strips fragments and query strings, and checks each link with a HEAD request.\n\nLinks answering 403 are treated as valid (bot blocking, not breakage).")]
struct Cli {
    #[command(flatten)]
    scan: ScanArgs,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    logging::init_logging()?;
    let cli = Cli::parse();
    run_scan(cli.scan).await
}
