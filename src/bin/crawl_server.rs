use clap::Parser;
use sentiment_brief::{AppConfig, ServerCli, crawl};
use std::error::Error;
use std::path::Path;
use tracing::info;

const DEFAULT_PORT: u16 = 8000;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = ServerCli::parse();
    let config = AppConfig::load(cli.config.as_deref().map(Path::new))?;
    let log_file = sentiment_brief::init_tracing(&config.logging, "crawl_server", cli.verbose)?;
    info!(log_file = %log_file.display(), transport = ?cli.transport, "Starting crawl server");

    let catalog = crawl::catalog(config.crawl.clone(), config.logging.dir.clone());
    sentiment_brief::serve_tools(catalog, cli.transport, cli.port.unwrap_or(DEFAULT_PORT)).await
}
