use clap::Parser;
use sentiment_brief::model::OpenAIClient;
use sentiment_brief::{AppConfig, ServerCli, analysis};
use std::error::Error;
use std::path::Path;
use tracing::info;

const DEFAULT_PORT: u16 = 8001;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = ServerCli::parse();
    let config = AppConfig::load(cli.config.as_deref().map(Path::new))?;
    let log_file = sentiment_brief::init_tracing(&config.logging, "analysis_server", cli.verbose)?;

    let provider = config.analysis_provider();
    let model = OpenAIClient::from_config(&provider)?;
    info!(
        log_file = %log_file.display(),
        transport = ?cli.transport,
        model = %provider.model,
        "Starting analysis server"
    );

    let catalog = analysis::catalog(model, config.analysis.clone(), log_file);
    sentiment_brief::serve_tools(catalog, cli.transport, cli.port.unwrap_or(DEFAULT_PORT)).await
}
