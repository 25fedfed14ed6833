pub mod application;
pub mod cli;
pub mod config;
pub mod constants;
pub mod domain;
pub mod infrastructure;

pub use application::{analysis, conversation, crawl, stdio, tooling};
pub use cli::{Cli, ServerCli, Transport, UsageError};
pub use config::{AppConfig, ProviderConfig};
pub use domain::types;
pub use infrastructure::{model, rpc, server};

use application::conversation::{Conversation, ConversationOptions};
use application::tooling::{ProviderSpec, ServerLauncher, StdioSession, ToolSession};
use config::LoggingConfig;
use infrastructure::model::OpenAIClient;
use infrastructure::rpc::{McpDispatcher, ToolCatalog};
use std::error::Error;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use tracing::{debug, info, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

static LOG_FILE: OnceLock<PathBuf> = OnceLock::new();

/// Run the client: launch the tool providers, then answer either the single
/// `--query` or queries read from stdin.
pub async fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let specs = cli.provider_specs()?;

    let config_path = cli.config.as_deref().map(Path::new);
    let mut config = AppConfig::load(config_path)?;
    let log_file = init_tracing(&config.logging, "client", cli.verbose)?;
    info!(log_file = %log_file.display(), "Starting sentiment-brief client");
    debug!(
        config = ?cli.config,
        providers = specs.len(),
        servers = config.servers.len(),
        "CLI arguments parsed"
    );

    if specs.is_empty() && config.servers.is_empty() {
        return Err(UsageError::NoProviders.into());
    }
    if let Some(system) = cli.system.clone() {
        config.conversation.system_prompt = system;
    }
    if let Some(max_turns) = cli.max_turns {
        config.conversation.max_turns = max_turns;
    }

    let model = OpenAIClient::from_config(&config.provider)?;
    let mut launcher = ServerLauncher::new(config.launch.clone(), &config.logging.dir);

    let outcome = converse(&cli, &config, model, &specs, &mut launcher).await;

    launcher.shutdown().await;
    info!("Client stopped");
    outcome
}

async fn converse(
    cli: &Cli,
    config: &AppConfig,
    model: OpenAIClient,
    specs: &[ProviderSpec],
    launcher: &mut ServerLauncher,
) -> Result<(), Box<dyn Error>> {
    let mut sessions: Vec<Arc<dyn ToolSession>> = Vec::new();
    for server in &config.servers {
        let session = StdioSession::spawn(server, config.launch.connect_timeout()).await?;
        sessions.push(Arc::new(session));
    }
    for spec in specs {
        let session = launcher.launch(spec).await?;
        sessions.push(Arc::new(session));
    }

    let options = ConversationOptions::from_config(&config.conversation, &config.provider);
    let mut conversation = Conversation::connect(model, sessions, options).await?;
    let result = match cli.query.as_deref() {
        Some(query) => {
            let mut stdout = tokio::io::stdout();
            stdio::answer_query(&mut conversation, query, &mut stdout)
                .await
                .map(|_| ())
        }
        None => stdio::run(&mut conversation).await,
    };
    conversation.close().await;
    Ok(result?)
}

/// Serve `catalog` over the transport chosen on the command line.
pub async fn serve_tools(
    catalog: ToolCatalog,
    transport: Transport,
    port: u16,
) -> Result<(), Box<dyn Error>> {
    let dispatcher = McpDispatcher::new(catalog);
    match transport {
        Transport::Sse => {
            let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
            info!(%addr, "Serving tools over SSE");
            server::serve(dispatcher, addr).await?;
        }
        Transport::Stdio => {
            info!("Serving tools over stdio");
            rpc::stdio::serve(dispatcher).await?;
        }
    }
    Ok(())
}

/// Install the global subscriber writing to `<dir>/<prefix>_<timestamp>.log`,
/// mirrored to stderr when `verbose`. Later calls return the first file.
pub fn init_tracing(
    logging: &LoggingConfig,
    prefix: &str,
    verbose: bool,
) -> Result<PathBuf, Box<dyn Error>> {
    if let Some(path) = LOG_FILE.get() {
        return Ok(path.clone());
    }

    std::fs::create_dir_all(&logging.dir)?;
    let stem = format!("{prefix}_{}", chrono::Local::now().format("%Y%m%d_%H%M%S"));
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(&stem)
        .filename_suffix("log")
        .build(&logging.dir)?;
    let path = logging.dir.join(format!("{stem}.log"));

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let file_layer = fmt::layer()
        .with_writer(appender)
        .with_ansi(false)
        .with_target(false);
    let stderr_layer = verbose.then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .compact()
    });

    if tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .is_err()
    {
        warn!("global tracing subscriber already installed");
    }

    Ok(LOG_FILE.get_or_init(|| path).clone())
}
