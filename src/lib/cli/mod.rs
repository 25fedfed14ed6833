use crate::application::tooling::ProviderSpec;
use clap::{Parser, ValueEnum};
use thiserror::Error;

#[derive(Parser, Debug)]
#[command(
    name = "sentiment-brief",
    version,
    about = "Tool-augmented chat client that produces the daily sentiment brief"
)]
pub struct Cli {
    #[arg(long)]
    pub config: Option<String>,
    /// Replace the configured system prompt.
    #[arg(long)]
    pub system: Option<String>,
    /// Run a single query and exit instead of reading queries from stdin.
    #[arg(long)]
    pub query: Option<String>,
    #[arg(long, value_parser = parse_max_turns)]
    pub max_turns: Option<usize>,
    /// Mirror logs to stderr.
    #[arg(long, short)]
    pub verbose: bool,
    /// Tool providers as `<script> <port>` pairs.
    #[arg(value_name = "PROVIDER PORT")]
    pub providers: Vec<String>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UsageError {
    #[error("tool providers must be given as <PROVIDER> <PORT> pairs (got {0} arguments)")]
    UnpairedArguments(usize),
    #[error("invalid port '{0}'")]
    InvalidPort(String),
    #[error("no tool providers: pass <PROVIDER> <PORT> pairs or configure [[servers]]")]
    NoProviders,
}

impl Cli {
    pub fn provider_specs(&self) -> Result<Vec<ProviderSpec>, UsageError> {
        parse_provider_pairs(&self.providers)
    }
}

pub fn parse_provider_pairs(args: &[String]) -> Result<Vec<ProviderSpec>, UsageError> {
    if args.len() % 2 != 0 {
        return Err(UsageError::UnpairedArguments(args.len()));
    }
    args.chunks(2)
        .map(|pair| {
            let port = pair[1]
                .parse::<u16>()
                .map_err(|_| UsageError::InvalidPort(pair[1].clone()))?;
            Ok(ProviderSpec::new(&pair[0], port))
        })
        .collect()
}

fn parse_max_turns(value: &str) -> Result<usize, String> {
    match value.parse::<usize>() {
        Ok(0) => Err("must be at least 1".to_string()),
        Ok(turns) => Ok(turns),
        Err(err) => Err(err.to_string()),
    }
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
pub enum Transport {
    /// HTTP server-sent events on the given port
    #[default]
    Sse,
    /// Newline-delimited JSON-RPC on stdin/stdout
    Stdio,
}

/// Arguments shared by the tool server binaries.
#[derive(Parser, Debug)]
pub struct ServerCli {
    #[arg(long)]
    pub config: Option<String>,
    #[arg(long, value_enum, default_value_t = Transport::Sse)]
    pub transport: Transport,
    /// Mirror logs to stderr.
    #[arg(long, short)]
    pub verbose: bool,
    /// Port for the SSE transport.
    pub port: Option<u16>,
}
