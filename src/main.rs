use clap::{CommandFactory, Parser, error::ErrorKind};
use sentiment_brief::{Cli, UsageError};
use std::error::Error;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    match sentiment_brief::run(cli).await {
        Err(err) if err.downcast_ref::<UsageError>().is_some() => {
            Cli::command()
                .error(ErrorKind::MissingRequiredArgument, err.to_string())
                .exit();
        }
        other => other,
    }
}
