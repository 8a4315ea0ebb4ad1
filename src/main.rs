mod shutdown;
mod startup;

use clap::Parser;
use sortie::commands::{self, Cli, Command, CommandContext};
use tracing::info;

#[tokio::main]
async fn main() -> miette::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = match cli.command {
        Command::Watch => startup::WATCH_FILTER,
        _ => startup::QUIET_FILTER,
    };
    startup::init_logging(filter)?;

    info!("Starting sortie");

    // Load configuration
    let config = startup::load_config().await?;
    let client = startup::build_client(&config).await?;

    if let Command::Watch = cli.command {
        return startup::run_watch(config, client).await;
    }

    let ctx = CommandContext::new(config, client)
        .await
        .with_assume_yes(cli.yes);

    if let Err(e) = commands::run(&ctx, cli.command).await {
        let message = e.user_message();
        if message != e.to_string() {
            eprintln!("{}", message);
        }
        return Err(e.into());
    }
    Ok(())
}
