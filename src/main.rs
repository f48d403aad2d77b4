use clap::Parser;
use semantic_search_client::cli::{self, Cli, Command};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = cli::load_config(cli.base_url);
    let ctx = semantic_search_client::create_app_context(config).await?;

    match cli.command {
        Command::Stats => cli::info::stats(&ctx).await,
        Command::Health => cli::info::health(&ctx).await,
        Command::Search(args) => cli::search::run(&ctx, args).await,
        Command::Interactive(args) => cli::interactive::run(&ctx, args).await,
        Command::Cache { action } => cli::cache::run(&ctx, action).await,
    }
}
