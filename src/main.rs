use clap::{
    CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};

use tunerec::{
    cli::{self, ServeOverrides},
    config, error,
    recommend::StrategyKind,
};

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .usage(AnsiColor::White.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightGreen.on_default())
}

#[derive(Parser, Debug, Clone)]
#[clap(
  version = env!("CARGO_PKG_VERSION"),
  name=env!("CARGO_PKG_NAME"),
  bin_name=env!("CARGO_PKG_NAME"),
  author=env!("CARGO_PKG_AUTHORS"),
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    #[clap(about = "Run the recommendation server")]
    Serve(ServeOptions),

    #[clap(about = "Search tracks through a running server")]
    Search(SearchOptions),

    #[clap(about = "Search a seed track and ask a running server for recommendations")]
    Recommend(RecommendOptions),

    Completions(CompletionsOption),
}

#[derive(Parser, Debug, Clone)]
pub struct ServeOptions {
    /// Address to listen on, overrides SERVER_ADDRESS
    #[clap(long)]
    pub address: Option<String>,

    /// Worker pool size, overrides SERVER_WORKERS
    #[clap(long)]
    pub workers: Option<usize>,

    /// Initial strategy, overrides RECOMMENDATION_STRATEGY
    #[clap(long, value_enum)]
    pub strategy: Option<StrategyKind>,
}

#[derive(Parser, Debug, Clone)]
pub struct SearchOptions {
    pub query: String,

    #[clap(long, default_value_t = 20)]
    pub limit: usize,

    /// Server to connect to, defaults to SERVER_ADDRESS
    #[clap(long)]
    pub server: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct RecommendOptions {
    /// Search query used to find the seed track
    pub query: String,

    /// Which search result to use as seed (1-based)
    #[clap(long, default_value_t = 1)]
    pub pick: usize,

    #[clap(long, default_value_t = 10)]
    pub count: usize,

    #[clap(long)]
    pub server: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

#[tokio::main]
async fn main() {
    if let Err(e) = config::load_env().await {
        error!("Cannot load environment. Err: {}", e);
    }

    let cli = Cli::parse();

    match cli.command {
        Command::Serve(opt) => {
            cli::serve(ServeOverrides {
                address: opt.address,
                workers: opt.workers,
                strategy: opt.strategy,
            })
            .await
        }
        Command::Search(opt) => {
            let server = opt.server.unwrap_or_else(config::server_addr);
            cli::search(&server, &opt.query, opt.limit).await
        }
        Command::Recommend(opt) => {
            let server = opt.server.unwrap_or_else(config::server_addr);
            cli::recommend(&server, &opt.query, opt.pick, opt.count).await
        }
        Command::Completions(opt) => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(opt.shell, &mut cmd, name, &mut std::io::stdout())
        }
    }
}
