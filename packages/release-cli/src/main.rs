use clap::{Args, Parser, Subcommand};
use release_cache::{MemoryPageCache, PageCache};
use release_provider::{
    config::{DEFAULT_ASSET_PREFIX, DEFAULT_MAX_PAGES, DEFAULT_REPO_URL},
    ChannelResolver, FeedPage, GitHubRepo, GitHubSource, ResolverConfig, ARCH_X64,
};
use release_server::{split_channels, ReleaseServer};
use release_utils::{HttpClient, DEFAULT_USER_AGENT};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "release-channels")]
#[command(about = "Latest BudgetBudget release per channel, from the GitHub release feed")]
struct Cli {
    #[command(flatten)]
    source: SourceArgs,

    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct SourceArgs {
    /// GitHub repository the releases are published on
    #[arg(long, env = "RELEASE_REPO", default_value = DEFAULT_REPO_URL, global = true)]
    repo: String,

    /// File name prefix of the installers
    #[arg(long, env = "RELEASE_ASSET_PREFIX", default_value = DEFAULT_ASSET_PREFIX, global = true)]
    asset_prefix: String,

    /// Feed pages to read before giving up
    #[arg(long, env = "RELEASE_MAX_PAGES", default_value_t = DEFAULT_MAX_PAGES, global = true)]
    max_pages: usize,

    /// Feed pages to keep in memory (unbounded when not set)
    #[arg(long, env = "RELEASE_CACHE_CAPACITY", global = true)]
    cache_capacity: Option<usize>,

    #[arg(long, default_value = DEFAULT_USER_AGENT, global = true)]
    user_agent: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the release endpoints over HTTP
    Serve {
        #[arg(long, env = "RELEASE_ADDR", default_value = "127.0.0.1:8080")]
        addr: SocketAddr,
    },
    /// Print the latest release of a channel
    Latest {
        /// Channel name, e.g. stable or alpha
        channel: String,
    },
    /// Print the latest release of several channels
    List {
        /// Comma separated channel names (all channels when empty)
        #[arg(long, default_value = "")]
        channels: String,
    },
    /// Print the installer url of a channel
    Files {
        channel: String,
        #[arg(default_value = ARCH_X64)]
        arch: String,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_resolver(args: &SourceArgs) -> Result<ChannelResolver, Box<dyn std::error::Error>> {
    let repo = GitHubRepo::new(&args.repo, &args.asset_prefix);
    let client = HttpClient::new(&args.user_agent)?;
    let cache: Arc<dyn PageCache<FeedPage>> = match args.cache_capacity {
        Some(capacity) => Arc::new(MemoryPageCache::<FeedPage>::bounded(capacity)),
        None => Arc::new(MemoryPageCache::<FeedPage>::new()),
    };
    debug!(repo = repo.url(), cache_capacity = ?args.cache_capacity, "release source");

    let source = Arc::new(GitHubSource::new(repo.clone(), client, cache));
    let config = ResolverConfig {
        max_pages: args.max_pages,
    };
    Ok(ChannelResolver::new(source, repo, config))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let resolver = build_resolver(&cli.source)?;

    match cli.command {
        Commands::Serve { addr } => {
            ReleaseServer::new(Arc::new(resolver)).start(addr).await?;
        }
        Commands::Latest { channel } => {
            let release = resolver.find_latest(Some(&channel)).await?;
            println!("{}", serde_json::to_string_pretty(&release)?);
        }
        Commands::List { channels } => {
            let releases = resolver.find_all(&split_channels(&channels)).await?;
            println!("{}", serde_json::to_string_pretty(&releases)?);
        }
        Commands::Files { channel, arch } => {
            let url = resolver.find_download(Some(&channel), Some(&arch)).await?;
            println!("{}", url);
        }
    }

    Ok(())
}
