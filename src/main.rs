use anyhow::Result;
use clap::Parser;
use reqwest::Client;
use serde_json::Value;
use shorefetch::{
    cache::CachedFetcher,
    commands,
    config::Settings,
    http::{HttpClient, RetryPolicy},
    notify::LogNotifier,
    runtime::RealRuntime,
};
use std::sync::Arc;
use std::time::Duration;

/// shorefetch - resilient JSON fetches for the resort site
///
/// Requests retry on timeouts, network failures and transient HTTP statuses.
/// Responses are cached in memory for the lifetime of the process.
///
/// Examples:
///   shorefetch get https://resort.example/api/rooms
///   shorefetch check-env
#[derive(Parser, Debug)]
#[command(author, version = env!("SHOREFETCH_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Print the error log as JSON to stderr after the command
    #[arg(long = "log-json", global = true)]
    log_json: bool,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Fetch a JSON resource through the cache
    Get(GetArgs),

    /// POST a JSON document
    Post(PostArgs),

    /// Check that required environment variables are set
    CheckEnv,
}

#[derive(clap::Args, Debug)]
struct GetArgs {
    #[arg(value_name = "URL")]
    url: String,

    /// Cache key (defaults to the URL)
    #[arg(long)]
    key: Option<String>,

    /// Maximum age of a cached response in milliseconds
    #[arg(long = "max-age-ms", value_name = "MS")]
    max_age_ms: Option<u64>,

    #[command(flatten)]
    retry: RetryArgs,
}

#[derive(clap::Args, Debug)]
struct PostArgs {
    #[arg(value_name = "URL")]
    url: String,

    /// JSON request body
    #[arg(long, short = 'd', value_name = "JSON")]
    data: String,

    #[command(flatten)]
    retry: RetryArgs,
}

#[derive(clap::Args, Debug)]
struct RetryArgs {
    /// Retries after the first attempt
    #[arg(long, value_name = "N", env = "SHOREFETCH_MAX_RETRIES")]
    retries: Option<u32>,

    /// Base delay between attempts in milliseconds
    #[arg(long = "base-delay-ms", value_name = "MS", env = "SHOREFETCH_BASE_DELAY_MS")]
    base_delay_ms: Option<u64>,
}

impl RetryArgs {
    fn apply(&self, mut policy: RetryPolicy) -> RetryPolicy {
        if let Some(retries) = self.retries {
            policy = policy.with_max_retries(retries);
        }
        if let Some(ms) = self.base_delay_ms {
            policy = policy.with_base_delay_ms(ms);
        }
        policy
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let runtime = Arc::new(RealRuntime);
    let settings = Settings::from_runtime(runtime.as_ref())?;
    let client = Client::builder().user_agent("shorefetch-cli").build()?;
    let fetcher = CachedFetcher::new(runtime, HttpClient::new(client), LogNotifier)
        .with_policy(settings.retry_policy())
        .with_max_age(settings.cache_max_age);

    let result = match &cli.command {
        Commands::Get(args) => {
            let policy = args.retry.apply(settings.retry_policy());
            commands::get(
                &fetcher,
                &args.url,
                args.key.as_deref(),
                args.max_age_ms.map(Duration::from_millis),
                &policy,
            )
            .await
            .and_then(print_json)
        }
        Commands::Post(args) => {
            let policy = args.retry.apply(settings.retry_policy());
            commands::post(&fetcher, &args.url, &args.data, &policy)
                .await
                .and_then(print_json)
        }
        Commands::CheckEnv => {
            let missing = commands::check_env(&fetcher, &settings);
            if missing.is_empty() {
                println!("All required environment variables are set.");
            } else {
                for name in missing {
                    println!("missing: {}", name);
                }
            }
            Ok(())
        }
    };

    if cli.log_json {
        eprintln!("{}", fetcher.logger().to_json()?);
    }

    result
}

fn print_json(value: Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}
