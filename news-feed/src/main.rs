mod config;
mod feed;

use clap::Parser;
use config::Config;
use log::{error, info};
use news_client::{FeedType, NewsClient};
use simplelog::{ColorChoice, TermLogger, TerminalMode};
use std::path::PathBuf;

/// Print a page of the news board
#[derive(Parser, Debug)]
#[command(name = "news-feed", version)]
struct Args {
    /// Category to list
    #[arg(default_value = "Crypto")]
    category: String,
    #[arg(short, long, default_value_t = 1)]
    page: u32,
    /// main, newest, ask or show
    #[arg(short, long, default_value = "main")]
    feed: FeedType,
    /// Show a single item with its comments instead of a listing
    #[arg(long)]
    item: Option<String>,
    #[arg(short, long, default_value = "news-feed.yaml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = Config::load(&args.config)?;

    TermLogger::init(
        config.log_level_filter(),
        simplelog::Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )?;

    let client = NewsClient::with_config(config.client_config()?);
    info!(
        "Initialized NewsClient against {} (cache TTL: {}s)",
        client.api_base(),
        config.cache_ttl_secs()
    );

    let result = match &args.item {
        Some(item_id) => show_item(&client, item_id).await,
        None => show_feed(&client, &args).await,
    };
    if let Err(e) = &result {
        error!("Could not load from {}: {}", client.api_base(), e);
    }

    info!("Cache stats: {:?}", client.cache_stats());
    result
}

async fn show_feed(client: &NewsClient, args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let data = client.items(&args.category, args.page, args.feed).await?;
    let posts = feed::parse_posts(data)?;

    println!("{} / {} / page {}", args.category, args.feed, args.page);
    if posts.is_empty() {
        println!("No posts found in {}", args.category);
        return Ok(());
    }

    for line in feed::render_page(&posts, chrono::Utc::now()) {
        println!("{}", line);
    }
    Ok(())
}

async fn show_item(client: &NewsClient, item_id: &str) -> Result<(), Box<dyn std::error::Error>> {
    let data = client.item_with_details(item_id).await?;
    println!("{}", serde_json::to_string_pretty(&data)?);
    Ok(())
}
