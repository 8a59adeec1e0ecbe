use chrono::Duration;
use news_client::{CacheConfig, ClientConfig, FeedType, NewsClient};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    env_logger::init();

    let config = ClientConfig {
        cache: CacheConfig::new(Duration::minutes(10)),
        ..ClientConfig::default()
    };
    let client = NewsClient::with_config(config);

    // First fetch goes to the network
    let start = std::time::Instant::now();
    let items = client.items("AI", 1, FeedType::Main).await?;
    let duration1 = start.elapsed();
    println!("First fetch took: {:?}", duration1);
    println!(
        "Found {} items",
        items.as_array().map(|items| items.len()).unwrap_or(0)
    );

    // Second fetch should come from cache
    let start = std::time::Instant::now();
    client.items("AI", 1, FeedType::Main).await?;
    let duration2 = start.elapsed();
    println!("Cached fetch took: {:?}", duration2);

    // Concurrent identical fetches share one network call
    let (a, b) = tokio::join!(client.jobs("AI", 1), client.jobs("AI", 1));
    println!("Concurrent fetches agree: {}", a? == b?);

    println!("Cache stats: {:?}", client.cache_stats());

    // Cache management
    println!("Dropped {} item entries", client.clear_cache(Some("items")));
    println!("Evicted {} expired entries", client.evict_expired_cache());
    println!("Cache stats after cleanup: {:?}", client.cache_stats());

    Ok(())
}
