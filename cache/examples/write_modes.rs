use lanecache::{CacheBuilder, CacheConfig, EvictionListener, EvictionReason, InMemoryStore};
use std::sync::Arc;
use std::time::Duration;

// Prints every value that leaves the cache.
struct PrintListener;

impl EvictionListener<String, u32> for PrintListener {
  fn on_evict(&self, key: String, value: Arc<u32>, reason: EvictionReason) {
    println!("[Listener] '{}' = {} left the cache: {}", key, value, reason);
  }
}

const CONFIG: &str = "
evictionPolicy: LFU
expiryMillis: 500
capacity: 2
persistenceMode: WriteBack
laneCount: 3
";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  println!("--- Write-back cache configured from YAML ---");

  let config = CacheConfig::from_yaml_str(CONFIG)?;
  let store = Arc::new(InMemoryStore::new());
  store.insert("alpha".to_string(), 1);

  let cache = CacheBuilder::from_config(&config)?
    .eviction_listener(PrintListener)
    .build(store.clone())?;
  println!(
    "policy={} mode={} capacity={} lanes={}",
    cache.eviction_policy(),
    cache.persistence_mode(),
    cache.capacity(),
    cache.lane_count()
  );

  // A miss reads through to the store.
  println!("\nalpha = {}", cache.get("alpha".to_string()).await?);
  println!("alpha = {} (hit)", cache.get("alpha".to_string()).await?);

  // Write-back: visible at once, persisted in the background.
  cache.set("beta".to_string(), 2).await?;
  println!("\nbeta in cache: {:?}", cache.peek(&"beta".to_string()));
  tokio::time::sleep(Duration::from_millis(50)).await;
  println!("beta in store: {:?}", store.get(&"beta".to_string()));

  // Capacity is 2, so "beta" (one access) makes way over "alpha" (two).
  cache.set("gamma".to_string(), 3).await?;
  println!("\nafter inserting gamma: len={}", cache.len());
  assert!(cache.contains_key(&"alpha".to_string()));
  assert!(!cache.contains_key(&"beta".to_string()));

  // Let everything expire, then read again.
  tokio::time::sleep(Duration::from_millis(600)).await;
  println!("\nalpha after expiry = {}", cache.get("alpha".to_string()).await?);

  tokio::time::sleep(Duration::from_millis(50)).await;
  println!("\n{:#?}", cache.metrics());
  Ok(())
}
