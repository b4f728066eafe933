//! Memoization of upstream pages, keyed by pagination cursor.
//!
//! The cache is handed to whoever fetches pages instead of living in a
//! process-wide static, so callers pick the retention policy and tests get a
//! fresh cache each time.

pub mod memory;

use async_trait::async_trait;

pub use memory::{MemoryPageCache, NoCache};

#[async_trait]
pub trait PageCache<V>: Send + Sync
where
    V: Clone + Send + Sync + 'static,
{
    async fn get(&self, key: &str) -> Option<V>;
    async fn set(&self, key: &str, value: V);
    async fn remove(&self, key: &str);
    async fn clear(&self);
}
