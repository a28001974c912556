//! Cache Module
//!
//! In-memory TTL caching with prefix eviction and entity-driven invalidation.

mod entry;
pub mod keys;
mod manager;
mod stats;
mod store;


// Re-export public types
pub use entry::CacheEntry;
pub use manager::{CacheManager, Entity, InvalidationPlan, SharedCache};
pub use stats::CacheStats;
pub use store::CacheStore;

// == Public Constants ==
/// Maximum allowed key length in bytes accepted over HTTP
pub const MAX_KEY_LENGTH: usize = 256;
