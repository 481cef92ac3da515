//! Vetrina cache tier.
//!
//! - **Index store**: catalog records, two sort indexes (price, title), and
//!   per-user basket counters.
//! - **Cache loader**: populates the index store from the backing relational
//!   store on miss (cache-aside).
//!
//! Configuration lives under `[cache]` in `vetrina.toml`:
//!
//! ```toml
//! [cache]
//! op_timeout_ms = 250
//! total_count_ttl_secs = 60
//! ```

mod config;
mod loader;
pub(crate) mod lock;
mod store;

pub use config::CacheConfig;
pub use loader::CacheLoader;
pub use store::{CacheError, IndexStore, MemoryIndexStore, bounded};
