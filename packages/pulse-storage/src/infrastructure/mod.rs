//! Cache store adapters

pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use memory::InMemoryCacheStore;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteCacheStore;
