//! Content-addressed result cache
//!
//! Process results are stored under a fingerprint of everything that
//! determines them, so a repeated run over the same inputs is a lookup.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pulse_storage::{CacheEntry, CacheStore, FingerprintBuilder, SqliteCacheStore};
//!
//! let store = SqliteCacheStore::open(".pulse_cache")?;
//! let fp = FingerprintBuilder::new("sentiment")
//!     .dataset(Fingerprint::of_texts(&texts))
//!     .config(&config)?
//!     .finish();
//!
//! if let Some(entry) = store.get(&fp).await? {
//!     let result: MyResult = entry.decode()?;
//! }
//! ```

pub mod domain;
pub mod error;
pub mod fingerprint;
pub mod infrastructure;

pub use domain::{CacheEntry, CacheStore};
pub use error::{ErrorKind, Result, StorageError};
pub use fingerprint::{Fingerprint, FingerprintBuilder};
pub use infrastructure::InMemoryCacheStore;
#[cfg(feature = "sqlite")]
pub use infrastructure::SqliteCacheStore;
