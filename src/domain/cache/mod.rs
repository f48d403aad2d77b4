//! Cache domain - result entries, keys and the storage contract

mod clock;
mod entry;
mod key;
mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use entry::{CacheEntry, CacheIndex, RESULT_TTL};
pub use key::{CacheKey, CacheKeyGenerator, DEFAULT_NAMESPACE};
pub use store::{KeyValueStore, StoreQuota};

#[cfg(test)]
pub use store::MockKeyValueStore;
