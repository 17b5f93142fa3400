//! Cache domain - key derivation, entries and the store contract

mod entry;
mod key;
mod repository;

pub use entry::{CacheEntry, GenerationStatus};
pub use key::{
    normalize, CacheKeyDeriver, CacheKeyParams, KeyKind, KeyLength, MAX_TEXT_KEY_CHARS,
    SHORT_KEY_HEX_CHARS,
};
pub use repository::CacheStore;

#[cfg(test)]
pub use repository::mock::MockCacheStore;
