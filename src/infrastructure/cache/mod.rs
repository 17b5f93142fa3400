//! Cache infrastructure - CacheStore implementations

mod factory;
mod in_memory;
mod postgres;
mod redis;

pub use factory::{CacheStoreFactory, StoreConfig, StoreType};
pub use in_memory::{InMemoryCacheStore, InMemoryStoreConfig};
pub use postgres::{PostgresCacheStore, PostgresConfig};
pub use self::redis::{RedisCacheStore, RedisStoreConfig};
