//! Cache module for storing API responses to disk
//!
//! This module provides a cache manager that persists API responses to the
//! filesystem, one JSON file per key. Readers pass a max-age on every lookup;
//! anything older, missing or unreadable is a miss.

mod manager;

pub use manager::{credential_tag, default_cache_dir, is_live, CacheManager, CachedData};
