//! Thread-safe in-memory [`TokenCache`] implementation for local development and tests.

// self
use crate::{
	_prelude::*,
	cache::{CacheFuture, TokenCache},
};

type CacheMap = Arc<RwLock<HashMap<String, CacheEntry>>>;

#[derive(Clone, Debug)]
struct CacheEntry {
	value: String,
	expires_at: OffsetDateTime,
}

/// Thread-safe cache backend that keeps entries in-process for tests and demos.
///
/// Expiry is evaluated lazily on read; expired entries are dropped the first time they are
/// looked up after their deadline.
#[derive(Clone, Debug, Default)]
pub struct MemoryCache(CacheMap);
impl MemoryCache {
	fn get_now(map: CacheMap, key: String) -> Option<String> {
		let now = OffsetDateTime::now_utc();

		{
			let guard = map.read();

			match guard.get(&key) {
				None => return None,
				Some(entry) if entry.expires_at > now => return Some(entry.value.clone()),
				Some(_) => {},
			}
		}

		// Expired; drop the entry so the map does not accumulate stale keys.
		map.write().remove(&key);

		None
	}

	fn set_now(map: CacheMap, key: String, value: String, ttl: Duration) {
		let expires_at = OffsetDateTime::now_utc() + ttl;

		map.write().insert(key, CacheEntry { value, expires_at });
	}

	fn delete_now(map: CacheMap, key: String) {
		map.write().remove(&key);
	}
}
impl TokenCache for MemoryCache {
	fn get<'a>(&'a self, key: &'a str) -> CacheFuture<'a, Option<String>> {
		let map = self.0.clone();
		let key = key.to_owned();

		Box::pin(async move { Ok(Self::get_now(map, key)) })
	}

	fn set<'a>(&'a self, key: &'a str, value: &'a str, ttl: Duration) -> CacheFuture<'a, ()> {
		let map = self.0.clone();
		let key = key.to_owned();
		let value = value.to_owned();

		Box::pin(async move {
			Self::set_now(map, key, value, ttl);

			Ok(())
		})
	}

	fn delete<'a>(&'a self, key: &'a str) -> CacheFuture<'a, ()> {
		let map = self.0.clone();
		let key = key.to_owned();

		Box::pin(async move {
			Self::delete_now(map, key);

			Ok(())
		})
	}
}
