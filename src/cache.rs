//! Cache contracts and the built-in in-memory backend for shared token state.

pub mod memory;

pub use memory::MemoryCache;

// self
use crate::_prelude::*;

/// Boxed future returned by [`TokenCache`] operations.
pub type CacheFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, CacheError>> + 'a + Send>>;

/// Key-value cache contract with per-key TTL, consumed by the token manager.
///
/// The cache is the only shared mutable resource in the core. It is treated as
/// eventually-consistent storage without transactions or cross-key ordering, and every operation
/// may fail: callers recover from cache faults locally, so cache health affects request latency
/// but never request outcome.
pub trait TokenCache
where
	Self: Send + Sync,
{
	/// Fetches the value stored under `key`, if present and unexpired.
	fn get<'a>(&'a self, key: &'a str) -> CacheFuture<'a, Option<String>>;

	/// Stores `value` under `key`, expiring it after `ttl`.
	fn set<'a>(&'a self, key: &'a str, value: &'a str, ttl: Duration) -> CacheFuture<'a, ()>;

	/// Removes the value stored under `key`, if any.
	fn delete<'a>(&'a self, key: &'a str) -> CacheFuture<'a, ()>;
}

/// Error type produced by [`TokenCache`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum CacheError {
	/// Backend-level failure of the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
	/// Stored value could not be encoded or decoded by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
}
impl CacheError {
	/// Builds a backend failure from any displayable payload.
	pub fn backend(message: impl Display) -> Self {
		Self::Backend { message: message.to_string() }
	}
}
