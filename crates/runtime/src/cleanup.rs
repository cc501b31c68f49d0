//! Idempotent teardown callbacks and the registry that owns them.
//!
//! A [`Cleanup`] wraps a one-shot closure behind a shared slot: clones share
//! the slot, and whichever clone runs first takes the closure. Later runs are
//! no-ops. [`CleanupRegistry`] keys outstanding cleanups so a whole scene can
//! be torn down even if individual entities were never removed.

use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use parking_lot::Mutex;

use crate::error::{Error, Result};

type CleanupFn = Box<dyn FnOnce() -> Result<()> + Send>;

/// A teardown action that runs at most once.
#[derive(Clone)]
pub struct Cleanup {
	slot: Arc<Mutex<Option<CleanupFn>>>,
}

impl Cleanup {
	pub fn new<F>(f: F) -> Self
	where
		F: FnOnce() -> Result<()> + Send + 'static,
	{
		Self {
			slot: Arc::new(Mutex::new(Some(Box::new(f)))),
		}
	}

	/// Wraps an infallible closure.
	pub fn from_fn<F>(f: F) -> Self
	where
		F: FnOnce() + Send + 'static,
	{
		Self::new(move || {
			f();
			Ok(())
		})
	}

	pub fn noop() -> Self {
		Self {
			slot: Arc::new(Mutex::new(None)),
		}
	}

	/// Composes cleanups into one. Every part runs even if an earlier one
	/// fails; the first failure is returned.
	pub fn all(parts: impl IntoIterator<Item = Cleanup>) -> Self {
		let parts: Vec<Cleanup> = parts.into_iter().collect();
		Self::new(move || {
			let mut first = None;
			for part in parts {
				if let Err(err) = part.run() {
					first.get_or_insert(err);
				}
			}
			first.map_or(Ok(()), Err)
		})
	}

	/// Runs the closure if it has not run yet.
	///
	/// A panicking closure is reported as `UNKNOWN_ERROR` and still counts as
	/// run.
	pub fn run(&self) -> Result<()> {
		let Some(f) = self.slot.lock().take() else {
			return Ok(());
		};
		match catch_unwind(AssertUnwindSafe(f)) {
			Ok(result) => result,
			Err(_) => Err(Error::Unknown("cleanup panicked".to_string())),
		}
	}

	/// Returns `true` once the closure has been taken.
	pub fn is_spent(&self) -> bool {
		self.slot.lock().is_none()
	}
}

impl fmt::Debug for Cleanup {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Cleanup").field("spent", &self.is_spent()).finish()
	}
}

/// Key returned by [`CleanupRegistry::register`].
pub type CleanupKey = u64;

/// Thread-safe set of outstanding cleanups.
pub struct CleanupRegistry {
	entries: DashMap<CleanupKey, Cleanup>,
	next_key: AtomicU64,
}

impl Default for CleanupRegistry {
	fn default() -> Self {
		Self::new()
	}
}

impl CleanupRegistry {
	pub fn new() -> Self {
		Self {
			entries: DashMap::new(),
			next_key: AtomicU64::new(1),
		}
	}

	pub fn register(&self, cleanup: Cleanup) -> CleanupKey {
		let key = self.next_key.fetch_add(1, Ordering::SeqCst);
		self.entries.insert(key, cleanup);
		key
	}

	/// Drops the registry's reference without running it.
	pub fn forget(&self, key: CleanupKey) -> Option<Cleanup> {
		self.entries.remove(&key).map(|(_, cleanup)| cleanup)
	}

	/// Removes and runs one cleanup. Unknown keys are a no-op.
	pub fn run(&self, key: CleanupKey) -> Result<()> {
		match self.forget(key) {
			Some(cleanup) => cleanup.run(),
			None => Ok(()),
		}
	}

	/// Runs and removes every registered cleanup, returning how many failed.
	///
	/// Failures are logged and do not stop the remaining cleanups.
	pub fn run_all(&self) -> usize {
		let keys: Vec<CleanupKey> = self.entries.iter().map(|entry| *entry.key()).collect();
		let mut failures = 0;
		for key in keys {
			if let Err(err) = self.run(key) {
				failures += 1;
				tracing::warn!(target = "mk.cleanup", key, error = %err, "cleanup failed");
			}
		}
		failures
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}
