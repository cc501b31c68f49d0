//! "First caller starts it, everyone else awaits the same result."

use std::future::Future;

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use parking_lot::Mutex;

use crate::error::Result;

pub type SharedResult<T> = Shared<BoxFuture<'static, Result<T>>>;

/// Holds at most one shared operation at a time.
pub struct InFlight<T: Clone> {
	slot: Mutex<Option<SharedResult<T>>>,
}

impl<T: Clone> Default for InFlight<T> {
	fn default() -> Self {
		Self {
			slot: Mutex::new(None),
		}
	}
}

impl<T> InFlight<T>
where
	T: Clone + Send + Sync + 'static,
{
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns the pending operation, or starts one with `start`.
	///
	/// `start` runs under the slot lock, so it must not block.
	pub fn join_or_start<F, Fut>(&self, start: F) -> SharedResult<T>
	where
		F: FnOnce() -> Fut,
		Fut: Future<Output = Result<T>> + Send + 'static,
	{
		let mut slot = self.slot.lock();
		if let Some(pending) = slot.as_ref() {
			return pending.clone();
		}
		let shared = start().boxed().shared();
		*slot = Some(shared.clone());
		shared
	}

	/// Clears the slot only if it still holds `op`.
	pub fn clear_if(&self, op: &SharedResult<T>) {
		let mut slot = self.slot.lock();
		if slot.as_ref().is_some_and(|pending| pending.ptr_eq(op)) {
			*slot = None;
		}
	}

	pub fn clear(&self) {
		*self.slot.lock() = None;
	}

	pub fn is_pending(&self) -> bool {
		self.slot.lock().is_some()
	}
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;
	use std::sync::atomic::{AtomicU32, Ordering};

	use super::*;

	#[tokio::test]
	async fn test_concurrent_callers_share_one_run() {
		let guard = Arc::new(InFlight::<u32>::new());
		let starts = Arc::new(AtomicU32::new(0));
		let (tx, rx) = tokio::sync::oneshot::channel::<()>();
		let rx = Arc::new(parking_lot::Mutex::new(Some(rx)));

		let mut joins = Vec::new();
		for _ in 0..4 {
			let starts = starts.clone();
			let rx = rx.clone();
			joins.push(guard.join_or_start(move || {
				starts.fetch_add(1, Ordering::SeqCst);
				let rx = rx.lock().take();
				async move {
					if let Some(rx) = rx {
						let _ = rx.await;
					}
					Ok(7)
				}
			}));
		}
		tx.send(()).unwrap();

		for join in joins {
			assert_eq!(join.await.unwrap(), 7);
		}
		assert_eq!(starts.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn test_clear_if_ignores_a_newer_operation() {
		let guard = InFlight::<u32>::new();
		let first = guard.join_or_start(|| async { Ok(1) });
		guard.clear();
		let second = guard.join_or_start(|| async { Ok(2) });

		guard.clear_if(&first);
		assert!(guard.is_pending());
		guard.clear_if(&second);
		assert!(!guard.is_pending());
		assert_eq!(second.await.unwrap(), 2);
	}
}
