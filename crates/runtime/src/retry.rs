//! Fixed-delay retry for bootstrap steps.

use std::future::Future;
use std::time::Duration;

use crate::error::Result;

/// `attempts` total tries with `delay` between consecutive tries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
	pub attempts: u32,
	pub delay: Duration,
}

impl RetryPolicy {
	pub fn new(attempts: u32, delay: Duration) -> Self {
		Self { attempts, delay }
	}

	pub fn from_millis(attempts: u32, delay_ms: u64) -> Self {
		Self::new(attempts, Duration::from_millis(delay_ms))
	}

	/// Runs `op` until it succeeds or attempts run out, returning the last
	/// error. Zero attempts is treated as one.
	pub async fn run<T, F, Fut>(&self, what: &'static str, mut op: F) -> Result<T>
	where
		F: FnMut(u32) -> Fut,
		Fut: Future<Output = Result<T>>,
	{
		let attempts = self.attempts.max(1);
		let mut attempt = 1;
		loop {
			match op(attempt).await {
				Ok(value) => return Ok(value),
				Err(err) if attempt < attempts => {
					tracing::debug!(
						target = "mk.retry",
						what,
						attempt,
						attempts,
						delay_ms = self.delay.as_millis() as u64,
						error = %err,
						"attempt failed, retrying"
					);
					tokio::time::sleep(self.delay).await;
					attempt += 1;
				}
				Err(err) => {
					tracing::warn!(target = "mk.retry", what, attempts, error = %err, "attempts exhausted");
					return Err(err);
				}
			}
		}
	}
}
