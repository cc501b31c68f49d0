//! Authorization token acquisition, validation and scheduled refresh.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use mk_protocol::TokenResponse;
use parking_lot::{Mutex, RwLock};
use tokio::task::JoinHandle;

use crate::error::{Error, ErrorCode, Result};
use crate::retry::RetryPolicy;

/// Refresh happens this long before a token expires, and a token expiring
/// sooner than this is rejected outright.
pub const TOKEN_BUFFER: Duration = Duration::from_secs(60);

/// Source of signed engine tokens, normally an HTTP endpoint.
#[async_trait]
pub trait TokenProvider: Send + Sync {
	async fn fetch_token(&self) -> Result<TokenResponse>;
}

#[async_trait]
impl<F, Fut> TokenProvider for F
where
	F: Fn() -> Fut + Send + Sync,
	Fut: Future<Output = Result<TokenResponse>> + Send,
{
	async fn fetch_token(&self) -> Result<TokenResponse> {
		(self)().await
	}
}

/// A validated token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
	pub value: String,
	/// Unix seconds.
	pub expires_at: i64,
}

fn unix_now_ms() -> i64 {
	SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.map(|d| d.as_millis() as i64)
		.unwrap_or(0)
}

/// Fetches, caches and refreshes the engine token.
pub struct TokenManager {
	provider: Arc<dyn TokenProvider>,
	policy: RetryPolicy,
	buffer: Duration,
	current: RwLock<Option<Token>>,
	refresh_task: Mutex<Option<JoinHandle<()>>>,
	fetches: AtomicU64,
}

impl TokenManager {
	pub fn new(provider: Arc<dyn TokenProvider>, policy: RetryPolicy) -> Self {
		Self {
			provider,
			policy,
			buffer: TOKEN_BUFFER,
			current: RwLock::new(None),
			refresh_task: Mutex::new(None),
			fetches: AtomicU64::new(0),
		}
	}

	pub fn current(&self) -> Option<Token> {
		self.current.read().clone()
	}

	/// Number of provider calls made so far, including failed ones.
	pub fn fetch_count(&self) -> u64 {
		self.fetches.load(Ordering::SeqCst)
	}

	/// Non-empty and expiring strictly after now plus the buffer.
	pub fn is_usable(&self, token: &Token) -> bool {
		!token.value.is_empty() && token.expires_at.saturating_mul(1000) > unix_now_ms() + self.buffer.as_millis() as i64
	}

	/// Time until `token` should be refreshed. Zero if that moment has passed.
	pub fn refresh_delay(&self, token: &Token) -> Duration {
		let due_ms = token.expires_at.saturating_mul(1000) - self.buffer.as_millis() as i64 - unix_now_ms();
		Duration::from_millis(due_ms.max(0) as u64)
	}

	/// Returns the cached token if still usable, otherwise fetches a new one.
	pub async fn valid_token(&self) -> Result<Token> {
		if let Some(token) = self.current().filter(|t| self.is_usable(t)) {
			return Ok(token);
		}
		self.refresh().await
	}

	/// Fetches and validates a fresh token, retrying per the policy.
	pub async fn refresh(&self) -> Result<Token> {
		let token = self
			.policy
			.run("token fetch", |attempt| async move {
				self.fetches.fetch_add(1, Ordering::SeqCst);
				tracing::debug!(target = "mk.token", attempt, "fetching token");
				let response = self
					.provider
					.fetch_token()
					.await
					.map_err(|err| Error::TokenFailed(err.message().to_string()))?;
				let token = Token {
					value: response.token,
					expires_at: response.expires_at,
				};
				if self.is_usable(&token) {
					Ok(token)
				} else {
					Err(Error::TokenFailed("Invalid token: empty or expiring too soon".to_string()))
				}
			})
			.await
			.map_err(|err| {
				Error::TokenFailed(format!("{}: {}", ErrorCode::TokenError.default_message(), err.message()))
			})?;

		tracing::debug!(target = "mk.token", expires_at = token.expires_at, "token accepted");
		*self.current.write() = Some(token.clone());
		Ok(token)
	}

	/// Starts the self-rescheduling refresh loop, replacing any previous one.
	///
	/// The loop stops after the first failed refresh, after reporting it to
	/// `on_error`, or when the manager is dropped.
	pub fn schedule_refresh<U, E>(self: &Arc<Self>, on_refresh: U, on_error: E)
	where
		U: Fn(&Token) + Send + Sync + 'static,
		E: Fn(&Error) + Send + Sync + 'static,
	{
		let weak: Weak<Self> = Arc::downgrade(self);
		let task = tokio::spawn(async move {
			loop {
				let delay = match weak.upgrade().and_then(|m| m.current().map(|t| m.refresh_delay(&t))) {
					Some(delay) => delay,
					None => return,
				};
				tracing::debug!(target = "mk.token", delay_ms = delay.as_millis() as u64, "refresh scheduled");
				tokio::time::sleep(delay).await;

				let Some(manager) = weak.upgrade() else {
					return;
				};
				match manager.refresh().await {
					Ok(token) => on_refresh(&token),
					Err(err) => {
						tracing::warn!(target = "mk.token", error = %err, "token refresh failed");
						on_error(&err);
						return;
					}
				}
			}
		});

		if let Some(previous) = self.refresh_task.lock().replace(task) {
			previous.abort();
		}
	}

	pub fn cancel_refresh(&self) {
		if let Some(task) = self.refresh_task.lock().take() {
			task.abort();
		}
	}

	pub fn has_scheduled_refresh(&self) -> bool {
		self.refresh_task.lock().as_ref().is_some_and(|task| !task.is_finished())
	}
}

impl Drop for TokenManager {
	fn drop(&mut self) {
		self.cancel_refresh();
	}
}
