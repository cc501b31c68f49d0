//! Engine session lifecycle.
//!
//! A [`Session`] owns the three bootstrap steps the engine needs before any
//! map can exist: script injection, token acquisition, and the one-time
//! engine initialization. [`Session::ready`] runs them as a single spawned
//! bootstrap shared by every concurrent caller.
//!
//! ```text
//! Idle --ready()--> Loading --ok--> Ready --reset()--> Idle
//!                      |
//!                      +--failure--> Error --ready()--> Loading
//! ```
//!
//! Phase changes are published on a [`tokio::sync::watch`] channel. A failed
//! scheduled token refresh moves a `Ready` session to `Error`.

mod global;

use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use futures_util::FutureExt;
use indexmap::IndexMap;
use mk_protocol::SessionOptions;
use parking_lot::Mutex;
use tokio::sync::watch;

pub use global::{global, install, uninstall};

use crate::engine::{AuthorizationCallback, Engine, EngineInit, ListenerId, next_listener_id};
use crate::error::{Error, ErrorCode, Result};
use crate::inflight::InFlight;
use crate::retry::RetryPolicy;
use crate::script::{ScriptHost, ScriptLoader};
use crate::token::{Token, TokenManager, TokenProvider};

/// Where the session is in its bootstrap.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionPhase {
	Idle,
	Loading,
	Ready,
	Error(Error),
}

impl SessionPhase {
	pub fn is_ready(&self) -> bool {
		matches!(self, SessionPhase::Ready)
	}

	pub fn error(&self) -> Option<&Error> {
		match self {
			SessionPhase::Error(err) => Some(err),
			_ => None,
		}
	}
}

pub type ErrorListener = Arc<dyn Fn(&Error) + Send + Sync>;

type ListenerMap = Mutex<IndexMap<ListenerId, ErrorListener>>;

struct SessionInner {
	options: SessionOptions,
	engine: Arc<dyn Engine>,
	scripts: ScriptLoader,
	tokens: Arc<TokenManager>,
	initialized: AtomicBool,
	init_lock: Mutex<()>,
	pending: InFlight<()>,
	/// Orders publishing a bootstrap outcome against `reset`.
	transition: Mutex<()>,
	phase: watch::Sender<SessionPhase>,
	listeners: Arc<ListenerMap>,
	leases: AtomicUsize,
}

/// Shared handle to one engine session. Clones refer to the same session.
#[derive(Clone)]
pub struct Session {
	inner: Arc<SessionInner>,
}

impl Session {
	pub fn new(
		options: SessionOptions,
		engine: Arc<dyn Engine>,
		scripts: Arc<dyn ScriptHost>,
		tokens: Arc<dyn TokenProvider>,
	) -> Self {
		let script_policy = RetryPolicy::from_millis(options.script_load_retries, options.script_load_retry_delay);
		let token_policy = RetryPolicy::from_millis(options.token_fetch_retries, options.token_fetch_retry_delay);
		let (phase, _) = watch::channel(SessionPhase::Idle);

		Self {
			inner: Arc::new(SessionInner {
				options,
				engine,
				scripts: ScriptLoader::new(scripts, script_policy),
				tokens: Arc::new(TokenManager::new(tokens, token_policy)),
				initialized: AtomicBool::new(false),
				init_lock: Mutex::new(()),
				pending: InFlight::new(),
				transition: Mutex::new(()),
				phase,
				listeners: Arc::new(Mutex::new(IndexMap::new())),
				leases: AtomicUsize::new(0),
			}),
		}
	}

	pub fn options(&self) -> &SessionOptions {
		&self.inner.options
	}

	pub fn engine(&self) -> Arc<dyn Engine> {
		self.inner.engine.clone()
	}

	pub fn phase(&self) -> SessionPhase {
		self.inner.phase.borrow().clone()
	}

	pub fn is_ready(&self) -> bool {
		self.inner.phase.borrow().is_ready()
	}

	/// Observes phase changes.
	pub fn subscribe(&self) -> watch::Receiver<SessionPhase> {
		self.inner.phase.subscribe()
	}

	pub fn token(&self) -> Option<Token> {
		self.inner.tokens.current()
	}

	/// Provider calls made so far.
	pub fn token_fetch_count(&self) -> u64 {
		self.inner.tokens.fetch_count()
	}

	pub fn has_scheduled_refresh(&self) -> bool {
		self.inner.tokens.has_scheduled_refresh()
	}

	pub fn is_engine_initialized(&self) -> bool {
		self.inner.initialized.load(Ordering::SeqCst)
	}

	/// Registers a listener for bootstrap and refresh failures.
	pub fn on_error<F>(&self, listener: F) -> ErrorSubscription
	where
		F: Fn(&Error) + Send + Sync + 'static,
	{
		let id = next_listener_id();
		self.inner.listeners.lock().insert(id, Arc::new(listener));
		ErrorSubscription {
			id,
			listeners: Arc::downgrade(&self.inner.listeners),
		}
	}

	/// Brings the engine to a usable state.
	///
	/// Returns immediately once ready. Concurrent callers share one
	/// bootstrap; after a failure the next call starts a fresh one.
	pub async fn ready(&self) -> Result<()> {
		if self.is_ready() {
			return Ok(());
		}

		let op = self.inner.pending.join_or_start(|| {
			self.inner.phase.send_replace(SessionPhase::Loading);
			tracing::debug!(target = "mk.session", "bootstrap started");
			let inner = self.inner.clone();
			let task = tokio::spawn(async move {
				let result = match AssertUnwindSafe(inner.bootstrap()).catch_unwind().await {
					Ok(result) => result,
					Err(_) => Err(Error::Unknown("session bootstrap panicked".to_string())),
				};
				inner.finish(&result);
				result
			});
			async move { task.await.unwrap_or_else(|err| Err(Error::from(err))) }
		});

		op.await
	}

	/// [`Self::ready`], reporting a failure to `on_error` before returning it.
	pub async fn ready_with<F>(&self, on_error: F) -> Result<()>
	where
		F: FnOnce(&Error),
	{
		let result = self.ready().await;
		if let Err(err) = &result {
			on_error(err);
		}
		result
	}

	/// Cancels the refresh timer and returns to `Idle`.
	///
	/// Loaded scripts and the engine initialization are kept; the engine
	/// cannot be reloaded. A bootstrap already in flight is left to finish
	/// and publish its own outcome.
	pub fn reset(&self) {
		let _guard = self.inner.transition.lock();
		if self.inner.pending.is_pending() {
			tracing::debug!(target = "mk.session", "reset while loading; leaving bootstrap in flight");
			return;
		}
		self.inner.tokens.cancel_refresh();
		self.inner.phase.send_replace(SessionPhase::Idle);
		tracing::debug!(target = "mk.session", "session reset");
	}

	/// Takes a reference on the session. Dropping the last lease resets it.
	pub fn acquire(&self) -> SessionLease {
		self.inner.leases.fetch_add(1, Ordering::SeqCst);
		SessionLease { session: self.clone() }
	}

	pub fn lease_count(&self) -> usize {
		self.inner.leases.load(Ordering::SeqCst)
	}
}

impl std::fmt::Debug for Session {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Session")
			.field("phase", &self.phase())
			.field("leases", &self.lease_count())
			.finish_non_exhaustive()
	}
}

impl SessionInner {
	async fn bootstrap(self: &Arc<Self>) -> Result<()> {
		self.scripts.load(&self.options).await?;
		if !self.engine.is_available() {
			return Err(Error::from_code(ErrorCode::NotLoaded));
		}
		self.tokens.valid_token().await?;
		self.ensure_engine_init()
	}

	fn ensure_engine_init(&self) -> Result<()> {
		let _guard = self.init_lock.lock();
		if self.initialized.load(Ordering::SeqCst) {
			return Ok(());
		}

		let tokens = Arc::downgrade(&self.tokens);
		let authorization: AuthorizationCallback = Arc::new(move || {
			tokens
				.upgrade()
				.and_then(|t| t.current())
				.map(|t| t.value)
				.ok_or_else(|| Error::from_code(ErrorCode::TokenError))
		});

		self.engine
			.init(EngineInit {
				authorization,
				language: self.options.language.clone(),
			})
			.map_err(|err| match err {
				Error::InitFailed(_) => err,
				other => Error::InitFailed(format!(
					"{}: {}",
					ErrorCode::InitError.default_message(),
					other.message()
				)),
			})?;

		self.initialized.store(true, Ordering::SeqCst);
		tracing::info!(target = "mk.session", language = %self.options.language, "engine initialized");
		Ok(())
	}

	fn schedule_refresh(self: &Arc<Self>) {
		let weak: Weak<Self> = Arc::downgrade(self);
		self.tokens.schedule_refresh(
			|token| tracing::debug!(target = "mk.session", expires_at = token.expires_at, "token refreshed"),
			move |err| {
				if let Some(inner) = weak.upgrade() {
					inner.fail(err.clone());
				}
			},
		);
	}

	/// Publishes the bootstrap outcome. A successful one schedules the token
	/// refresh and goes `Ready` in one step with respect to `reset`, so a
	/// `Ready` session always has a refresh pending.
	fn finish(self: &Arc<Self>, result: &Result<()>) {
		match result {
			Ok(()) => {
				let _guard = self.transition.lock();
				self.schedule_refresh();
				self.phase.send_replace(SessionPhase::Ready);
				self.pending.clear();
				tracing::info!(target = "mk.session", "session ready");
			}
			Err(err) => {
				self.pending.clear();
				self.fail(err.clone());
			}
		}
	}

	fn fail(&self, err: Error) {
		tracing::warn!(target = "mk.session", code = %err.code(), error = %err, "session failed");
		self.phase.send_replace(SessionPhase::Error(err.clone()));
		let listeners: Vec<ErrorListener> = self.listeners.lock().values().cloned().collect();
		for listener in listeners {
			listener(&err);
		}
	}
}

/// RAII handle for an error listener; dropping it unregisters the listener.
pub struct ErrorSubscription {
	id: ListenerId,
	listeners: Weak<ListenerMap>,
}

impl ErrorSubscription {
	pub fn id(&self) -> ListenerId {
		self.id
	}
}

impl Drop for ErrorSubscription {
	fn drop(&mut self) {
		if let Some(listeners) = self.listeners.upgrade() {
			listeners.lock().shift_remove(&self.id);
		}
	}
}

/// Reference-counted claim on a session, held by each mounted map host.
pub struct SessionLease {
	session: Session,
}

impl SessionLease {
	pub fn session(&self) -> &Session {
		&self.session
	}
}

impl Drop for SessionLease {
	fn drop(&mut self) {
		if self.session.inner.leases.fetch_sub(1, Ordering::SeqCst) == 1 {
			self.session.reset();
		}
	}
}
