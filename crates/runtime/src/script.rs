//! Engine script injection.
//!
//! The runtime script is injected once per process, then any configured
//! libraries are injected concurrently. A resource whose element id is
//! already present in the host document is treated as loaded.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use futures_util::future::try_join_all;
use mk_protocol::SessionOptions;

use crate::error::{Error, Result};
use crate::inflight::InFlight;
use crate::retry::RetryPolicy;

const CDN_BASE: &str = "https://cdn.apple-mapkit.com/mk";

/// A script element to add to the host document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScriptResource {
	/// Element id used to detect an existing injection.
	pub id: String,
	pub src: String,
}

impl ScriptResource {
	pub fn runtime(version: &str) -> Self {
		Self {
			id: "mapkit-js".to_string(),
			src: format!("{CDN_BASE}/{version}/mapkit.js"),
		}
	}

	pub fn library(version: &str, library: &str) -> Self {
		Self {
			id: format!("mk-{library}"),
			src: format!("{CDN_BASE}/{version}/{library}.js"),
		}
	}
}

/// The host document scripts are injected into.
#[async_trait]
pub trait ScriptHost: Send + Sync {
	/// Whether an element with this id already exists.
	fn contains(&self, id: &str) -> bool;

	/// Adds the script and resolves once it has loaded.
	///
	/// On failure the host must remove the element it added, so a retry
	/// injects afresh instead of finding a dead element.
	async fn inject(&self, resource: &ScriptResource) -> Result<()>;
}

/// Injects the runtime and library scripts exactly once.
pub struct ScriptLoader {
	host: Arc<dyn ScriptHost>,
	policy: RetryPolicy,
	loaded: AtomicBool,
	pending: InFlight<()>,
}

impl ScriptLoader {
	pub fn new(host: Arc<dyn ScriptHost>, policy: RetryPolicy) -> Self {
		Self {
			host,
			policy,
			loaded: AtomicBool::new(false),
			pending: InFlight::new(),
		}
	}

	pub fn is_loaded(&self) -> bool {
		self.loaded.load(Ordering::SeqCst)
	}

	/// Loads every script `options` names. Concurrent callers share one load;
	/// a failed load may be retried by a later call.
	pub async fn load(&self, options: &SessionOptions) -> Result<()> {
		if self.is_loaded() {
			return Ok(());
		}

		let host = self.host.clone();
		let policy = self.policy;
		let runtime = ScriptResource::runtime(&options.version);
		let libraries: Vec<ScriptResource> = options
			.libraries
			.iter()
			.map(|lib| ScriptResource::library(&options.version, lib))
			.collect();

		let op = self.pending.join_or_start(move || async move {
			load_with_retry(&host, policy, &runtime).await?;
			try_join_all(libraries.iter().map(|lib| load_with_retry(&host, policy, lib))).await?;
			Ok(())
		});

		let result = op.clone().await;
		match &result {
			Ok(()) => self.loaded.store(true, Ordering::SeqCst),
			Err(_) => self.pending.clear_if(&op),
		}
		result
	}
}

async fn load_with_retry(host: &Arc<dyn ScriptHost>, policy: RetryPolicy, resource: &ScriptResource) -> Result<()> {
	if host.contains(&resource.id) {
		tracing::debug!(target = "mk.script", id = %resource.id, "script already present");
		return Ok(());
	}

	policy
		.run("script load", |attempt| async move {
			tracing::debug!(target = "mk.script", src = %resource.src, attempt, "injecting script");
			host.inject(resource).await
		})
		.await
		.map_err(|err| Error::LoadFailed(format!("Failed to load {}: {}", resource.src, err.message())))
}
