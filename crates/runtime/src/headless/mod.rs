//! An in-process engine that records every mutation.
//!
//! [`HeadlessEngine`] implements [`Engine`] and [`ScriptHost`] without a
//! browser: scripts "load" by id, maps project coordinates linearly into
//! their container, and every engine-visible mutation is appended to an
//! operation log. Tests use it as the fake engine; the CLI replays scenes
//! against it.
//!
//! Failure injection covers the bootstrap paths: failing script loads, a
//! runtime script that never defines the engine namespace, and a failing
//! init.

mod container;
mod map;
mod objects;

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};

use async_trait::async_trait;
use mk_protocol::MapOptions;
use parking_lot::Mutex;
use serde::Serialize;

pub use container::HeadlessContainer;
pub use map::HeadlessMap;
pub use objects::{CalloutPresentation, HeadlessAnnotation, HeadlessOverlay};

use crate::engine::{
	AnnotationInit, AuthorizationCallback, Engine, EngineAnnotation, EngineInit, EngineMap, EngineOverlay,
	HostContainer, OverlayInit,
};
use crate::error::{Error, Result};
use crate::script::{ScriptHost, ScriptResource};

/// One engine-visible mutation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum EngineOp {
	InjectScript { id: String },
	Init { language: String },
	CreateMap { map: u64 },
	DestroyMap { map: u64 },
	CreateAnnotation { handle: u64, kind: String },
	AddAnnotation { map: u64, handle: u64 },
	RemoveAnnotation { map: u64, handle: u64 },
	CreateOverlay { handle: u64, kind: String },
	AddOverlay { map: u64, handle: u64 },
	RemoveOverlay { map: u64, handle: u64 },
	ShowItems { map: u64, handles: Vec<u64> },
	SetRegion { map: u64, latitude: f64, longitude: f64 },
}

/// Append-only operation log shared by an engine and its maps.
#[derive(Debug, Default)]
pub struct OpLog {
	ops: Mutex<Vec<EngineOp>>,
}

impl OpLog {
	pub(crate) fn push(&self, op: EngineOp) {
		tracing::trace!(target = "mk.headless", ?op, "engine op");
		self.ops.lock().push(op);
	}

	pub fn snapshot(&self) -> Vec<EngineOp> {
		self.ops.lock().clone()
	}

	pub fn drain(&self) -> Vec<EngineOp> {
		std::mem::take(&mut *self.ops.lock())
	}
}

const RUNTIME_SCRIPT_ID: &str = "mapkit-js";

pub struct HeadlessEngine {
	log: Arc<OpLog>,
	next_handle: Arc<AtomicU64>,
	available: AtomicBool,
	namespace_missing: AtomicBool,
	present: Mutex<HashSet<String>>,
	injections: AtomicU32,
	failing_injections: AtomicU32,
	init_calls: AtomicU32,
	init_failure: Mutex<Option<String>>,
	authorization: Mutex<Option<AuthorizationCallback>>,
	language: Mutex<Option<String>>,
}

impl Default for HeadlessEngine {
	fn default() -> Self {
		Self::new()
	}
}

impl HeadlessEngine {
	/// An engine whose scripts have not been injected yet.
	pub fn new() -> Self {
		Self {
			log: Arc::new(OpLog::default()),
			next_handle: Arc::new(AtomicU64::new(1)),
			available: AtomicBool::new(false),
			namespace_missing: AtomicBool::new(false),
			present: Mutex::new(HashSet::new()),
			injections: AtomicU32::new(0),
			failing_injections: AtomicU32::new(0),
			init_calls: AtomicU32::new(0),
			init_failure: Mutex::new(None),
			authorization: Mutex::new(None),
			language: Mutex::new(None),
		}
	}

	/// An engine whose runtime script is already on the page.
	pub fn preloaded() -> Self {
		let engine = Self::new();
		engine.present.lock().insert(RUNTIME_SCRIPT_ID.to_string());
		engine.available.store(true, Ordering::SeqCst);
		engine
	}

	pub fn log(&self) -> Arc<OpLog> {
		self.log.clone()
	}

	pub fn ops(&self) -> Vec<EngineOp> {
		self.log.snapshot()
	}

	pub fn drain_ops(&self) -> Vec<EngineOp> {
		self.log.drain()
	}

	/// Script injections attempted, including failed ones.
	pub fn injection_count(&self) -> u32 {
		self.injections.load(Ordering::SeqCst)
	}

	pub fn init_count(&self) -> u32 {
		self.init_calls.load(Ordering::SeqCst)
	}

	pub fn language(&self) -> Option<String> {
		self.language.lock().clone()
	}

	/// The next `count` injections fail.
	pub fn fail_next_injections(&self, count: u32) {
		self.failing_injections.store(count, Ordering::SeqCst);
	}

	/// Scripts load but never define the engine namespace.
	pub fn omit_namespace(&self) {
		self.namespace_missing.store(true, Ordering::SeqCst);
	}

	pub fn fail_init(&self, message: impl Into<String>) {
		*self.init_failure.lock() = Some(message.into());
	}

	/// Invokes the authorization callback the engine was initialized with.
	pub fn authorize(&self) -> Result<String> {
		let callback = self.authorization.lock().clone();
		match callback {
			Some(callback) => callback(),
			None => Err(Error::NotLoaded("engine not initialized".to_string())),
		}
	}

	fn next_handle(&self) -> u64 {
		self.next_handle.fetch_add(1, Ordering::SeqCst)
	}
}

#[async_trait]
impl ScriptHost for HeadlessEngine {
	fn contains(&self, id: &str) -> bool {
		self.present.lock().contains(id)
	}

	async fn inject(&self, resource: &ScriptResource) -> Result<()> {
		self.injections.fetch_add(1, Ordering::SeqCst);
		self.log.push(EngineOp::InjectScript {
			id: resource.id.clone(),
		});

		let failed = self
			.failing_injections
			.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
			.is_ok();
		if failed {
			return Err(Error::LoadFailed(format!("script error: {}", resource.src)));
		}

		self.present.lock().insert(resource.id.clone());
		if resource.id == RUNTIME_SCRIPT_ID && !self.namespace_missing.load(Ordering::SeqCst) {
			self.available.store(true, Ordering::SeqCst);
		}
		Ok(())
	}
}

impl Engine for HeadlessEngine {
	fn is_available(&self) -> bool {
		self.available.load(Ordering::SeqCst)
	}

	fn init(&self, init: EngineInit) -> Result<()> {
		self.init_calls.fetch_add(1, Ordering::SeqCst);
		if let Some(message) = self.init_failure.lock().clone() {
			return Err(Error::InitFailed(message));
		}
		self.log.push(EngineOp::Init {
			language: init.language.clone(),
		});
		*self.language.lock() = Some(init.language);
		*self.authorization.lock() = Some(init.authorization);
		Ok(())
	}

	fn create_map(&self, container: Arc<dyn HostContainer>, options: &MapOptions) -> Result<Arc<dyn EngineMap>> {
		if !self.is_available() {
			return Err(Error::NotLoaded("engine namespace missing".to_string()));
		}
		let handle = self.next_handle();
		self.log.push(EngineOp::CreateMap { map: handle });
		Ok(Arc::new(HeadlessMap::new(handle, container, options.clone(), self.log.clone())))
	}

	fn create_annotation(&self, init: AnnotationInit) -> Result<Arc<dyn EngineAnnotation>> {
		let handle = self.next_handle();
		self.log.push(EngineOp::CreateAnnotation {
			handle,
			kind: init.appearance.label().to_string(),
		});
		Ok(HeadlessAnnotation::new(handle, init))
	}

	fn create_overlay(&self, init: OverlayInit) -> Result<Arc<dyn EngineOverlay>> {
		let handle = self.next_handle();
		self.log.push(EngineOp::CreateOverlay {
			handle,
			kind: init.shape.label().to_string(),
		});
		Ok(Arc::new(HeadlessOverlay::new(handle, init)))
	}
}
