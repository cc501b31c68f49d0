//! One mounted map: the glue between a session, a host container and the
//! scene layer.

use std::fmt;
use std::sync::Arc;

use mk_protocol::MapOptions;
use mk_runtime::{
	Cleanup, EngineMap, Error, ErrorCode, ErrorSubscription, HostContainer, Result, Session, SessionLease,
	SessionPhase,
};
use parking_lot::Mutex;

use crate::callout::{ArenaRenderer, CalloutBridge, ContentRenderer, PlacementStrategy, ThreeZonePlacement};
use crate::descriptor::SceneItem;
use crate::events::{MapEventHandlers, bind_map};
use crate::scene::{ErrorSink, LiveEntity, SceneReconciler};
use crate::viewport::{Viewport, ViewportController};

/// Shown when a failure carries no message.
pub const GENERIC_FAILURE: &str = "An error occurred while loading the map";

pub type AppearFn = Arc<dyn Fn(&Arc<dyn EngineMap>) + Send + Sync>;

/// How a [`MapView`] builds its map and renders content.
#[derive(Clone)]
pub struct MapConfig {
	/// Merged over the engine defaults at mount.
	pub options: MapOptions,
	pub renderer: Arc<dyn ContentRenderer>,
	pub placement: Arc<dyn PlacementStrategy>,
	/// Called once with the new map, before any scene is applied.
	pub on_appear: Option<AppearFn>,
}

impl Default for MapConfig {
	fn default() -> Self {
		Self {
			options: MapOptions::default(),
			renderer: Arc::new(ArenaRenderer),
			placement: Arc::new(ThreeZonePlacement::default()),
			on_appear: None,
		}
	}
}

impl MapConfig {
	pub fn with_options(mut self, options: MapOptions) -> Self {
		self.options = options;
		self
	}

	pub fn with_renderer(mut self, renderer: Arc<dyn ContentRenderer>) -> Self {
		self.renderer = renderer;
		self
	}

	pub fn with_placement(mut self, placement: Arc<dyn PlacementStrategy>) -> Self {
		self.placement = placement;
		self
	}

	pub fn on_appear<F>(mut self, f: F) -> Self
	where
		F: Fn(&Arc<dyn EngineMap>) + Send + Sync + 'static,
	{
		self.on_appear = Some(Arc::new(f));
		self
	}
}

impl fmt::Debug for MapConfig {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("MapConfig")
			.field("options", &self.options)
			.field("on_appear", &self.on_appear.is_some())
			.finish_non_exhaustive()
	}
}

/// What a host should display for a session phase. A map is only shown once
/// the session is ready, never half-initialized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapSurface {
	/// Nothing yet.
	Idle,
	Loading,
	Failed(String),
	Ready,
}

pub fn surface(phase: &SessionPhase) -> MapSurface {
	match phase {
		SessionPhase::Idle => MapSurface::Idle,
		SessionPhase::Loading => MapSurface::Loading,
		SessionPhase::Ready => MapSurface::Ready,
		SessionPhase::Error(err) if err.message().is_empty() => MapSurface::Failed(GENERIC_FAILURE.to_string()),
		SessionPhase::Error(err) => MapSurface::Failed(err.message().to_string()),
	}
}

/// A live map and everything placed on it.
///
/// Dropping the view tears the scene down, unbinds map handlers, destroys
/// the engine map and releases the session lease.
pub struct MapView {
	map: Arc<dyn EngineMap>,
	scene: SceneReconciler,
	viewport: ViewportController,
	map_bindings: Mutex<Cleanup>,
	errors: ErrorSink,
	_session_errors: ErrorSubscription,
	lease: SessionLease,
}

impl MapView {
	/// Waits for the session, then creates the map in `container`.
	///
	/// Every failure is also reported to `on_error`, as are later session
	/// failures (a token refresh that gives up) while the view is alive.
	pub async fn mount(
		session: &Session,
		container: Arc<dyn HostContainer>,
		config: MapConfig,
		on_error: ErrorSink,
	) -> Result<Self> {
		let result = Self::mount_inner(session, container, config, on_error.clone()).await;
		if let Err(err) = &result {
			on_error(err);
		}
		result
	}

	async fn mount_inner(
		session: &Session,
		container: Arc<dyn HostContainer>,
		config: MapConfig,
		on_error: ErrorSink,
	) -> Result<Self> {
		session.ready().await?;

		let engine = session.engine();
		if !engine.is_available() {
			return Err(Error::from_code(ErrorCode::NotLoaded));
		}
		let map = engine
			.create_map(container.clone(), &config.options.clone().with_defaults())
			.map_err(|err| match err {
				Error::NotLoaded(_) | Error::Validation(_) => err,
				other => Error::with_message(ErrorCode::InitError, other.message()),
			})?;
		tracing::info!(target = "mk.view", "map mounted");

		let scene = SceneReconciler::new(
			engine.clone(),
			CalloutBridge::new(container, config.renderer, config.placement),
			on_error.clone(),
		);
		scene.install_cluster_policy(&map);

		if let Some(on_appear) = &config.on_appear {
			on_appear(&map);
		}

		let sink = on_error.clone();
		let session_errors = session.on_error(move |err| sink(err));

		Ok(Self {
			map,
			scene,
			viewport: ViewportController::new(engine),
			map_bindings: Mutex::new(Cleanup::noop()),
			errors: on_error,
			_session_errors: session_errors,
			lease: session.acquire(),
		})
	}

	pub fn map(&self) -> &Arc<dyn EngineMap> {
		&self.map
	}

	pub fn session(&self) -> &Session {
		self.lease.session()
	}

	/// Reconciles `items` onto the map. See [`SceneReconciler::reconcile`].
	pub fn update_scene(&self, items: &[SceneItem]) -> Vec<LiveEntity> {
		self.scene.reconcile(&self.map, items)
	}

	pub fn live(&self) -> Vec<LiveEntity> {
		self.scene.live()
	}

	pub fn set_viewport(&self, viewport: &Viewport) -> Result<()> {
		let result = self.viewport.apply(&self.map, viewport);
		if let Err(err) = &result {
			(self.errors)(err);
		}
		result
	}

	/// Replaces the map-level handlers bound by a previous call.
	pub fn bind_map_events(&self, handlers: &MapEventHandlers) {
		let next = bind_map(&self.map, handlers);
		let previous = std::mem::replace(&mut *self.map_bindings.lock(), next);
		if let Err(err) = previous.run() {
			(self.errors)(&err);
		}
	}
}

impl Drop for MapView {
	fn drop(&mut self) {
		if let Err(err) = self.map_bindings.lock().run() {
			tracing::warn!(target = "mk.view", error = %err, "unbinding map handlers failed");
		}
		self.scene.teardown(&self.map);
		self.map.destroy();
		tracing::info!(target = "mk.view", "map unmounted");
	}
}

impl fmt::Debug for MapView {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("MapView")
			.field("scene", &self.scene)
			.finish_non_exhaustive()
	}
}
