//! Keyed reconciliation of scene descriptors onto live engine objects.
//!
//! Each pass diffs the new descriptors against the live set by id:
//!
//! 1. ids that disappeared are removed from the map and cleaned up
//! 2. ids whose payload changed are torn down
//! 3. new and torn-down ids are created, in descriptor order
//!
//! Unchanged ids cause no engine mutation; their callbacks are swapped in
//! place so the next event reaches the newest handler.

mod cluster;
mod latest;

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use mk_protocol::AnnotationKind;
use mk_runtime::{
	AnnotationAppearance, AnnotationInit, Cleanup, CleanupKey, CleanupRegistry, Engine, EngineAnnotation, EngineMap,
	EngineOverlay, Error, OverlayInit, Result,
};
use parking_lot::Mutex;
use serde_json::Value;

pub use cluster::count_marker_factory;
use latest::Latest;

use crate::callout::CalloutBridge;
use crate::descriptor::{AnnotationDescriptor, OverlayDescriptor, SceneItem};
use crate::events::bind_annotation;
use crate::geometry::{to_lat_lng, to_padding, to_shape};

/// Receives every failure the scene layer reports instead of returning.
pub type ErrorSink = Arc<dyn Fn(&Error) + Send + Sync>;

#[derive(Clone)]
pub enum EntityObject {
	Annotation(Arc<dyn EngineAnnotation>),
	Overlay(Arc<dyn EngineOverlay>),
}

impl EntityObject {
	pub fn handle_id(&self) -> u64 {
		match self {
			EntityObject::Annotation(a) => a.handle_id(),
			EntityObject::Overlay(o) => o.handle_id(),
		}
	}

	pub fn kind(&self) -> &'static str {
		match self {
			EntityObject::Annotation(_) => "annotation",
			EntityObject::Overlay(_) => "overlay",
		}
	}

	pub fn as_annotation(&self) -> Option<&Arc<dyn EngineAnnotation>> {
		match self {
			EntityObject::Annotation(a) => Some(a),
			EntityObject::Overlay(_) => None,
		}
	}

	pub fn as_overlay(&self) -> Option<&Arc<dyn EngineOverlay>> {
		match self {
			EntityObject::Overlay(o) => Some(o),
			EntityObject::Annotation(_) => None,
		}
	}
}

impl fmt::Debug for EntityObject {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}#{}", self.kind(), self.handle_id())
	}
}

/// A descriptor that made it onto the map.
#[derive(Debug, Clone)]
pub struct LiveEntity {
	pub id: String,
	/// The payload the entity was created from.
	pub payload: Value,
	pub object: EntityObject,
}

struct LiveRecord {
	entity: LiveEntity,
	cleanup: CleanupKey,
	latest: Option<Arc<Latest>>,
}

#[derive(Default)]
struct LiveSets {
	annotations: IndexMap<String, LiveRecord>,
	overlays: IndexMap<String, LiveRecord>,
	cluster: Option<CleanupKey>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Kind {
	Annotation,
	Overlay,
}

impl LiveSets {
	fn set(&self, kind: Kind) -> &IndexMap<String, LiveRecord> {
		match kind {
			Kind::Annotation => &self.annotations,
			Kind::Overlay => &self.overlays,
		}
	}

	fn set_mut(&mut self, kind: Kind) -> &mut IndexMap<String, LiveRecord> {
		match kind {
			Kind::Annotation => &mut self.annotations,
			Kind::Overlay => &mut self.overlays,
		}
	}
}

struct Planned<'a> {
	kind: Kind,
	id: String,
	payload: Value,
	item: &'a SceneItem,
}

pub struct SceneReconciler {
	engine: Arc<dyn Engine>,
	callouts: CalloutBridge,
	errors: ErrorSink,
	cleanups: CleanupRegistry,
	live: Mutex<LiveSets>,
}

impl SceneReconciler {
	pub fn new(engine: Arc<dyn Engine>, callouts: CalloutBridge, errors: ErrorSink) -> Self {
		Self {
			engine,
			callouts,
			errors,
			cleanups: CleanupRegistry::new(),
			live: Mutex::new(LiveSets::default()),
		}
	}

	pub fn callouts(&self) -> &CalloutBridge {
		&self.callouts
	}

	/// Applies one pass and returns the live entities in descriptor order.
	///
	/// Failures never abort the pass: each is reported to the error sink and
	/// only the offending descriptor is skipped.
	pub fn reconcile(&self, map: &Arc<dyn EngineMap>, items: &[SceneItem]) -> Vec<LiveEntity> {
		let mut errors = Vec::new();
		let planned = plan(items, &mut errors);

		let entities = {
			let mut live = self.live.lock();

			for kind in [Kind::Annotation, Kind::Overlay] {
				let next: HashSet<&str> = planned.iter().filter(|p| p.kind == kind).map(|p| p.id.as_str()).collect();
				let stale: Vec<String> = live
					.set(kind)
					.keys()
					.filter(|id| !next.contains(id.as_str()))
					.cloned()
					.collect();
				for id in stale {
					if let Some(record) = live.set_mut(kind).shift_remove(&id) {
						self.destroy(map, record, &mut errors);
					}
				}
			}

			for p in &planned {
				let changed = live.set(p.kind).get(&p.id).is_some_and(|r| r.entity.payload != p.payload);
				if changed {
					if let Some(record) = live.set_mut(p.kind).shift_remove(&p.id) {
						self.destroy(map, record, &mut errors);
					}
				}
			}

			for p in &planned {
				if let Some(record) = live.set(p.kind).get(&p.id) {
					if let (Some(latest), SceneItem::Annotation(d)) = (&record.latest, p.item) {
						latest.update(d.handlers.clone(), d.callout.clone());
					}
					continue;
				}
				let created = match p.item {
					SceneItem::Annotation(d) => self.create_annotation(map, &p.id, p.payload.clone(), d),
					SceneItem::Overlay(d) => self.create_overlay(map, &p.id, p.payload.clone(), d),
				};
				match created {
					Ok(record) => {
						tracing::debug!(
							target = "mk.scene",
							id = %p.id,
							handle = record.entity.object.handle_id(),
							"created {}",
							record.entity.object.kind()
						);
						live.set_mut(p.kind).insert(p.id.clone(), record);
					}
					Err(err) => errors.push(err.scoped(&format!("failed to create {} \"{}\"", label(p.kind), p.id))),
				}
			}

			planned
				.iter()
				.filter_map(|p| live.set(p.kind).get(&p.id).map(|r| r.entity.clone()))
				.collect()
		};

		self.report(errors);
		entities
	}

	/// Installs the count-marker cluster representative on `map`, replacing
	/// any previous one.
	pub fn install_cluster_policy(&self, map: &Arc<dyn EngineMap>) {
		map.set_cluster_factory(Some(count_marker_factory(self.engine.clone(), self.errors.clone())));
		let weak = Arc::downgrade(map);
		let key = self.cleanups.register(Cleanup::from_fn(move || {
			if let Some(map) = weak.upgrade() {
				map.set_cluster_factory(None);
			}
		}));
		let previous = self.live.lock().cluster.replace(key);
		if let Some(previous) = previous {
			self.cleanups.forget(previous);
		}
	}

	/// Removes every live object and runs every outstanding cleanup.
	pub fn teardown(&self, map: &Arc<dyn EngineMap>) {
		let mut errors = Vec::new();
		{
			let mut live = self.live.lock();
			let mut records: Vec<LiveRecord> = live.annotations.drain(..).map(|(_, r)| r).collect();
			records.extend(live.overlays.drain(..).map(|(_, r)| r));
			for record in records {
				self.destroy(map, record, &mut errors);
			}
			live.cluster = None;
		}
		let failed = self.cleanups.run_all();
		if failed > 0 {
			errors.push(Error::unknown(format!("{failed} cleanup(s) failed during teardown")));
		}
		tracing::debug!(target = "mk.scene", "scene torn down");
		self.report(errors);
	}

	/// Snapshot of the live set, annotations first.
	pub fn live(&self) -> Vec<LiveEntity> {
		let live = self.live.lock();
		live.annotations
			.values()
			.chain(live.overlays.values())
			.map(|r| r.entity.clone())
			.collect()
	}

	pub fn len(&self) -> usize {
		let live = self.live.lock();
		live.annotations.len() + live.overlays.len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Outstanding cleanups, including the cluster policy's.
	pub fn pending_cleanups(&self) -> usize {
		self.cleanups.len()
	}

	fn create_annotation(
		&self,
		map: &Arc<dyn EngineMap>,
		id: &str,
		payload: Value,
		descriptor: &AnnotationDescriptor,
	) -> Result<LiveRecord> {
		let spec = &descriptor.spec;
		let coordinate = to_lat_lng(&spec.coordinate)?;
		let padding = spec.options.padding.as_ref().map(to_padding).transpose()?;

		let scope = self.callouts.open_scope();
		let appearance = match &spec.kind {
			AnnotationKind::Marker(style) => AnnotationAppearance::Marker(style.clone()),
			AnnotationKind::Image(style) => AnnotationAppearance::Image(style.clone()),
			AnnotationKind::Custom { content } => {
				AnnotationAppearance::Element(self.callouts.element_factory(scope, content.clone()))
			}
		};

		let created = self.engine.create_annotation(AnnotationInit {
			coordinate,
			appearance,
			options: spec.options.clone(),
			padding,
			location_marker: false,
		});
		let annotation = match created {
			Ok(annotation) => annotation,
			Err(err) => {
				// The engine may have run the element factory before failing.
				self.callouts.release(scope);
				return Err(err);
			}
		};

		let latest = Latest::new(descriptor.handlers.clone(), descriptor.callout.clone());
		if descriptor.callout.is_some() {
			annotation.set_callout(Some(self.callouts.delegate(scope, map, &latest.forwarding_callout())));
		}
		let bindings = bind_annotation(map, &annotation, &latest.forwarding_handlers());

		let callouts = self.callouts.clone();
		let weak = Arc::downgrade(&annotation);
		let cleanup = Cleanup::all([
			bindings,
			Cleanup::from_fn(move || {
				if let Some(annotation) = weak.upgrade() {
					annotation.set_callout(None);
				}
				callouts.release(scope);
			}),
		]);

		if let Err(err) = map.add_annotation(&annotation) {
			if let Err(cleanup_err) = cleanup.run() {
				tracing::warn!(target = "mk.scene", id, error = %cleanup_err, "cleanup after failed add");
			}
			return Err(err);
		}

		Ok(LiveRecord {
			entity: LiveEntity {
				id: id.to_string(),
				payload,
				object: EntityObject::Annotation(annotation),
			},
			cleanup: self.cleanups.register(cleanup),
			latest: Some(latest),
		})
	}

	fn create_overlay(
		&self,
		map: &Arc<dyn EngineMap>,
		id: &str,
		payload: Value,
		descriptor: &OverlayDescriptor,
	) -> Result<LiveRecord> {
		let shape = to_shape(&descriptor.spec.geometry)?;

		let overlay = self.engine.create_overlay(OverlayInit {
			shape,
			style: descriptor.spec.style.clone(),
		})?;
		map.add_overlay(&overlay)?;

		Ok(LiveRecord {
			entity: LiveEntity {
				id: id.to_string(),
				payload,
				object: EntityObject::Overlay(overlay),
			},
			cleanup: self.cleanups.register(Cleanup::noop()),
			latest: None,
		})
	}

	fn destroy(&self, map: &Arc<dyn EngineMap>, record: LiveRecord, errors: &mut Vec<Error>) {
		let id = &record.entity.id;
		let removed = match &record.entity.object {
			EntityObject::Annotation(a) => map.remove_annotation(a),
			EntityObject::Overlay(o) => map.remove_overlay(o),
		};
		if let Err(err) = removed {
			errors.push(err.scoped(&format!("failed to remove {} \"{id}\"", record.entity.object.kind())));
		}
		if let Err(err) = self.cleanups.run(record.cleanup) {
			errors.push(err.scoped(&format!("cleanup for \"{id}\" failed")));
		}
		tracing::debug!(target = "mk.scene", id = %id, "destroyed {}", record.entity.object.kind());
	}

	fn report(&self, errors: Vec<Error>) {
		for err in errors {
			tracing::warn!(target = "mk.scene", code = %err.code(), error = %err, "scene error");
			(self.errors)(&err);
		}
	}
}

impl fmt::Debug for SceneReconciler {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let live = self.live.lock();
		f.debug_struct("SceneReconciler")
			.field("annotations", &live.annotations.len())
			.field("overlays", &live.overlays.len())
			.finish_non_exhaustive()
	}
}

fn label(kind: Kind) -> &'static str {
	match kind {
		Kind::Annotation => "annotation",
		Kind::Overlay => "overlay",
	}
}

/// Assigns ids and payloads. Positional ids count every item of the same
/// kind, so an explicit id elsewhere does not shift them.
fn plan<'a>(items: &'a [SceneItem], errors: &mut Vec<Error>) -> Vec<Planned<'a>> {
	let mut planned = Vec::with_capacity(items.len());
	let mut seen: HashSet<(Kind, String)> = HashSet::new();
	let (mut annotations, mut overlays) = (0usize, 0usize);

	for item in items {
		let (kind, id, payload) = match item {
			SceneItem::Annotation(d) => {
				let id = d.spec.id.clone().unwrap_or_else(|| format!("annotation-{annotations}"));
				annotations += 1;
				(Kind::Annotation, id, d.payload())
			}
			SceneItem::Overlay(d) => {
				let id = d.spec.id.clone().unwrap_or_else(|| format!("overlay-{overlays}"));
				overlays += 1;
				(Kind::Overlay, id, d.payload())
			}
		};

		if !seen.insert((kind, id.clone())) {
			errors.push(Error::validation(format!(
				"Duplicate {} id \"{id}\"; only the first occurrence is used",
				label(kind)
			)));
			continue;
		}

		match payload {
			Ok(payload) => planned.push(Planned { kind, id, payload, item }),
			Err(err) => errors.push(err.scoped(&format!("invalid {} \"{id}\"", label(kind)))),
		}
	}
	planned
}

#[cfg(test)]
mod tests;
