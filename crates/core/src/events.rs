//! Entity- and map-scoped event bindings.
//!
//! Binding returns a single [`Cleanup`] that removes exactly the listeners it
//! added. Listeners hold the map and entity weakly so a binding never keeps
//! an engine object alive.

use std::fmt;
use std::sync::{Arc, Weak};

use mk_runtime::{
	AnnotationEventKind, Cleanup, EngineAnnotation, EngineMap, LatLng, ListenerId, MapEvent, MapEventKind,
};
use serde::Serialize;

pub type AnnotationHandler = Arc<dyn Fn(&Arc<dyn EngineMap>, &Arc<dyn EngineAnnotation>) + Send + Sync>;

/// Drag handlers also receive the coordinate the annotation was dragged to.
pub type DragHandler = Arc<dyn Fn(&Arc<dyn EngineMap>, &Arc<dyn EngineAnnotation>, LatLng) + Send + Sync>;

pub type MapHandler = Arc<dyn Fn(&Arc<dyn EngineMap>, &MapEvent) + Send + Sync>;

/// Optional callbacks for one annotation.
#[derive(Clone, Default)]
pub struct AnnotationHandlers {
	pub on_select: Option<AnnotationHandler>,
	pub on_deselect: Option<AnnotationHandler>,
	pub on_drag: Option<DragHandler>,
	pub on_drag_start: Option<AnnotationHandler>,
	pub on_drag_end: Option<AnnotationHandler>,
}

impl AnnotationHandlers {
	pub fn is_empty(&self) -> bool {
		self.on_select.is_none()
			&& self.on_deselect.is_none()
			&& self.on_drag.is_none()
			&& self.on_drag_start.is_none()
			&& self.on_drag_end.is_none()
	}

	pub fn on_select<F>(mut self, f: F) -> Self
	where
		F: Fn(&Arc<dyn EngineMap>, &Arc<dyn EngineAnnotation>) + Send + Sync + 'static,
	{
		self.on_select = Some(Arc::new(f));
		self
	}

	pub fn on_deselect<F>(mut self, f: F) -> Self
	where
		F: Fn(&Arc<dyn EngineMap>, &Arc<dyn EngineAnnotation>) + Send + Sync + 'static,
	{
		self.on_deselect = Some(Arc::new(f));
		self
	}

	pub fn on_drag<F>(mut self, f: F) -> Self
	where
		F: Fn(&Arc<dyn EngineMap>, &Arc<dyn EngineAnnotation>, LatLng) + Send + Sync + 'static,
	{
		self.on_drag = Some(Arc::new(f));
		self
	}

	pub fn on_drag_start<F>(mut self, f: F) -> Self
	where
		F: Fn(&Arc<dyn EngineMap>, &Arc<dyn EngineAnnotation>) + Send + Sync + 'static,
	{
		self.on_drag_start = Some(Arc::new(f));
		self
	}

	pub fn on_drag_end<F>(mut self, f: F) -> Self
	where
		F: Fn(&Arc<dyn EngineMap>, &Arc<dyn EngineAnnotation>) + Send + Sync + 'static,
	{
		self.on_drag_end = Some(Arc::new(f));
		self
	}
}

impl fmt::Debug for AnnotationHandlers {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("AnnotationHandlers")
			.field("on_select", &self.on_select.is_some())
			.field("on_deselect", &self.on_deselect.is_some())
			.field("on_drag", &self.on_drag.is_some())
			.field("on_drag_start", &self.on_drag_start.is_some())
			.field("on_drag_end", &self.on_drag_end.is_some())
			.finish()
	}
}

/// Which handlers are set. Part of the payload so adding or removing a
/// handler rebinds the annotation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HandlerSlots {
	pub on_select: bool,
	pub on_deselect: bool,
	pub on_drag: bool,
	pub on_drag_start: bool,
	pub on_drag_end: bool,
}

impl AnnotationHandlers {
	pub fn slots(&self) -> HandlerSlots {
		HandlerSlots {
			on_select: self.on_select.is_some(),
			on_deselect: self.on_deselect.is_some(),
			on_drag: self.on_drag.is_some(),
			on_drag_start: self.on_drag_start.is_some(),
			on_drag_end: self.on_drag_end.is_some(),
		}
	}
}

/// Attaches `handlers` to `entity`. Only handlers that are set get a listener.
pub fn bind_annotation(
	map: &Arc<dyn EngineMap>,
	entity: &Arc<dyn EngineAnnotation>,
	handlers: &AnnotationHandlers,
) -> Cleanup {
	let weak_map: Weak<dyn EngineMap> = Arc::downgrade(map);
	let weak_entity: Weak<dyn EngineAnnotation> = Arc::downgrade(entity);
	let mut ids: Vec<ListenerId> = Vec::new();

	let simple = [
		(AnnotationEventKind::Select, &handlers.on_select),
		(AnnotationEventKind::Deselect, &handlers.on_deselect),
		(AnnotationEventKind::DragStart, &handlers.on_drag_start),
		(AnnotationEventKind::DragEnd, &handlers.on_drag_end),
	];
	for (kind, handler) in simple {
		let Some(handler) = handler.clone() else {
			continue;
		};
		let (m, e) = (weak_map.clone(), weak_entity.clone());
		ids.push(entity.add_event_listener(
			kind,
			Arc::new(move |_| {
				if let (Some(map), Some(entity)) = (m.upgrade(), e.upgrade()) {
					handler(&map, &entity);
				}
			}),
		));
	}

	if let Some(handler) = handlers.on_drag.clone() {
		let (m, e) = (weak_map.clone(), weak_entity.clone());
		ids.push(entity.add_event_listener(
			AnnotationEventKind::Dragging,
			Arc::new(move |event| {
				if let (Some(map), Some(entity)) = (m.upgrade(), e.upgrade()) {
					let coordinate = event.coordinate.unwrap_or_else(|| entity.coordinate());
					handler(&map, &entity, coordinate);
				}
			}),
		));
	}

	if ids.is_empty() {
		return Cleanup::noop();
	}

	Cleanup::from_fn(move || {
		if let Some(entity) = weak_entity.upgrade() {
			for id in ids {
				entity.remove_event_listener(id);
			}
		}
	})
}

/// Map-level handlers keyed by event kind.
#[derive(Clone, Default)]
pub struct MapEventHandlers {
	handlers: Vec<(MapEventKind, MapHandler)>,
}

impl MapEventHandlers {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn on<F>(mut self, kind: MapEventKind, f: F) -> Self
	where
		F: Fn(&Arc<dyn EngineMap>, &MapEvent) + Send + Sync + 'static,
	{
		self.handlers.push((kind, Arc::new(f)));
		self
	}

	pub fn len(&self) -> usize {
		self.handlers.len()
	}

	pub fn is_empty(&self) -> bool {
		self.handlers.is_empty()
	}
}

impl fmt::Debug for MapEventHandlers {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_list()
			.entries(self.handlers.iter().map(|(kind, _)| kind.as_str()))
			.finish()
	}
}

pub fn bind_map(map: &Arc<dyn EngineMap>, handlers: &MapEventHandlers) -> Cleanup {
	let weak_map: Weak<dyn EngineMap> = Arc::downgrade(map);
	let ids: Vec<ListenerId> = handlers
		.handlers
		.iter()
		.map(|(kind, handler)| {
			let (m, handler) = (weak_map.clone(), handler.clone());
			map.add_event_listener(
				*kind,
				Arc::new(move |event| {
					if let Some(map) = m.upgrade() {
						handler(&map, event);
					}
				}),
			)
		})
		.collect();

	if ids.is_empty() {
		return Cleanup::noop();
	}

	Cleanup::from_fn(move || {
		if let Some(map) = weak_map.upgrade() {
			for id in ids {
				map.remove_event_listener(id);
			}
		}
	})
}

#[cfg(test)]
mod tests {
	use std::sync::atomic::{AtomicUsize, Ordering};

	use mk_protocol::{MapOptions, MarkerStyle};
	use mk_runtime::engine::MapEventDetail;
	use mk_runtime::headless::{HeadlessAnnotation, HeadlessContainer, HeadlessEngine, HeadlessMap};
	use mk_runtime::{AnnotationInit, DomRect, Engine};
	use parking_lot::Mutex;

	use super::*;

	fn fixture() -> (Arc<dyn EngineMap>, Arc<dyn EngineAnnotation>) {
		let engine = HeadlessEngine::preloaded();
		let map = engine
			.create_map(
				Arc::new(HeadlessContainer::new(DomRect::new(0.0, 0.0, 100.0, 100.0))),
				&MapOptions::default(),
			)
			.unwrap();
		let ann = engine
			.create_annotation(AnnotationInit::marker(
				LatLng::new(1.0, 1.0),
				MarkerStyle::default(),
				Default::default(),
			))
			.unwrap();
		(map, ann)
	}

	fn headless(ann: &Arc<dyn EngineAnnotation>) -> Arc<HeadlessAnnotation> {
		ann.clone().downcast_arc::<HeadlessAnnotation>().ok().unwrap()
	}

	#[test]
	fn test_handlers_receive_map_and_entity() {
		let (map, ann) = fixture();
		let selected = Arc::new(AtomicUsize::new(0));
		let s = selected.clone();
		let expected = ann.handle_id();
		let handlers = AnnotationHandlers::default().on_select(move |_, entity| {
			assert_eq!(entity.handle_id(), expected);
			s.fetch_add(1, Ordering::SeqCst);
		});

		let _cleanup = bind_annotation(&map, &ann, &handlers);
		headless(&ann).emit(AnnotationEventKind::Select);

		assert_eq!(selected.load(Ordering::SeqCst), 1);
	}

	#[test]
	fn test_drag_reports_new_coordinate() {
		let (map, ann) = fixture();
		let seen = Arc::new(Mutex::new(None));
		let s = seen.clone();
		let handlers = AnnotationHandlers::default().on_drag(move |_, _, coordinate| {
			*s.lock() = Some(coordinate);
		});

		let _cleanup = bind_annotation(&map, &ann, &handlers);
		headless(&ann).drag_to(LatLng::new(2.0, 3.0));

		assert_eq!(*seen.lock(), Some(LatLng::new(2.0, 3.0)));
	}

	#[test]
	fn test_cleanup_removes_only_its_own_listeners() {
		let (map, ann) = fixture();
		let foreign = ann.add_event_listener(AnnotationEventKind::Select, Arc::new(|_| {}));
		let handlers = AnnotationHandlers::default()
			.on_select(|_, _| {})
			.on_deselect(|_, _| {})
			.on_drag_end(|_, _| {});

		let cleanup = bind_annotation(&map, &ann, &handlers);
		assert_eq!(headless(&ann).listener_count(), 4);

		cleanup.run().unwrap();
		cleanup.run().unwrap();
		assert_eq!(headless(&ann).listener_count(), 1);
		assert!(ann.remove_event_listener(foreign));
	}

	#[test]
	fn test_no_handlers_binds_nothing() {
		let (map, ann) = fixture();
		let cleanup = bind_annotation(&map, &ann, &AnnotationHandlers::default());
		assert!(cleanup.is_spent());
		assert_eq!(headless(&ann).listener_count(), 0);
	}

	#[test]
	fn test_map_handlers_bind_and_unbind() {
		let (map, _) = fixture();
		let taps = Arc::new(AtomicUsize::new(0));
		let t = taps.clone();
		let handlers = MapEventHandlers::new()
			.on(MapEventKind::SingleTap, move |_, event| {
				assert!(event.detail.coordinate.is_some());
				t.fetch_add(1, Ordering::SeqCst);
			})
			.on(MapEventKind::RegionChangeEnd, |_, _| {});

		let cleanup = bind_map(&map, &handlers);
		let hm = map.clone().downcast_arc::<HeadlessMap>().ok().unwrap();
		hm.emit(
			MapEventKind::SingleTap,
			MapEventDetail {
				coordinate: Some(LatLng::new(0.0, 0.0)),
				..Default::default()
			},
		);
		assert_eq!(taps.load(Ordering::SeqCst), 1);
		assert_eq!(hm.listener_count(), 2);

		cleanup.run().unwrap();
		assert_eq!(hm.listener_count(), 0);
	}
}
