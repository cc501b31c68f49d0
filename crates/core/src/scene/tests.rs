use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use mk_protocol::{ContentNode, Coordinate, MapOptions, Size};
use mk_runtime::headless::{EngineOp, HeadlessAnnotation, HeadlessContainer, HeadlessEngine, HeadlessMap};
use mk_runtime::{
	AnnotationAppearance, AnnotationEventKind, AnnotationInit, DomRect, Engine, EngineAnnotation, EngineInit, EngineMap,
	EngineOverlay, Error, ErrorCode, HostContainer, OverlayInit, Result,
};
use parking_lot::Mutex;

use super::*;
use crate::callout::{ArenaRenderer, CalloutBridge, CalloutSpec, ThreeZonePlacement};
use crate::descriptor::{AnnotationDescriptor, OverlayDescriptor, SceneItem};

struct Fixture {
	engine: Arc<HeadlessEngine>,
	map: Arc<dyn EngineMap>,
	reconciler: SceneReconciler,
	errors: Arc<Mutex<Vec<Error>>>,
}

fn fixture_with(engine: Arc<HeadlessEngine>, scene_engine: Arc<dyn Engine>) -> Fixture {
	let container = Arc::new(HeadlessContainer::new(DomRect::new(0.0, 0.0, 400.0, 400.0)));
	let map = engine.create_map(container.clone(), &MapOptions::default()).unwrap();
	let errors = Arc::new(Mutex::new(Vec::new()));
	let sink = errors.clone();
	let bridge = CalloutBridge::new(container, Arc::new(ArenaRenderer), Arc::new(ThreeZonePlacement::default()));
	let reconciler = SceneReconciler::new(scene_engine, bridge, Arc::new(move |err: &Error| sink.lock().push(err.clone())));
	engine.drain_ops();
	Fixture {
		engine,
		map,
		reconciler,
		errors,
	}
}

fn fixture() -> Fixture {
	let engine = Arc::new(HeadlessEngine::preloaded());
	fixture_with(engine.clone(), engine)
}

fn at(latitude: f64, longitude: f64) -> Coordinate {
	Coordinate::new(latitude, longitude)
}

fn marker(latitude: f64) -> SceneItem {
	AnnotationDescriptor::marker(at(latitude, 0.0)).into()
}

fn headless(entity: &LiveEntity) -> Arc<HeadlessAnnotation> {
	entity
		.object
		.as_annotation()
		.unwrap()
		.clone()
		.downcast_arc::<HeadlessAnnotation>()
		.ok()
		.unwrap()
}

fn ids(entities: &[LiveEntity]) -> Vec<&str> {
	entities.iter().map(|e| e.id.as_str()).collect()
}

#[test]
fn test_unchanged_pass_is_a_no_op() {
	let f = fixture();
	let items: Vec<SceneItem> = vec![marker(1.0), OverlayDescriptor::circle(at(0.0, 0.0), 50.0).into(), marker(2.0)];

	let first = f.reconciler.reconcile(&f.map, &items);
	assert_eq!(f.engine.drain_ops().len(), 6);

	let second = f.reconciler.reconcile(&f.map, &items);
	assert!(f.engine.drain_ops().is_empty());
	let handles = |entities: &[LiveEntity]| entities.iter().map(|e| e.object.handle_id()).collect::<Vec<_>>();
	assert_eq!(handles(&first), handles(&second));
	assert!(f.errors.lock().is_empty());
}

#[test]
fn test_positional_ids_count_per_kind() {
	let f = fixture();
	let items: Vec<SceneItem> = vec![
		marker(1.0),
		OverlayDescriptor::polyline(vec![at(0.0, 0.0), at(1.0, 1.0)]).into(),
		AnnotationDescriptor::marker(at(2.0, 0.0)).with_id("hq").into(),
		marker(3.0),
	];

	let live = f.reconciler.reconcile(&f.map, &items);
	assert_eq!(ids(&live), ["annotation-0", "overlay-0", "hq", "annotation-2"]);
}

#[test]
fn test_emptying_scene_destroys_and_cleans_up_once() {
	let f = fixture();
	let selects = Arc::new(AtomicUsize::new(0));
	let s = selects.clone();
	let items: Vec<SceneItem> = vec![
		AnnotationDescriptor::marker(at(1.0, 1.0))
			.with_id("a")
			.on_select(move |_, _| {
				s.fetch_add(1, Ordering::SeqCst);
			})
			.with_callout(CalloutSpec::new().content(|_| ContentNode::text("hi")))
			.into(),
	];

	let live = f.reconciler.reconcile(&f.map, &items);
	let ann = headless(&live[0]);
	assert_eq!(ann.listener_count(), 1);
	assert!(ann.open_callout(Size::new(50.0, 20.0)).is_some());
	assert_eq!(f.reconciler.callouts().total_mounted(), 1);
	assert_eq!(f.reconciler.pending_cleanups(), 1);
	f.engine.drain_ops();

	let live = f.reconciler.reconcile(&f.map, &[]);
	assert!(live.is_empty());
	assert_eq!(
		f.engine.drain_ops(),
		vec![EngineOp::RemoveAnnotation {
			map: map_handle(&f.map),
			handle: ann.handle_id(),
		}]
	);
	assert_eq!(ann.listener_count(), 0);
	assert!(ann.callout().is_none());
	assert_eq!(f.reconciler.callouts().total_mounted(), 0);
	assert_eq!(f.reconciler.pending_cleanups(), 0);

	ann.emit(AnnotationEventKind::Select);
	assert_eq!(selects.load(Ordering::SeqCst), 0);
	assert!(f.errors.lock().is_empty());
}

fn map_handle(map: &Arc<dyn EngineMap>) -> u64 {
	map.clone().downcast_arc::<HeadlessMap>().ok().unwrap().handle()
}

#[test]
fn test_changed_coordinate_replaces_entity() {
	let f = fixture();
	let first = f.reconciler.reconcile(&f.map, &[AnnotationDescriptor::marker(at(1.0, 1.0)).with_id("a").into()]);
	f.engine.drain_ops();

	let second = f.reconciler.reconcile(&f.map, &[AnnotationDescriptor::marker(at(1.5, 1.0)).with_id("a").into()]);
	let old = first[0].object.handle_id();
	let new = second[0].object.handle_id();
	assert_ne!(old, new);

	let map = map_handle(&f.map);
	assert_eq!(
		f.engine.drain_ops(),
		vec![
			EngineOp::RemoveAnnotation { map, handle: old },
			EngineOp::CreateAnnotation {
				handle: new,
				kind: "marker".to_string(),
			},
			EngineOp::AddAnnotation { map, handle: new },
		]
	);
	assert_eq!(f.map.annotations().len(), 1);
}

#[test]
fn test_removals_happen_before_creations() {
	let f = fixture();
	let a = f.reconciler.reconcile(&f.map, &[AnnotationDescriptor::marker(at(1.0, 1.0)).with_id("a").into()]);
	f.engine.drain_ops();

	f.reconciler.reconcile(&f.map, &[AnnotationDescriptor::marker(at(2.0, 2.0)).with_id("b").into()]);
	let ops = f.engine.drain_ops();
	assert!(matches!(&ops[0], EngineOp::RemoveAnnotation { handle, .. } if *handle == a[0].object.handle_id()));
	assert!(matches!(&ops[1], EngineOp::CreateAnnotation { .. }));
}

#[test]
fn test_unchanged_entity_uses_latest_handlers() {
	let f = fixture();
	let (first, second) = (Arc::new(AtomicUsize::new(0)), Arc::new(AtomicUsize::new(0)));
	let pass = |counter: Arc<AtomicUsize>| -> Vec<SceneItem> {
		vec![
			AnnotationDescriptor::marker(at(1.0, 1.0))
				.on_select(move |_, _| {
					counter.fetch_add(1, Ordering::SeqCst);
				})
				.into(),
		]
	};

	let live = f.reconciler.reconcile(&f.map, &pass(first.clone()));
	f.engine.drain_ops();
	f.reconciler.reconcile(&f.map, &pass(second.clone()));
	assert!(f.engine.drain_ops().is_empty());

	headless(&live[0]).emit(AnnotationEventKind::Select);
	assert_eq!(first.load(Ordering::SeqCst), 0);
	assert_eq!(second.load(Ordering::SeqCst), 1);
}

#[test]
fn test_unchanged_entity_uses_latest_callout_content() {
	let f = fixture();
	let pass = |text: &'static str| -> Vec<SceneItem> {
		vec![
			AnnotationDescriptor::marker(at(1.0, 1.0))
				.with_callout(CalloutSpec::new().content(move |_| ContentNode::text(text)))
				.into(),
		]
	};

	let live = f.reconciler.reconcile(&f.map, &pass("before"));
	f.reconciler.reconcile(&f.map, &pass("after"));

	let shown = headless(&live[0]).open_callout(Size::new(80.0, 20.0)).unwrap();
	assert_eq!(shown.content.unwrap().snapshot().unwrap().text_content(), "after");
}

#[test]
fn test_adding_a_callout_slot_recreates() {
	let f = fixture();
	let first = f.reconciler.reconcile(&f.map, &[marker(1.0)]);
	let second = f.reconciler.reconcile(
		&f.map,
		&[AnnotationDescriptor::marker(at(1.0, 0.0))
			.with_callout(CalloutSpec::new().content(|_| ContentNode::text("x")))
			.into()],
	);
	assert_ne!(first[0].object.handle_id(), second[0].object.handle_id());
	assert!(headless(&second[0]).callout().is_some());
}

#[test]
fn test_custom_content_is_mounted_and_released() {
	let f = fixture();
	let content: ContentNode = ContentNode::element("div")
		.class("pin")
		.style("width", "24px")
		.style("height", "24px")
		.child("A")
		.into();
	let live = f.reconciler.reconcile(&f.map, &[AnnotationDescriptor::custom(at(0.0, 0.0), content).into()]);

	let node = headless(&live[0]).render_element().unwrap();
	let snapshot = node.snapshot().unwrap();
	assert_eq!(snapshot.style("position"), Some("relative"));
	assert_eq!(snapshot.style("pointer-events"), Some("auto"));
	assert_eq!(snapshot.style("width"), Some("24px"));

	f.reconciler.reconcile(&f.map, &[]);
	assert!(!node.is_attached());
}

#[test]
fn test_cluster_representative_shows_member_count() {
	let f = fixture();
	f.reconciler.install_cluster_policy(&f.map);
	let items: Vec<SceneItem> = (0..5).map(|i| marker(i as f64)).collect();
	let live = f.reconciler.reconcile(&f.map, &items);

	let map = f.map.clone().downcast_arc::<HeadlessMap>().ok().unwrap();
	let members = live.iter().filter_map(|e| e.object.as_annotation().cloned()).collect();
	let cluster = map.cluster(members).unwrap();
	let cluster = cluster.downcast_arc::<HeadlessAnnotation>().ok().unwrap();

	assert_eq!(cluster.title().as_deref(), Some("5"));
	assert_eq!(cluster.glyph_text().as_deref(), Some("5"));
	assert_eq!(cluster.coordinate().latitude, 2.0);

	f.reconciler.teardown(&f.map);
	assert!(!map.has_cluster_factory());
}

#[test]
fn test_invalid_descriptor_is_skipped_and_reported() {
	let f = fixture();
	let items: Vec<SceneItem> = vec![
		marker(1.0),
		AnnotationDescriptor::marker(at(91.0, 0.0)).with_id("bad").into(),
		OverlayDescriptor::circle(at(0.0, 0.0), -5.0).into(),
		marker(2.0),
	];

	let live = f.reconciler.reconcile(&f.map, &items);
	assert_eq!(ids(&live), ["annotation-0", "annotation-2"]);

	let errors = f.errors.lock();
	assert_eq!(errors.len(), 2);
	assert!(errors.iter().all(|e| e.code() == ErrorCode::ValidationError));
	assert_eq!(errors[0].message(), "Invalid latitude: 91. Must be between -90 and 90");
}

struct NoOverlays(Arc<HeadlessEngine>);

impl Engine for NoOverlays {
	fn is_available(&self) -> bool {
		self.0.is_available()
	}

	fn init(&self, init: EngineInit) -> Result<()> {
		self.0.init(init)
	}

	fn create_map(&self, container: Arc<dyn HostContainer>, options: &MapOptions) -> Result<Arc<dyn EngineMap>> {
		self.0.create_map(container, options)
	}

	fn create_annotation(&self, init: AnnotationInit) -> Result<Arc<dyn EngineAnnotation>> {
		self.0.create_annotation(init)
	}

	fn create_overlay(&self, _init: OverlayInit) -> Result<Arc<dyn EngineOverlay>> {
		Err(Error::InitFailed("overlay support unavailable".to_string()))
	}
}

#[test]
fn test_engine_failure_is_normalized_and_isolated() {
	let engine = Arc::new(HeadlessEngine::preloaded());
	let f = fixture_with(engine.clone(), Arc::new(NoOverlays(engine)));
	let items: Vec<SceneItem> = vec![
		OverlayDescriptor::circle(at(0.0, 0.0), 10.0).with_id("ring").into(),
		marker(1.0),
	];

	let live = f.reconciler.reconcile(&f.map, &items);
	assert_eq!(ids(&live), ["annotation-0"]);

	let errors = f.errors.lock();
	assert_eq!(errors.len(), 1);
	assert_eq!(errors[0].code(), ErrorCode::UnknownError);
	assert_eq!(
		errors[0].message(),
		"failed to create overlay \"ring\": overlay support unavailable"
	);
}

/// Renders custom content eagerly, then refuses to create the annotation.
struct RejectsAfterRender(Arc<HeadlessEngine>);

impl Engine for RejectsAfterRender {
	fn is_available(&self) -> bool {
		self.0.is_available()
	}

	fn init(&self, init: EngineInit) -> Result<()> {
		self.0.init(init)
	}

	fn create_map(&self, container: Arc<dyn HostContainer>, options: &MapOptions) -> Result<Arc<dyn EngineMap>> {
		self.0.create_map(container, options)
	}

	fn create_annotation(&self, init: AnnotationInit) -> Result<Arc<dyn EngineAnnotation>> {
		if let AnnotationAppearance::Element(factory) = &init.appearance {
			factory(init.coordinate, &init.options);
		}
		Err(Error::InitFailed("annotation rejected".to_string()))
	}

	fn create_overlay(&self, init: OverlayInit) -> Result<Arc<dyn EngineOverlay>> {
		self.0.create_overlay(init)
	}
}

#[test]
fn test_failed_creation_releases_rendered_content() {
	let engine = Arc::new(HeadlessEngine::preloaded());
	let f = fixture_with(engine.clone(), Arc::new(RejectsAfterRender(engine)));
	let items: Vec<SceneItem> = vec![AnnotationDescriptor::custom(at(0.0, 0.0), ContentNode::text("pin")).into()];

	let live = f.reconciler.reconcile(&f.map, &items);
	assert!(live.is_empty());
	assert_eq!(f.errors.lock().len(), 1);
	assert_eq!(f.reconciler.callouts().total_mounted(), 0);
	assert_eq!(f.reconciler.pending_cleanups(), 0);
}

#[test]
fn test_duplicate_ids_keep_first_occurrence() {
	let f = fixture();
	let items: Vec<SceneItem> = vec![
		AnnotationDescriptor::marker(at(1.0, 1.0)).with_id("x").title("first").into(),
		AnnotationDescriptor::marker(at(2.0, 2.0)).with_id("x").title("second").into(),
		OverlayDescriptor::circle(at(0.0, 0.0), 1.0).with_id("x").into(),
	];

	let live = f.reconciler.reconcile(&f.map, &items);
	assert_eq!(ids(&live), ["x", "x"]);
	assert_eq!(live[0].object.as_annotation().unwrap().title().as_deref(), Some("first"));
	assert!(live[1].object.as_overlay().is_some());

	let errors = f.errors.lock();
	assert_eq!(errors.len(), 1);
	assert_eq!(errors[0].code(), ErrorCode::ValidationError);
}

#[test]
fn test_teardown_empties_map() {
	let f = fixture();
	f.reconciler.install_cluster_policy(&f.map);
	f.reconciler.reconcile(
		&f.map,
		&[
			marker(1.0),
			OverlayDescriptor::polygon(vec![at(0.0, 0.0), at(0.0, 1.0), at(1.0, 1.0)]).into(),
		],
	);

	f.reconciler.teardown(&f.map);
	assert!(f.map.annotations().is_empty());
	assert!(f.map.overlays().is_empty());
	assert!(f.reconciler.is_empty());
	assert_eq!(f.reconciler.pending_cleanups(), 0);
	assert!(f.errors.lock().is_empty());

}
