//! End-to-end tests for mounting a map view over a headless session.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use mk::protocol::{Coordinate, MapOptions, MapType, SessionOptions, TokenResponse};
use mk::runtime::headless::{HeadlessAnnotation, HeadlessContainer, HeadlessEngine, HeadlessMap};
use mk::runtime::{DomRect, MapEventDetail, MapEventKind, TokenProvider};
use mk::{
	AnnotationDescriptor, ErrorCode, MapConfig, MapEventHandlers, MapSurface, MapView, OverlayDescriptor, SceneItem,
	Session, SessionPhase, Viewport, surface,
};
use parking_lot::Mutex;

fn unix_now() -> i64 {
	SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs() as i64
}

fn provider() -> Arc<dyn TokenProvider> {
	Arc::new(|| async {
		Ok(TokenResponse {
			token: "signed".to_string(),
			expires_at: unix_now() + 3600,
		})
	})
}

fn session(engine: &Arc<HeadlessEngine>) -> Session {
	Session::new(SessionOptions::default(), engine.clone(), engine.clone(), provider())
}

fn container() -> Arc<HeadlessContainer> {
	Arc::new(HeadlessContainer::new(DomRect::new(0.0, 0.0, 640.0, 480.0)))
}

type Errors = Arc<Mutex<Vec<mk::Error>>>;

fn sink() -> (Errors, mk::ErrorSink) {
	let errors: Errors = Arc::new(Mutex::new(Vec::new()));
	let captured = errors.clone();
	(errors, Arc::new(move |err: &mk::Error| captured.lock().push(err.clone())))
}

#[tokio::test]
async fn test_mount_waits_for_session_and_applies_defaults() {
	let engine = Arc::new(HeadlessEngine::new());
	let session = session(&engine);
	let (errors, on_error) = sink();
	let appeared = Arc::new(AtomicUsize::new(0));
	let a = appeared.clone();
	let config = MapConfig::default()
		.with_options(MapOptions {
			map_type: Some(MapType::Hybrid),
			..MapOptions::default()
		})
		.on_appear(move |_| {
			a.fetch_add(1, Ordering::SeqCst);
		});

	let view = MapView::mount(&session, container(), config, on_error).await.unwrap();

	assert_eq!(session.phase(), SessionPhase::Ready);
	assert_eq!(session.lease_count(), 1);
	assert_eq!(appeared.load(Ordering::SeqCst), 1);
	let map = view.map().clone().downcast_arc::<HeadlessMap>().ok().unwrap();
	assert_eq!(map.options().map_type, Some(MapType::Hybrid));
	assert_eq!(map.options().is_scroll_enabled, Some(true));
	assert_eq!(map.options().shows_user_location, Some(true));
	assert!(map.has_cluster_factory());
	assert!(errors.lock().is_empty());
}

#[tokio::test]
async fn test_scene_updates_flow_through_the_view() {
	let engine = Arc::new(HeadlessEngine::new());
	let session = session(&engine);
	let (_, on_error) = sink();
	let view = MapView::mount(&session, container(), MapConfig::default(), on_error).await.unwrap();

	let pin = Coordinate::new(37.3349, -122.009);
	let items: Vec<SceneItem> = vec![
		AnnotationDescriptor::marker(pin).title("Apple Park").into(),
		OverlayDescriptor::circle(pin, 250.0).into(),
	];
	let live = view.update_scene(&items);
	assert_eq!(live.len(), 2);
	assert_eq!(view.map().annotations().len(), 1);
	assert_eq!(view.map().overlays().len(), 1);

	view.update_scene(&items[..1]);
	assert!(view.map().overlays().is_empty());
	assert_eq!(view.live().len(), 1);
}

#[tokio::test]
async fn test_failed_session_is_reported_and_surfaced() {
	let engine = Arc::new(HeadlessEngine::new());
	engine.fail_init("bad credentials");
	let session = session(&engine);
	let (errors, on_error) = sink();

	let err = MapView::mount(&session, container(), MapConfig::default(), on_error)
		.await
		.unwrap_err();

	assert_eq!(err.code(), ErrorCode::InitError);
	assert_eq!(errors.lock().len(), 1);
	assert_eq!(session.lease_count(), 0);
	match surface(&session.phase()) {
		MapSurface::Failed(message) => assert!(message.contains("bad credentials")),
		other => panic!("expected a failure surface, got {other:?}"),
	}
}

#[tokio::test]
async fn test_drop_tears_everything_down() {
	let engine = Arc::new(HeadlessEngine::new());
	let session = session(&engine);
	let (errors, on_error) = sink();
	let view = MapView::mount(&session, container(), MapConfig::default(), on_error).await.unwrap();

	let live = view.update_scene(&[AnnotationDescriptor::marker(Coordinate::new(1.0, 1.0))
		.on_select(|_, _| {})
		.into()]);
	view.bind_map_events(&MapEventHandlers::new().on(MapEventKind::SingleTap, |_, _| {}));
	let map = view.map().clone().downcast_arc::<HeadlessMap>().ok().unwrap();
	let annotation = live[0]
		.object
		.as_annotation()
		.unwrap()
		.clone()
		.downcast_arc::<HeadlessAnnotation>()
		.ok()
		.unwrap();
	assert_eq!(map.listener_count(), 1);
	assert_eq!(annotation.listener_count(), 1);

	drop(view);

	assert!(map.is_destroyed());
	assert_eq!(annotation.listener_count(), 0);
	assert_eq!(session.lease_count(), 0);
	assert_eq!(session.phase(), SessionPhase::Idle);
	assert!(!session.has_scheduled_refresh());
	assert!(errors.lock().is_empty());
}

#[tokio::test]
async fn test_rebinding_map_events_replaces_handlers() {
	let engine = Arc::new(HeadlessEngine::new());
	let session = session(&engine);
	let (_, on_error) = sink();
	let view = MapView::mount(&session, container(), MapConfig::default(), on_error).await.unwrap();
	let (first, second) = (Arc::new(AtomicUsize::new(0)), Arc::new(AtomicUsize::new(0)));

	let f = first.clone();
	view.bind_map_events(&MapEventHandlers::new().on(MapEventKind::RegionChangeEnd, move |_, _| {
		f.fetch_add(1, Ordering::SeqCst);
	}));
	let s = second.clone();
	view.bind_map_events(&MapEventHandlers::new().on(MapEventKind::RegionChangeEnd, move |_, _| {
		s.fetch_add(1, Ordering::SeqCst);
	}));

	let map = view.map().clone().downcast_arc::<HeadlessMap>().ok().unwrap();
	map.emit(MapEventKind::RegionChangeEnd, MapEventDetail::default());
	assert_eq!(first.load(Ordering::SeqCst), 0);
	assert_eq!(second.load(Ordering::SeqCst), 1);
	assert_eq!(map.listener_count(), 1);
}

#[tokio::test]
async fn test_viewport_errors_reach_the_sink() {
	let engine = Arc::new(HeadlessEngine::new());
	let session = session(&engine);
	let (errors, on_error) = sink();
	let view = MapView::mount(&session, container(), MapConfig::default(), on_error).await.unwrap();

	view.set_viewport(&Viewport::location(Coordinate::new(40.0, -74.0))).unwrap();
	assert!(view.set_viewport(&Viewport::location(Coordinate::new(-95.0, 0.0))).is_err());

	let errors = errors.lock();
	assert_eq!(errors.len(), 1);
	assert_eq!(errors[0].code(), ErrorCode::ValidationError);
}

#[test]
fn test_surface_follows_phase() {
	assert_eq!(surface(&SessionPhase::Idle), MapSurface::Idle);
	assert_eq!(surface(&SessionPhase::Loading), MapSurface::Loading);
	assert_eq!(surface(&SessionPhase::Ready), MapSurface::Ready);
	assert_eq!(
		surface(&SessionPhase::Error(mk::Error::Unknown(String::new()))),
		MapSurface::Failed(mk::map_view::GENERIC_FAILURE.to_string())
	);
}
