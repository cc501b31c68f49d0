//! Camera control: the "current location" marker and the visible region.

use std::sync::Arc;

use mk_protocol::{Coordinate, Region};
use mk_runtime::{AnnotationInit, Engine, EngineMap, Result};

use crate::geometry::{to_lat_lng, to_region};

/// Where the map should look. Both parts are optional and independent.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Viewport {
	/// Shown with a synthetic marker and centered.
	pub location: Option<Coordinate>,
	pub region: Option<Region>,
}

impl Viewport {
	pub fn location(location: Coordinate) -> Self {
		Self {
			location: Some(location),
			region: None,
		}
	}

	pub fn region(region: Region) -> Self {
		Self {
			location: None,
			region: Some(region),
		}
	}
}

pub struct ViewportController {
	engine: Arc<dyn Engine>,
}

impl ViewportController {
	pub fn new(engine: Arc<dyn Engine>) -> Self {
		Self { engine }
	}

	/// Replaces the location marker, then moves the camera.
	///
	/// Validation failures surface as `VALIDATION_ERROR`; anything else the
	/// engine reports becomes `UNKNOWN_ERROR`.
	pub fn apply(&self, map: &Arc<dyn EngineMap>, viewport: &Viewport) -> Result<()> {
		self.apply_inner(map, viewport)
			.map_err(|err| err.scoped("Failed to update map location/region"))
	}

	fn apply_inner(&self, map: &Arc<dyn EngineMap>, viewport: &Viewport) -> Result<()> {
		for marker in map.annotations().into_iter().filter(|a| a.is_location_marker()) {
			map.remove_annotation(&marker)?;
		}

		if let Some(location) = &viewport.location {
			let coordinate = to_lat_lng(location)?;
			let marker = self.engine.create_annotation(AnnotationInit::location_marker(coordinate))?;
			map.show_items(&[marker], true)?;
			tracing::debug!(
				target = "mk.viewport",
				latitude = coordinate.latitude,
				longitude = coordinate.longitude,
				"showing location"
			);
		}

		if let Some(region) = &viewport.region {
			let region = to_region(region)?;
			map.set_region_animated(region, true)?;
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use mk_protocol::{MapOptions, Span};
	use mk_runtime::headless::{EngineOp, HeadlessContainer, HeadlessEngine};
	use mk_runtime::{DomRect, ErrorCode, LatLng};

	use super::*;

	fn fixture() -> (Arc<HeadlessEngine>, Arc<dyn EngineMap>, ViewportController) {
		let engine = Arc::new(HeadlessEngine::preloaded());
		let map = engine
			.create_map(
				Arc::new(HeadlessContainer::new(DomRect::new(0.0, 0.0, 100.0, 100.0))),
				&MapOptions::default(),
			)
			.unwrap();
		let controller = ViewportController::new(engine.clone());
		engine.drain_ops();
		(engine, map, controller)
	}

	#[test]
	fn test_location_replaces_previous_marker() {
		let (_, map, controller) = fixture();
		controller.apply(&map, &Viewport::location(Coordinate::new(10.0, 20.0))).unwrap();
		controller.apply(&map, &Viewport::location(Coordinate::new(11.0, 21.0))).unwrap();

		let markers: Vec<_> = map.annotations().into_iter().filter(|a| a.is_location_marker()).collect();
		assert_eq!(markers.len(), 1);
		assert_eq!(markers[0].coordinate(), LatLng::new(11.0, 21.0));
		assert_eq!(map.region().center, LatLng::new(11.0, 21.0));
	}

	#[test]
	fn test_scene_annotations_are_left_alone() {
		let (engine, map, controller) = fixture();
		let pin = engine
			.create_annotation(AnnotationInit::marker(
				LatLng::new(1.0, 1.0),
				Default::default(),
				Default::default(),
			))
			.unwrap();
		map.add_annotation(&pin).unwrap();

		controller.apply(&map, &Viewport::location(Coordinate::new(5.0, 5.0))).unwrap();
		controller.apply(&map, &Viewport::default()).unwrap();

		assert_eq!(map.annotations().len(), 1);
		assert!(!map.annotations()[0].is_location_marker());
	}

	#[test]
	fn test_region_is_set_animated() {
		let (engine, map, controller) = fixture();
		let region = Region::new(Coordinate::new(48.85, 2.35), Span::new(0.1, 0.1));
		controller.apply(&map, &Viewport::region(region)).unwrap();

		assert_eq!(map.region().span.latitude_delta, 0.1);
		assert!(engine.drain_ops().iter().any(|op| matches!(
			op,
			EngineOp::SetRegion { latitude, .. } if *latitude == 48.85
		)));
	}

	#[test]
	fn test_invalid_input_is_a_validation_error() {
		let (_, map, controller) = fixture();
		let bad_region = Region::new(Coordinate::new(0.0, 0.0), Span::new(0.0, 1.0));
		let err = controller.apply(&map, &Viewport::region(bad_region)).unwrap_err();
		assert_eq!(err.code(), ErrorCode::ValidationError);

		let err = controller
			.apply(&map, &Viewport::location(Coordinate::new(0.0, 200.0)))
			.unwrap_err();
		assert_eq!(err.code(), ErrorCode::ValidationError);
	}

	#[test]
	fn test_engine_failure_is_unknown() {
		let (_, map, controller) = fixture();
		map.destroy();
		let err = controller
			.apply(&map, &Viewport::location(Coordinate::new(1.0, 1.0)))
			.unwrap_err();
		assert_eq!(err.code(), ErrorCode::UnknownError);
		assert!(err.message().starts_with("Failed to update map location/region"));
	}
}
