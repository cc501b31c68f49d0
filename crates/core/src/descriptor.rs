//! Scene descriptors: what callers hand to the reconciler on every pass.
//!
//! A descriptor is the serializable spec from `mk-protocol` plus the parts
//! that cannot be serialized (event handlers, callout content factories).
//! Its [payload](AnnotationDescriptor::payload) is the value the reconciler
//! diffs.

use std::sync::Arc;

use mk_protocol::{
	AnnotationKind, AnnotationOptions, AnnotationSpec, ContentNode, Coordinate, ImageSet, ImageStyle, MarkerStyle,
	OverlayGeometry, OverlaySpec, OverlayStyle, PolygonPoints, SceneItemSpec,
};
use mk_runtime::{EngineAnnotation, EngineMap, LatLng, Result};
use serde_json::Value;

use crate::callout::CalloutSpec;
use crate::events::AnnotationHandlers;

#[derive(Debug, Clone)]
pub struct AnnotationDescriptor {
	pub spec: AnnotationSpec,
	pub callout: Option<CalloutSpec>,
	pub handlers: AnnotationHandlers,
}

impl AnnotationDescriptor {
	pub fn new(spec: AnnotationSpec) -> Self {
		Self {
			spec,
			callout: None,
			handlers: AnnotationHandlers::default(),
		}
	}

	pub fn marker(coordinate: Coordinate) -> Self {
		Self::marker_with(coordinate, MarkerStyle::default())
	}

	pub fn marker_with(coordinate: Coordinate, style: MarkerStyle) -> Self {
		Self::new(AnnotationSpec::new(coordinate, AnnotationKind::Marker(style)))
	}

	pub fn image(coordinate: Coordinate, url: impl Into<String>) -> Self {
		Self::new(AnnotationSpec::new(
			coordinate,
			AnnotationKind::Image(ImageStyle {
				url: ImageSet::single(url),
			}),
		))
	}

	pub fn custom(coordinate: Coordinate, content: impl Into<ContentNode>) -> Self {
		Self::new(AnnotationSpec::new(
			coordinate,
			AnnotationKind::Custom {
				content: content.into(),
			},
		))
	}

	pub fn with_id(mut self, id: impl Into<String>) -> Self {
		self.spec.id = Some(id.into());
		self
	}

	pub fn with_options(mut self, options: AnnotationOptions) -> Self {
		self.spec.options = options;
		self
	}

	pub fn title(mut self, title: impl Into<String>) -> Self {
		self.spec.options.title = Some(title.into());
		self
	}

	pub fn with_callout(mut self, callout: CalloutSpec) -> Self {
		self.callout = Some(callout);
		self
	}

	pub fn with_handlers(mut self, handlers: AnnotationHandlers) -> Self {
		self.handlers = handlers;
		self
	}

	pub fn on_select<F>(mut self, f: F) -> Self
	where
		F: Fn(&Arc<dyn EngineMap>, &Arc<dyn EngineAnnotation>) + Send + Sync + 'static,
	{
		self.handlers = self.handlers.on_select(f);
		self
	}

	pub fn on_drag<F>(mut self, f: F) -> Self
	where
		F: Fn(&Arc<dyn EngineMap>, &Arc<dyn EngineAnnotation>, LatLng) + Send + Sync + 'static,
	{
		self.handlers = self.handlers.on_drag(f);
		self
	}

	/// Everything that decides whether the live annotation can be kept: the
	/// spec without its id, plus which callout and handler slots are filled.
	pub fn payload(&self) -> Result<Value> {
		let mut value = serde_json::to_value(&self.spec)?;
		if let Value::Object(fields) = &mut value {
			fields.remove("id");
			fields.insert(
				"callout".to_string(),
				match &self.callout {
					Some(callout) => serde_json::to_value(callout.slots())?,
					None => Value::Null,
				},
			);
			fields.insert("handlers".to_string(), serde_json::to_value(self.handlers.slots())?);
		}
		Ok(value)
	}
}

impl From<AnnotationSpec> for AnnotationDescriptor {
	fn from(spec: AnnotationSpec) -> Self {
		Self::new(spec)
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct OverlayDescriptor {
	pub spec: OverlaySpec,
}

impl OverlayDescriptor {
	pub fn new(spec: OverlaySpec) -> Self {
		Self { spec }
	}

	/// `radius` in meters.
	pub fn circle(center: Coordinate, radius: f64) -> Self {
		Self::new(OverlaySpec::new(OverlayGeometry::Circle { center, radius }))
	}

	pub fn polyline(points: Vec<Coordinate>) -> Self {
		Self::new(OverlaySpec::new(OverlayGeometry::Polyline { points }))
	}

	pub fn polygon(points: Vec<Coordinate>) -> Self {
		Self::new(OverlaySpec::new(OverlayGeometry::Polygon {
			points: PolygonPoints::Ring(points),
		}))
	}

	/// First ring is the outline, the rest are holes.
	pub fn polygon_with_holes(rings: Vec<Vec<Coordinate>>) -> Self {
		Self::new(OverlaySpec::new(OverlayGeometry::Polygon {
			points: PolygonPoints::Rings(rings),
		}))
	}

	pub fn with_id(mut self, id: impl Into<String>) -> Self {
		self.spec.id = Some(id.into());
		self
	}

	pub fn with_style(mut self, style: OverlayStyle) -> Self {
		self.spec.style = style;
		self
	}

	pub fn payload(&self) -> Result<Value> {
		let mut value = serde_json::to_value(&self.spec)?;
		if let Value::Object(fields) = &mut value {
			fields.remove("id");
		}
		Ok(value)
	}
}

impl From<OverlaySpec> for OverlayDescriptor {
	fn from(spec: OverlaySpec) -> Self {
		Self::new(spec)
	}
}

/// One child of a map scene.
#[derive(Debug, Clone)]
pub enum SceneItem {
	Annotation(AnnotationDescriptor),
	Overlay(OverlayDescriptor),
}

impl From<AnnotationDescriptor> for SceneItem {
	fn from(descriptor: AnnotationDescriptor) -> Self {
		SceneItem::Annotation(descriptor)
	}
}

impl From<OverlayDescriptor> for SceneItem {
	fn from(descriptor: OverlayDescriptor) -> Self {
		SceneItem::Overlay(descriptor)
	}
}

impl From<SceneItemSpec> for SceneItem {
	fn from(spec: SceneItemSpec) -> Self {
		match spec {
			SceneItemSpec::Annotation(spec) => SceneItem::Annotation(spec.into()),
			SceneItemSpec::Overlay(spec) => SceneItem::Overlay(spec.into()),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn here() -> Coordinate {
		Coordinate::new(37.33, -122.03)
	}

	#[test]
	fn test_payload_ignores_id() {
		let a = AnnotationDescriptor::marker(here()).with_id("a").payload().unwrap();
		let b = AnnotationDescriptor::marker(here()).with_id("b").payload().unwrap();
		assert_eq!(a, b);
		assert!(a.get("id").is_none());
	}

	#[test]
	fn test_payload_tracks_options_and_kind() {
		let plain = AnnotationDescriptor::marker(here()).payload().unwrap();
		let titled = AnnotationDescriptor::marker(here()).title("HQ").payload().unwrap();
		let custom = AnnotationDescriptor::custom(here(), ContentNode::text("x")).payload().unwrap();
		assert_ne!(plain, titled);
		assert_ne!(plain, custom);
	}

	#[test]
	fn test_callout_slot_presence_counts_but_identity_does_not() {
		let content = |text: &'static str| {
			AnnotationDescriptor::marker(here())
				.with_callout(CalloutSpec::new().content(move |_| ContentNode::text(text)))
				.payload()
				.unwrap()
		};
		assert_eq!(content("one"), content("two"));

		let with_accessory = AnnotationDescriptor::marker(here())
			.with_callout(
				CalloutSpec::new()
					.content(|_| ContentNode::text("one"))
					.right_accessory(|_| ContentNode::text(">")),
			)
			.payload()
			.unwrap();
		assert_ne!(content("one"), with_accessory);
		assert_ne!(content("one"), AnnotationDescriptor::marker(here()).payload().unwrap());
	}

	#[test]
	fn test_handler_presence_counts() {
		let bare = AnnotationDescriptor::marker(here()).payload().unwrap();
		let selectable = AnnotationDescriptor::marker(here()).on_select(|_, _| {}).payload().unwrap();
		assert_ne!(bare, selectable);
	}

	#[test]
	fn test_overlay_payload() {
		let a = OverlayDescriptor::circle(here(), 100.0).with_id("a").payload().unwrap();
		let b = OverlayDescriptor::circle(here(), 100.0).payload().unwrap();
		let c = OverlayDescriptor::circle(here(), 150.0).payload().unwrap();
		assert_eq!(a, b);
		assert_ne!(a, c);
	}

	#[test]
	fn test_scene_item_from_spec() {
		let spec: SceneItemSpec = serde_json::from_value(serde_json::json!({
			"overlay": { "kind": "polyline", "points": [{ "latitude": 0, "longitude": 0 }] }
		}))
		.unwrap();
		assert!(matches!(SceneItem::from(spec), SceneItem::Overlay(_)));
	}
}
