//! Seams to the external map engine.
//!
//! The engine is a single, script-loaded, process-wide runtime with an
//! imperative object API. These traits are the only way the rest of the
//! workspace touches it, so a browser binding and the [`headless`] engine
//! are interchangeable.
//!
//! Engine objects are shared as `Arc<dyn Trait>`; identity is pointer
//! identity. [`DowncastSync`] lets tests and tooling recover the concrete
//! type.
//!
//! [`headless`]: crate::headless

pub mod callout;
pub mod events;
pub mod geometry;

use std::fmt;
use std::sync::Arc;

use downcast_rs::{DowncastSync, impl_downcast};
use mk_protocol::{AnnotationOptions, ImageStyle, MapOptions, MarkerStyle, OverlayStyle, Size};

pub use callout::CalloutDelegate;
pub use events::{
	AnnotationEvent, AnnotationEventKind, AnnotationListener, ListenerId, MapEvent, MapEventDetail, MapEventKind,
	MapListener, next_listener_id,
};
pub use geometry::{CoordinateRegion, CoordinateSpan, DomPoint, DomRect, EdgePadding, LatLng};

use crate::dom::{DomNode, ElementHandle};
use crate::error::Result;

/// Resolves the current authorization token whenever the engine asks.
pub type AuthorizationCallback = Arc<dyn Fn() -> Result<String> + Send + Sync>;

/// Arguments for the one-time engine initialization.
#[derive(Clone)]
pub struct EngineInit {
	pub authorization: AuthorizationCallback,
	pub language: String,
}

impl fmt::Debug for EngineInit {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("EngineInit").field("language", &self.language).finish_non_exhaustive()
	}
}

/// Produces the node for a custom annotation at the given coordinate.
pub type ElementFactory = Arc<dyn Fn(LatLng, &AnnotationOptions) -> ElementHandle + Send + Sync>;

#[derive(Clone)]
pub enum AnnotationAppearance {
	Marker(MarkerStyle),
	Image(ImageStyle),
	Element(ElementFactory),
}

impl AnnotationAppearance {
	pub fn label(&self) -> &'static str {
		match self {
			AnnotationAppearance::Marker(_) => "marker",
			AnnotationAppearance::Image(_) => "image",
			AnnotationAppearance::Element(_) => "custom",
		}
	}
}

impl fmt::Debug for AnnotationAppearance {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			AnnotationAppearance::Marker(style) => f.debug_tuple("Marker").field(style).finish(),
			AnnotationAppearance::Image(style) => f.debug_tuple("Image").field(style).finish(),
			AnnotationAppearance::Element(_) => f.write_str("Element(..)"),
		}
	}
}

/// Everything needed to construct one engine annotation.
#[derive(Debug, Clone)]
pub struct AnnotationInit {
	pub coordinate: LatLng,
	pub appearance: AnnotationAppearance,
	/// Options as supplied; `padding` is carried validated in [`Self::padding`].
	pub options: AnnotationOptions,
	pub padding: Option<EdgePadding>,
	/// Marks the synthetic "current location" marker.
	pub location_marker: bool,
}

impl AnnotationInit {
	pub fn marker(coordinate: LatLng, style: MarkerStyle, options: AnnotationOptions) -> Self {
		Self {
			coordinate,
			appearance: AnnotationAppearance::Marker(style),
			options,
			padding: None,
			location_marker: false,
		}
	}

	pub fn location_marker(coordinate: LatLng) -> Self {
		Self {
			location_marker: true,
			..Self::marker(coordinate, MarkerStyle::default(), AnnotationOptions::default())
		}
	}
}

#[derive(Debug, Clone, PartialEq)]
pub enum OverlayShape {
	/// Radius in meters.
	Circle { center: LatLng, radius: f64 },
	Polyline(Vec<LatLng>),
	/// First ring is the outline, later rings are holes.
	Polygon(Vec<Vec<LatLng>>),
}

impl OverlayShape {
	pub fn label(&self) -> &'static str {
		match self {
			OverlayShape::Circle { .. } => "circle",
			OverlayShape::Polyline(_) => "polyline",
			OverlayShape::Polygon(_) => "polygon",
		}
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct OverlayInit {
	pub shape: OverlayShape,
	pub style: OverlayStyle,
}

/// A group of annotations the engine collapsed into one.
pub struct ClusterAnnotation {
	pub coordinate: LatLng,
	pub clustering_identifier: Option<String>,
	pub members: Vec<Arc<dyn EngineAnnotation>>,
}

/// Map-level callback producing the annotation drawn for a cluster.
///
/// Returning `None` leaves the engine's default representation.
pub type ClusterFactory = Arc<dyn Fn(&ClusterAnnotation) -> Option<Arc<dyn EngineAnnotation>> + Send + Sync>;

/// The engine runtime.
pub trait Engine: Send + Sync {
	/// Whether the engine namespace exists (scripts have run).
	fn is_available(&self) -> bool;

	fn init(&self, init: EngineInit) -> Result<()>;

	fn create_map(&self, container: Arc<dyn HostContainer>, options: &MapOptions) -> Result<Arc<dyn EngineMap>>;

	fn create_annotation(&self, init: AnnotationInit) -> Result<Arc<dyn EngineAnnotation>>;

	fn create_overlay(&self, init: OverlayInit) -> Result<Arc<dyn EngineOverlay>>;
}

/// One live map bound to a host container.
pub trait EngineMap: DowncastSync {
	fn add_annotation(&self, annotation: &Arc<dyn EngineAnnotation>) -> Result<()>;

	fn remove_annotation(&self, annotation: &Arc<dyn EngineAnnotation>) -> Result<()>;

	fn add_overlay(&self, overlay: &Arc<dyn EngineOverlay>) -> Result<()>;

	fn remove_overlay(&self, overlay: &Arc<dyn EngineOverlay>) -> Result<()>;

	fn annotations(&self) -> Vec<Arc<dyn EngineAnnotation>>;

	fn overlays(&self) -> Vec<Arc<dyn EngineOverlay>>;

	/// Adds any missing annotations and moves the viewport to show them.
	fn show_items(&self, annotations: &[Arc<dyn EngineAnnotation>], animate: bool) -> Result<()>;

	fn set_region_animated(&self, region: CoordinateRegion, animate: bool) -> Result<()>;

	fn region(&self) -> CoordinateRegion;

	fn convert_coordinate_to_point_on_page(&self, coordinate: LatLng) -> DomPoint;

	fn set_cluster_factory(&self, factory: Option<ClusterFactory>);

	fn add_event_listener(&self, kind: MapEventKind, listener: MapListener) -> ListenerId;

	/// Returns `false` if the listener was not registered.
	fn remove_event_listener(&self, id: ListenerId) -> bool;

	fn destroy(&self);
}

impl_downcast!(sync EngineMap);

pub trait EngineAnnotation: DowncastSync {
	/// Opaque engine handle number, stable for the object's lifetime.
	fn handle_id(&self) -> u64;

	fn coordinate(&self) -> LatLng;

	fn title(&self) -> Option<String>;

	fn is_location_marker(&self) -> bool;

	fn set_callout(&self, delegate: Option<CalloutDelegate>);

	fn add_event_listener(&self, kind: AnnotationEventKind, listener: AnnotationListener) -> ListenerId;

	fn remove_event_listener(&self, id: ListenerId) -> bool;
}

impl_downcast!(sync EngineAnnotation);

pub trait EngineOverlay: DowncastSync {
	fn handle_id(&self) -> u64;

	fn shape(&self) -> OverlayShape;
}

impl_downcast!(sync EngineOverlay);

/// The host element a map is mounted into.
pub trait HostContainer: Send + Sync {
	/// Position and size in page coordinates.
	fn bounding_rect(&self) -> DomRect;

	fn scroll_offset(&self) -> DomPoint;

	/// Lays out a detached node and returns its rendered size.
	fn measure(&self, node: &DomNode) -> Size;
}
