//! Engine event names and listener shapes.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use super::geometry::{CoordinateRegion, LatLng};

/// Identifies one registered listener so it can be removed precisely.
pub type ListenerId = u64;

static NEXT_LISTENER_ID: AtomicU64 = AtomicU64::new(1);

/// Returns a new process-unique listener ID.
pub fn next_listener_id() -> ListenerId {
	NEXT_LISTENER_ID.fetch_add(1, Ordering::SeqCst)
}

/// Events fired on a single annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnnotationEventKind {
	Select,
	Deselect,
	Dragging,
	DragStart,
	DragEnd,
}

impl AnnotationEventKind {
	pub const ALL: [AnnotationEventKind; 5] = [
		AnnotationEventKind::Select,
		AnnotationEventKind::Deselect,
		AnnotationEventKind::Dragging,
		AnnotationEventKind::DragStart,
		AnnotationEventKind::DragEnd,
	];

	/// Engine event name.
	pub fn as_str(self) -> &'static str {
		match self {
			AnnotationEventKind::Select => "select",
			AnnotationEventKind::Deselect => "deselect",
			AnnotationEventKind::Dragging => "dragging",
			AnnotationEventKind::DragStart => "drag-start",
			AnnotationEventKind::DragEnd => "drag-end",
		}
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationEvent {
	pub kind: AnnotationEventKind,
	/// Present on drag events.
	pub coordinate: Option<LatLng>,
}

pub type AnnotationListener = Arc<dyn Fn(&AnnotationEvent) + Send + Sync>;

/// Events fired on the map itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MapEventKind {
	RegionChangeStart,
	RegionChangeEnd,
	RotationStart,
	RotationEnd,
	ScrollStart,
	ScrollEnd,
	ZoomStart,
	ZoomEnd,
	MapTypeChange,
	UserLocationChange,
	UserLocationError,
	SingleTap,
	DoubleTap,
	LongPress,
}

impl MapEventKind {
	pub fn as_str(self) -> &'static str {
		match self {
			MapEventKind::RegionChangeStart => "region-change-start",
			MapEventKind::RegionChangeEnd => "region-change-end",
			MapEventKind::RotationStart => "rotation-start",
			MapEventKind::RotationEnd => "rotation-end",
			MapEventKind::ScrollStart => "scroll-start",
			MapEventKind::ScrollEnd => "scroll-end",
			MapEventKind::ZoomStart => "zoom-start",
			MapEventKind::ZoomEnd => "zoom-end",
			MapEventKind::MapTypeChange => "map-type-change",
			MapEventKind::UserLocationChange => "user-location-change",
			MapEventKind::UserLocationError => "user-location-error",
			MapEventKind::SingleTap => "single-tap",
			MapEventKind::DoubleTap => "double-tap",
			MapEventKind::LongPress => "long-press",
		}
	}
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MapEventDetail {
	/// Tap/press location or the new user location.
	pub coordinate: Option<LatLng>,
	/// Region after a region change.
	pub region: Option<CoordinateRegion>,
	/// User location error code and message.
	pub error: Option<(i32, String)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapEvent {
	pub kind: MapEventKind,
	pub detail: MapEventDetail,
}

pub type MapListener = Arc<dyn Fn(&MapEvent) + Send + Sync>;
