//! Where a callout sits relative to its annotation.

use mk_protocol::Size;
use mk_runtime::{DomPoint, DomRect};

/// Vertical third of the container an annotation falls in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zone {
	Top,
	Middle,
	Bottom,
}

/// Chooses the callout anchor offset for an annotation.
pub trait PlacementStrategy: Send + Sync {
	/// `local` is the annotation position in container space.
	fn anchor_offset(&self, local: DomPoint, container: Size, callout: Size) -> DomPoint;
}

/// Pushes the callout down by a fraction of its own height depending on the
/// vertical third the annotation is in, so callouts near the top edge open
/// below their annotation instead of off-screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThreeZonePlacement {
	pub top: f64,
	pub middle: f64,
	pub bottom: f64,
}

impl Default for ThreeZonePlacement {
	fn default() -> Self {
		Self {
			top: 1.0,
			middle: 0.5,
			bottom: 0.0,
		}
	}
}

impl ThreeZonePlacement {
	/// A zero-height container counts as middle.
	pub fn zone(y: f64, container_height: f64) -> Zone {
		if container_height <= 0.0 {
			return Zone::Middle;
		}
		let third = container_height / 3.0;
		if y < third {
			Zone::Top
		} else if y < third * 2.0 {
			Zone::Middle
		} else {
			Zone::Bottom
		}
	}
}

impl PlacementStrategy for ThreeZonePlacement {
	fn anchor_offset(&self, local: DomPoint, container: Size, callout: Size) -> DomPoint {
		let fraction = match Self::zone(local.y, container.height) {
			Zone::Top => self.top,
			Zone::Middle => self.middle,
			Zone::Bottom => self.bottom,
		};
		DomPoint::new(0.0, callout.height * fraction)
	}
}

/// Page point to container-local point.
pub fn to_container_space(page: DomPoint, rect: DomRect, scroll: DomPoint) -> DomPoint {
	DomPoint::new(page.x - rect.x - scroll.x, page.y - rect.y - scroll.y)
}
