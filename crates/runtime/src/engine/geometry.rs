//! Engine-native geometry.
//!
//! Values of these types have crossed the validation boundary (see the
//! geometry bridge in `mk-rs`) or were produced by the engine itself.

use mk_protocol::Size;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLng {
	pub latitude: f64,
	pub longitude: f64,
}

impl LatLng {
	pub fn new(latitude: f64, longitude: f64) -> Self {
		Self { latitude, longitude }
	}
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateSpan {
	pub latitude_delta: f64,
	pub longitude_delta: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateRegion {
	pub center: LatLng,
	pub span: CoordinateSpan,
}

impl CoordinateRegion {
	/// The whole world, used before any region is set.
	pub const WORLD: Self = Self {
		center: LatLng {
			latitude: 0.0,
			longitude: 0.0,
		},
		span: CoordinateSpan {
			latitude_delta: 180.0,
			longitude_delta: 360.0,
		},
	};
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EdgePadding {
	pub top: f64,
	pub right: f64,
	pub bottom: f64,
	pub left: f64,
}

/// A point in page or container pixel space.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DomPoint {
	pub x: f64,
	pub y: f64,
}

impl DomPoint {
	pub fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DomRect {
	pub x: f64,
	pub y: f64,
	pub width: f64,
	pub height: f64,
}

impl DomRect {
	pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
		Self { x, y, width, height }
	}

	pub fn size(&self) -> Size {
		Size::new(self.width, self.height)
	}
}
