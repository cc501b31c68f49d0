//! Caller-facing geometry shapes.
//!
//! These are unvalidated: a scene document may carry a latitude of 200 and it
//! still deserializes. Range checks happen when a value crosses into the
//! engine.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coordinate {
	pub latitude: f64,
	pub longitude: f64,
}

impl Coordinate {
	pub fn new(latitude: f64, longitude: f64) -> Self {
		Self { latitude, longitude }
	}
}

/// Extent of a region in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Span {
	pub latitude_delta: f64,
	pub longitude_delta: f64,
}

impl Span {
	pub fn new(latitude_delta: f64, longitude_delta: f64) -> Self {
		Self {
			latitude_delta,
			longitude_delta,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Region {
	pub center: Coordinate,
	pub span: Span,
}

impl Region {
	pub fn new(center: Coordinate, span: Span) -> Self {
		Self { center, span }
	}
}

/// Edge insets in pixels. Missing sides are zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Padding {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub top: Option<f64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub right: Option<f64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub bottom: Option<f64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub left: Option<f64>,
}

impl Padding {
	pub fn uniform(value: f64) -> Self {
		Self {
			top: Some(value),
			right: Some(value),
			bottom: Some(value),
			left: Some(value),
		}
	}
}

/// Pixel offset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
	pub x: f64,
	pub y: f64,
}

impl Point {
	pub fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
	pub width: f64,
	pub height: f64,
}

impl Size {
	pub fn new(width: f64, height: f64) -> Self {
		Self { width, height }
	}
}
