//! Overlay specs: circles, polylines and polygons with stroke/fill style.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::geometry::Coordinate;

/// Polygon vertices: one ring, or several rings where later rings are holes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PolygonPoints {
	Ring(Vec<Coordinate>),
	Rings(Vec<Vec<Coordinate>>),
}

impl PolygonPoints {
	pub fn rings(&self) -> Vec<&[Coordinate]> {
		match self {
			PolygonPoints::Ring(points) => vec![points.as_slice()],
			PolygonPoints::Rings(rings) => rings.iter().map(Vec::as_slice).collect(),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum OverlayGeometry {
	Circle { center: Coordinate, radius: f64 },
	Polyline { points: Vec<Coordinate> },
	Polygon { points: PolygonPoints },
}

impl OverlayGeometry {
	pub fn label(&self) -> &'static str {
		match self {
			OverlayGeometry::Circle { .. } => "circle",
			OverlayGeometry::Polyline { .. } => "polyline",
			OverlayGeometry::Polygon { .. } => "polygon",
		}
	}
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayStyle {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub stroke_color: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub stroke_opacity: Option<f64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub line_width: Option<f64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub line_dash: Option<Vec<f64>>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub line_dash_offset: Option<f64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub line_cap: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub line_join: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub fill_color: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub fill_opacity: Option<f64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub fill_rule: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub visible: Option<bool>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub enabled: Option<bool>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub selected: Option<bool>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub data: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlaySpec {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub id: Option<String>,
	#[serde(flatten)]
	pub geometry: OverlayGeometry,
	#[serde(default)]
	pub style: OverlayStyle,
}

impl OverlaySpec {
	pub fn new(geometry: OverlayGeometry) -> Self {
		Self {
			id: None,
			geometry,
			style: OverlayStyle::default(),
		}
	}
}
