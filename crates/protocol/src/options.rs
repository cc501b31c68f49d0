//! Map construction options and the engine's enumerated constants.

use serde::{Deserialize, Serialize};

use crate::geometry::{Padding, Region};

/// Visibility of an optional map control or label.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FeatureVisibility {
	#[default]
	Adaptive,
	Hidden,
	Visible,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MapType {
	#[default]
	Standard,
	MutedStandard,
	Hybrid,
	Satellite,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ColorScheme {
	Light,
	Dark,
	#[default]
	Adaptive,
}

/// Unit system used by the scale control.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Distances {
	#[default]
	Adaptive,
	Imperial,
	Metric,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CollisionMode {
	#[default]
	Rectangle,
	Circle,
	None,
}

/// Annotation display priority. The engine accepts any number; the named
/// constants are the levels it documents.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DisplayPriority(pub f64);

impl DisplayPriority {
	pub const LOW: Self = Self(250.0);
	pub const HIGH: Self = Self(750.0);
	pub const REQUIRED: Self = Self(1000.0);
}

impl Default for DisplayPriority {
	fn default() -> Self {
		Self::HIGH
	}
}

/// Options used when constructing an engine map.
///
/// Every field is optional on input; [`MapOptions::with_defaults`] fills the
/// four fields the host always sets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapOptions {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub map_type: Option<MapType>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub color_scheme: Option<ColorScheme>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub distances: Option<Distances>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub region: Option<Region>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub padding: Option<Padding>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub is_scroll_enabled: Option<bool>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub is_zoom_enabled: Option<bool>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub is_rotation_enabled: Option<bool>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub shows_user_location: Option<bool>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub tracking_user_location: Option<bool>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub shows_compass: Option<FeatureVisibility>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub shows_scale: Option<FeatureVisibility>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub shows_zoom_control: Option<bool>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub shows_map_type_control: Option<bool>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub shows_points_of_interest: Option<bool>,
}

impl MapOptions {
	/// Fills unset host defaults: scrolling on, user location shown, adaptive
	/// compass, zoom control shown.
	pub fn with_defaults(mut self) -> Self {
		self.is_scroll_enabled.get_or_insert(true);
		self.shows_user_location.get_or_insert(true);
		self.shows_compass.get_or_insert(FeatureVisibility::Adaptive);
		self.shows_zoom_control.get_or_insert(true);
		self
	}
}
