//! Annotation specs: the data half of an annotation descriptor.
//!
//! Callbacks (event handlers, callout content factories) cannot be serialized
//! and live on the descriptor in `mk-rs`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::content::ContentNode;
use crate::geometry::{Coordinate, Padding, Point, Size};
use crate::options::{CollisionMode, DisplayPriority, FeatureVisibility};

/// Options shared by every annotation kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationOptions {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub title: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub subtitle: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub accessibility_label: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub data: Option<Map<String, Value>>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub draggable: Option<bool>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub visible: Option<bool>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub enabled: Option<bool>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub selected: Option<bool>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub callout_enabled: Option<bool>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub animates: Option<bool>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub appearance_animation: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub anchor_offset: Option<Point>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub callout_offset: Option<Point>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub size: Option<Size>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub display_priority: Option<DisplayPriority>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub collision_mode: Option<CollisionMode>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub padding: Option<Padding>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub clustering_identifier: Option<String>,
}

/// Balloon-style marker appearance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerStyle {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub color: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub glyph_color: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub glyph_text: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub glyph_image: Option<ImageSet>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub selected_glyph_image: Option<ImageSet>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub title_visibility: Option<FeatureVisibility>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub subtitle_visibility: Option<FeatureVisibility>,
}

/// Image URLs keyed by device pixel ratio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageSet {
	#[serde(rename = "1")]
	pub x1: String,
	#[serde(rename = "2", default, skip_serializing_if = "Option::is_none")]
	pub x2: Option<String>,
	#[serde(rename = "3", default, skip_serializing_if = "Option::is_none")]
	pub x3: Option<String>,
}

impl ImageSet {
	pub fn single(url: impl Into<String>) -> Self {
		Self {
			x1: url.into(),
			x2: None,
			x3: None,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageStyle {
	pub url: ImageSet,
}

/// What the engine draws for an annotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum AnnotationKind {
	Marker(MarkerStyle),
	Image(ImageStyle),
	/// Host-rendered content mounted into a node the engine positions.
	Custom { content: ContentNode },
}

impl AnnotationKind {
	pub fn label(&self) -> &'static str {
		match self {
			AnnotationKind::Marker(_) => "marker",
			AnnotationKind::Image(_) => "image",
			AnnotationKind::Custom { .. } => "custom",
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationSpec {
	/// Caller-supplied identity. When absent the scene assigns a positional id.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub id: Option<String>,
	pub coordinate: Coordinate,
	#[serde(flatten)]
	pub kind: AnnotationKind,
	#[serde(default)]
	pub options: AnnotationOptions,
}

impl AnnotationSpec {
	pub fn new(coordinate: Coordinate, kind: AnnotationKind) -> Self {
		Self {
			id: None,
			coordinate,
			kind,
			options: AnnotationOptions::default(),
		}
	}
}
