//! Serialized scene passes.

use serde::{Deserialize, Serialize};

use crate::annotation::AnnotationSpec;
use crate::geometry::{Coordinate, Region};
use crate::overlay::OverlaySpec;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SceneItemSpec {
	Annotation(AnnotationSpec),
	Overlay(OverlaySpec),
}

/// One complete re-description of a scene plus the viewport to apply with it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneDocument {
	#[serde(default)]
	pub items: Vec<SceneItemSpec>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub location: Option<Coordinate>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub region: Option<Region>,
}
