//! Serializable data for declarative map scenes.
//!
//! Everything here is plain data: coordinates and regions as callers write
//! them, annotation and overlay specs, declarative callout content, map and
//! session options, and the token response shape returned by the token
//! endpoint. Validation and conversion into engine-native shapes live in
//! `mk-runtime` and `mk-rs`.
//!
//! Field names are camelCase on the wire so scene documents match what web
//! hosts already produce.

pub mod annotation;
pub mod content;
pub mod geometry;
pub mod options;
pub mod overlay;
pub mod scene;
pub mod session;

pub use annotation::{AnnotationKind, AnnotationOptions, AnnotationSpec, ImageSet, ImageStyle, MarkerStyle};
pub use content::{ContentNode, ElementNode};
pub use geometry::{Coordinate, Padding, Point, Region, Size, Span};
pub use options::{CollisionMode, ColorScheme, DisplayPriority, Distances, FeatureVisibility, MapOptions, MapType};
pub use overlay::{OverlayGeometry, OverlaySpec, OverlayStyle, PolygonPoints};
pub use scene::{SceneDocument, SceneItemSpec};
pub use session::{SessionOptions, TokenResponse};

#[cfg(test)]
mod tests;
