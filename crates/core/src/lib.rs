//! Declarative map scenes on top of an imperative map engine.
//!
//! Callers describe what should be on the map as a list of
//! [`SceneItem`]s and hand it to a [`MapView`] on every change. The scene
//! reconciler diffs each pass against what is live and issues the minimal
//! set of engine mutations; callouts and custom annotations are rendered
//! from declarative [`ContentNode`] trees.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//!
//! use mk::{AnnotationDescriptor, CalloutSpec, ContentNode, MapConfig, MapView, Viewport};
//! use mk::protocol::Coordinate;
//!
//! let view = MapView::mount(&session, container, MapConfig::default(), Arc::new(|err| eprintln!("{err}"))).await?;
//! let hq = Coordinate::new(37.3349, -122.009);
//!
//! view.update_scene(&[AnnotationDescriptor::marker(hq)
//! 	.title("Apple Park")
//! 	.with_callout(CalloutSpec::new().content(|_| ContentNode::text("Cupertino")))
//! 	.into()]);
//! view.set_viewport(&Viewport::location(hq))?;
//! ```
//!
//! [`ContentNode`]: mk_protocol::ContentNode

pub mod callout;
pub mod descriptor;
pub mod events;
pub mod geometry;
pub mod map_view;
pub mod scene;
pub mod viewport;

pub use callout::{
	ArenaRenderer, CalloutBridge, CalloutSpec, ContentRenderer, MountScope, MountSlot, PlacementStrategy,
	ThreeZonePlacement,
};
pub use descriptor::{AnnotationDescriptor, OverlayDescriptor, SceneItem};
pub use events::{AnnotationHandlers, HandlerSlots, MapEventHandlers, bind_annotation, bind_map};
pub use map_view::{MapConfig, MapSurface, MapView, surface};
pub use mk_protocol::{self as protocol, ContentNode};
pub use mk_runtime::{self as runtime, Error, ErrorCode, Result, Session, SessionPhase};
pub use scene::{EntityObject, ErrorSink, LiveEntity, SceneReconciler};
pub use viewport::{Viewport, ViewportController};
