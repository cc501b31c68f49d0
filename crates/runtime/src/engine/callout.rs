//! The callout delegate the engine consults when an annotation is selected.
//!
//! Every slot is optional; the engine falls back to its built-in callout for
//! anything left unset. All callbacks are synchronous because the engine
//! calls them from inside its own selection handling.

use std::fmt;
use std::sync::Arc;

use mk_protocol::Size;

use super::EngineAnnotation;
use super::geometry::DomPoint;
use crate::dom::ElementHandle;

pub type CalloutElementFn = Arc<dyn Fn(&Arc<dyn EngineAnnotation>) -> ElementHandle + Send + Sync>;
pub type CalloutAnchorFn = Arc<dyn Fn(&Arc<dyn EngineAnnotation>, Size) -> DomPoint + Send + Sync>;
pub type CalloutPredicateFn = Arc<dyn Fn(&Arc<dyn EngineAnnotation>) -> bool + Send + Sync>;
pub type CalloutAnimationFn = Arc<dyn Fn(&Arc<dyn EngineAnnotation>) -> String + Send + Sync>;

#[derive(Clone, Default)]
pub struct CalloutDelegate {
	/// Replaces the entire callout.
	pub element: Option<CalloutElementFn>,
	/// Body of the default callout frame.
	pub content: Option<CalloutElementFn>,
	pub left_accessory: Option<CalloutElementFn>,
	pub right_accessory: Option<CalloutElementFn>,
	/// Offset of the callout relative to the annotation, given the callout size.
	pub anchor_offset: Option<CalloutAnchorFn>,
	pub should_appear: Option<CalloutPredicateFn>,
	pub should_animate: Option<CalloutPredicateFn>,
	pub appearance_animation: Option<CalloutAnimationFn>,
}

impl CalloutDelegate {
	pub fn is_empty(&self) -> bool {
		self.element.is_none()
			&& self.content.is_none()
			&& self.left_accessory.is_none()
			&& self.right_accessory.is_none()
			&& self.anchor_offset.is_none()
			&& self.should_appear.is_none()
			&& self.should_animate.is_none()
			&& self.appearance_animation.is_none()
	}
}

impl fmt::Debug for CalloutDelegate {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("CalloutDelegate")
			.field("element", &self.element.is_some())
			.field("content", &self.content.is_some())
			.field("left_accessory", &self.left_accessory.is_some())
			.field("right_accessory", &self.right_accessory.is_some())
			.field("anchor_offset", &self.anchor_offset.is_some())
			.field("should_appear", &self.should_appear.is_some())
			.field("should_animate", &self.should_animate.is_some())
			.field("appearance_animation", &self.appearance_animation.is_some())
			.finish()
	}
}
