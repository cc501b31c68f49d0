use std::fmt;
use std::sync::Arc;

use mk_protocol::{ContentNode, Size};
use mk_runtime::engine::callout::{CalloutAnchorFn, CalloutAnimationFn, CalloutPredicateFn};
use mk_runtime::{DomPoint, EngineAnnotation};
use serde::Serialize;

/// Produces declarative content for an annotation's callout.
pub type ContentFn = Arc<dyn Fn(&Arc<dyn EngineAnnotation>) -> ContentNode + Send + Sync>;

/// Callout customization for one annotation. Unset slots keep the engine
/// default.
#[derive(Clone, Default)]
pub struct CalloutSpec {
	pub element: Option<ContentFn>,
	pub content: Option<ContentFn>,
	pub left_accessory: Option<ContentFn>,
	pub right_accessory: Option<ContentFn>,
	/// Overrides the placement strategy.
	pub anchor_offset: Option<CalloutAnchorFn>,
	pub should_appear: Option<CalloutPredicateFn>,
	pub should_animate: Option<CalloutPredicateFn>,
	pub appearance_animation: Option<CalloutAnimationFn>,
}

/// Which slots a [`CalloutSpec`] fills. Part of a descriptor's payload, so
/// adding or removing a slot recreates the annotation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalloutSlots {
	pub element: bool,
	pub content: bool,
	pub left_accessory: bool,
	pub right_accessory: bool,
	pub anchor_offset: bool,
	pub should_appear: bool,
	pub should_animate: bool,
	pub appearance_animation: bool,
}

impl CalloutSpec {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn slots(&self) -> CalloutSlots {
		CalloutSlots {
			element: self.element.is_some(),
			content: self.content.is_some(),
			left_accessory: self.left_accessory.is_some(),
			right_accessory: self.right_accessory.is_some(),
			anchor_offset: self.anchor_offset.is_some(),
			should_appear: self.should_appear.is_some(),
			should_animate: self.should_animate.is_some(),
			appearance_animation: self.appearance_animation.is_some(),
		}
	}

	pub fn element<F>(mut self, f: F) -> Self
	where
		F: Fn(&Arc<dyn EngineAnnotation>) -> ContentNode + Send + Sync + 'static,
	{
		self.element = Some(Arc::new(f));
		self
	}

	pub fn content<F>(mut self, f: F) -> Self
	where
		F: Fn(&Arc<dyn EngineAnnotation>) -> ContentNode + Send + Sync + 'static,
	{
		self.content = Some(Arc::new(f));
		self
	}

	pub fn left_accessory<F>(mut self, f: F) -> Self
	where
		F: Fn(&Arc<dyn EngineAnnotation>) -> ContentNode + Send + Sync + 'static,
	{
		self.left_accessory = Some(Arc::new(f));
		self
	}

	pub fn right_accessory<F>(mut self, f: F) -> Self
	where
		F: Fn(&Arc<dyn EngineAnnotation>) -> ContentNode + Send + Sync + 'static,
	{
		self.right_accessory = Some(Arc::new(f));
		self
	}

	pub fn anchor_offset<F>(mut self, f: F) -> Self
	where
		F: Fn(&Arc<dyn EngineAnnotation>, Size) -> DomPoint + Send + Sync + 'static,
	{
		self.anchor_offset = Some(Arc::new(f));
		self
	}

	pub fn should_appear<F>(mut self, f: F) -> Self
	where
		F: Fn(&Arc<dyn EngineAnnotation>) -> bool + Send + Sync + 'static,
	{
		self.should_appear = Some(Arc::new(f));
		self
	}

	pub fn should_animate<F>(mut self, f: F) -> Self
	where
		F: Fn(&Arc<dyn EngineAnnotation>) -> bool + Send + Sync + 'static,
	{
		self.should_animate = Some(Arc::new(f));
		self
	}

	pub fn appearance_animation<F>(mut self, f: F) -> Self
	where
		F: Fn(&Arc<dyn EngineAnnotation>) -> String + Send + Sync + 'static,
	{
		self.appearance_animation = Some(Arc::new(f));
		self
	}
}

impl fmt::Debug for CalloutSpec {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("CalloutSpec").field(&self.slots()).finish()
	}
}
