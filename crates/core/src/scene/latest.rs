//! Callbacks that always dispatch to the most recent pass.
//!
//! Descriptors are rebuilt on every pass, so their closures change identity
//! even when nothing else does. The engine object keeps forwarding closures
//! bound once at creation; each pass only swaps what they forward to.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::callout::CalloutSpec;
use crate::events::AnnotationHandlers;

pub(crate) struct Latest {
	handlers: RwLock<AnnotationHandlers>,
	callout: RwLock<CalloutSpec>,
}

impl Latest {
	pub(crate) fn new(handlers: AnnotationHandlers, callout: Option<CalloutSpec>) -> Arc<Self> {
		Arc::new(Self {
			handlers: RwLock::new(handlers),
			callout: RwLock::new(callout.unwrap_or_default()),
		})
	}

	pub(crate) fn update(&self, handlers: AnnotationHandlers, callout: Option<CalloutSpec>) {
		*self.handlers.write() = handlers;
		*self.callout.write() = callout.unwrap_or_default();
	}

	/// Handlers with the same slots filled as the current set, each reading
	/// the live value at call time.
	pub(crate) fn forwarding_handlers(self: &Arc<Self>) -> AnnotationHandlers {
		let current = self.handlers.read().clone();
		let mut out = AnnotationHandlers::default();

		if current.on_select.is_some() {
			let latest = Arc::downgrade(self);
			out = out.on_select(move |map, entity| {
				let handler = latest.upgrade().and_then(|l| l.handlers.read().on_select.clone());
				if let Some(handler) = handler {
					handler(map, entity);
				}
			});
		}
		if current.on_deselect.is_some() {
			let latest = Arc::downgrade(self);
			out = out.on_deselect(move |map, entity| {
				let handler = latest.upgrade().and_then(|l| l.handlers.read().on_deselect.clone());
				if let Some(handler) = handler {
					handler(map, entity);
				}
			});
		}
		if current.on_drag_start.is_some() {
			let latest = Arc::downgrade(self);
			out = out.on_drag_start(move |map, entity| {
				let handler = latest.upgrade().and_then(|l| l.handlers.read().on_drag_start.clone());
				if let Some(handler) = handler {
					handler(map, entity);
				}
			});
		}
		if current.on_drag_end.is_some() {
			let latest = Arc::downgrade(self);
			out = out.on_drag_end(move |map, entity| {
				let handler = latest.upgrade().and_then(|l| l.handlers.read().on_drag_end.clone());
				if let Some(handler) = handler {
					handler(map, entity);
				}
			});
		}
		if current.on_drag.is_some() {
			let latest = Arc::downgrade(self);
			out = out.on_drag(move |map, entity, coordinate| {
				let handler = latest.upgrade().and_then(|l| l.handlers.read().on_drag.clone());
				if let Some(handler) = handler {
					handler(map, entity, coordinate);
				}
			});
		}
		out
	}

	/// Callout spec mirroring the current slots; content is produced by
	/// whatever factory the latest pass supplied.
	pub(crate) fn forwarding_callout(self: &Arc<Self>) -> CalloutSpec {
		let current = self.callout.read().clone();
		let mut out = CalloutSpec::new();

		if current.element.is_some() {
			let latest = Arc::downgrade(self);
			out = out.element(move |entity| {
				let f = latest.upgrade().and_then(|l| l.callout.read().element.clone());
				f.map(|f| f(entity)).unwrap_or_default()
			});
		}
		if current.content.is_some() {
			let latest = Arc::downgrade(self);
			out = out.content(move |entity| {
				let f = latest.upgrade().and_then(|l| l.callout.read().content.clone());
				f.map(|f| f(entity)).unwrap_or_default()
			});
		}
		if current.left_accessory.is_some() {
			let latest = Arc::downgrade(self);
			out = out.left_accessory(move |entity| {
				let f = latest.upgrade().and_then(|l| l.callout.read().left_accessory.clone());
				f.map(|f| f(entity)).unwrap_or_default()
			});
		}
		if current.right_accessory.is_some() {
			let latest = Arc::downgrade(self);
			out = out.right_accessory(move |entity| {
				let f = latest.upgrade().and_then(|l| l.callout.read().right_accessory.clone());
				f.map(|f| f(entity)).unwrap_or_default()
			});
		}
		if current.anchor_offset.is_some() {
			let latest = Arc::downgrade(self);
			out = out.anchor_offset(move |entity, size| {
				let f = latest.upgrade().and_then(|l| l.callout.read().anchor_offset.clone());
				f.map(|f| f(entity, size)).unwrap_or_default()
			});
		}
		if current.should_appear.is_some() {
			let latest = Arc::downgrade(self);
			out = out.should_appear(move |entity| {
				let f = latest.upgrade().and_then(|l| l.callout.read().should_appear.clone());
				f.is_none_or(|f| f(entity))
			});
		}
		if current.should_animate.is_some() {
			let latest = Arc::downgrade(self);
			out = out.should_animate(move |entity| {
				let f = latest.upgrade().and_then(|l| l.callout.read().should_animate.clone());
				f.is_none_or(|f| f(entity))
			});
		}
		if current.appearance_animation.is_some() {
			let latest = Arc::downgrade(self);
			out = out.appearance_animation(move |entity| {
				let f = latest.upgrade().and_then(|l| l.callout.read().appearance_animation.clone());
				f.map(|f| f(entity)).unwrap_or_default()
			});
		}
		out
	}
}
