use std::sync::{Arc, Weak};

use indexmap::IndexMap;
use mk_protocol::{AnnotationOptions, OverlayStyle, Size};
use parking_lot::Mutex;

use crate::dom::ElementHandle;
use crate::engine::{
	AnnotationAppearance, AnnotationEvent, AnnotationEventKind, AnnotationInit, AnnotationListener, CalloutDelegate,
	DomPoint, EdgePadding, EngineAnnotation, EngineOverlay, LatLng, ListenerId, OverlayInit, OverlayShape,
	next_listener_id,
};

/// What the engine would display when a callout opens.
#[derive(Debug, Clone, Default)]
pub struct CalloutPresentation {
	pub element: Option<ElementHandle>,
	pub content: Option<ElementHandle>,
	pub left_accessory: Option<ElementHandle>,
	pub right_accessory: Option<ElementHandle>,
	pub anchor_offset: Option<DomPoint>,
	pub animates: bool,
	pub appearance_animation: Option<String>,
}

pub struct HeadlessAnnotation {
	handle: u64,
	this: Weak<HeadlessAnnotation>,
	coordinate: Mutex<LatLng>,
	appearance: AnnotationAppearance,
	options: AnnotationOptions,
	padding: Option<EdgePadding>,
	location_marker: bool,
	callout: Mutex<Option<CalloutDelegate>>,
	listeners: Mutex<IndexMap<ListenerId, (AnnotationEventKind, AnnotationListener)>>,
	element: Mutex<Option<ElementHandle>>,
}

impl HeadlessAnnotation {
	pub(crate) fn new(handle: u64, init: AnnotationInit) -> Arc<Self> {
		Arc::new_cyclic(|this| Self {
			handle,
			this: this.clone(),
			coordinate: Mutex::new(init.coordinate),
			appearance: init.appearance,
			options: init.options,
			padding: init.padding,
			location_marker: init.location_marker,
			callout: Mutex::new(None),
			listeners: Mutex::new(IndexMap::new()),
			element: Mutex::new(None),
		})
	}

	fn as_dyn(&self) -> Option<Arc<dyn EngineAnnotation>> {
		self.this.upgrade().map(|this| this as Arc<dyn EngineAnnotation>)
	}

	pub fn appearance(&self) -> &AnnotationAppearance {
		&self.appearance
	}

	pub fn options(&self) -> &AnnotationOptions {
		&self.options
	}

	pub fn padding(&self) -> Option<EdgePadding> {
		self.padding
	}

	pub fn glyph_text(&self) -> Option<String> {
		match &self.appearance {
			AnnotationAppearance::Marker(style) => style.glyph_text.clone(),
			_ => None,
		}
	}

	pub fn callout(&self) -> Option<CalloutDelegate> {
		self.callout.lock().clone()
	}

	pub fn listener_count(&self) -> usize {
		self.listeners.lock().len()
	}

	/// Builds (once) and returns the custom element, as the engine does when
	/// the annotation is first displayed.
	pub fn render_element(&self) -> Option<ElementHandle> {
		let AnnotationAppearance::Element(factory) = &self.appearance else {
			return None;
		};
		let mut slot = self.element.lock();
		if slot.is_none() {
			*slot = Some(factory(*self.coordinate.lock(), &self.options));
		}
		slot.clone()
	}

	/// Fires `kind` at every listener registered for it.
	pub fn emit(&self, kind: AnnotationEventKind) {
		let coordinate = match kind {
			AnnotationEventKind::Dragging | AnnotationEventKind::DragStart | AnnotationEventKind::DragEnd => {
				Some(*self.coordinate.lock())
			}
			_ => None,
		};
		let event = AnnotationEvent { kind, coordinate };
		let listeners: Vec<AnnotationListener> = self
			.listeners
			.lock()
			.values()
			.filter(|(k, _)| *k == kind)
			.map(|(_, l)| l.clone())
			.collect();
		for listener in listeners {
			listener(&event);
		}
	}

	/// Moves the annotation and fires `dragging`.
	pub fn drag_to(&self, coordinate: LatLng) {
		*self.coordinate.lock() = coordinate;
		self.emit(AnnotationEventKind::Dragging);
	}

	/// Runs the callout delegate the way the engine does on selection.
	///
	/// Returns `None` when no delegate is set or `should_appear` vetoes it.
	pub fn open_callout(&self, callout_size: Size) -> Option<CalloutPresentation> {
		let delegate = self.callout()?;
		let this = self.as_dyn()?;

		if let Some(should_appear) = &delegate.should_appear {
			if !should_appear(&this) {
				return None;
			}
		}

		Some(CalloutPresentation {
			element: delegate.element.as_ref().map(|f| f(&this)),
			content: delegate.content.as_ref().map(|f| f(&this)),
			left_accessory: delegate.left_accessory.as_ref().map(|f| f(&this)),
			right_accessory: delegate.right_accessory.as_ref().map(|f| f(&this)),
			anchor_offset: delegate.anchor_offset.as_ref().map(|f| f(&this, callout_size)),
			animates: delegate.should_animate.as_ref().is_none_or(|f| f(&this)),
			appearance_animation: delegate.appearance_animation.as_ref().map(|f| f(&this)),
		})
	}
}

impl EngineAnnotation for HeadlessAnnotation {
	fn handle_id(&self) -> u64 {
		self.handle
	}

	fn coordinate(&self) -> LatLng {
		*self.coordinate.lock()
	}

	fn title(&self) -> Option<String> {
		self.options.title.clone()
	}

	fn is_location_marker(&self) -> bool {
		self.location_marker
	}

	fn set_callout(&self, delegate: Option<CalloutDelegate>) {
		*self.callout.lock() = delegate;
	}

	fn add_event_listener(&self, kind: AnnotationEventKind, listener: AnnotationListener) -> ListenerId {
		let id = next_listener_id();
		self.listeners.lock().insert(id, (kind, listener));
		id
	}

	fn remove_event_listener(&self, id: ListenerId) -> bool {
		self.listeners.lock().shift_remove(&id).is_some()
	}
}

pub struct HeadlessOverlay {
	handle: u64,
	shape: OverlayShape,
	style: OverlayStyle,
}

impl HeadlessOverlay {
	pub(crate) fn new(handle: u64, init: OverlayInit) -> Self {
		Self {
			handle,
			shape: init.shape,
			style: init.style,
		}
	}

	pub fn style(&self) -> &OverlayStyle {
		&self.style
	}
}

impl EngineOverlay for HeadlessOverlay {
	fn handle_id(&self) -> u64 {
		self.handle
	}

	fn shape(&self) -> OverlayShape {
		self.shape.clone()
	}
}
