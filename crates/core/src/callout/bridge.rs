use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use mk_protocol::{ContentNode, Size};
use mk_runtime::engine::callout::CalloutElementFn;
use mk_runtime::{CalloutDelegate, DomPoint, ElementFactory, ElementHandle, EngineAnnotation, EngineMap, HostContainer};
use parking_lot::Mutex;

use super::placement::{PlacementStrategy, to_container_space};
use super::render::{ContentRenderer, mount_detached};
use super::spec::{CalloutSpec, ContentFn};

/// Groups the nodes mounted for one entity so they can be released together.
pub type MountScope = u64;

/// Which node of an entity a mount fills. Each slot holds at most one live
/// node; rendering it again detaches the previous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MountSlot {
	/// A custom annotation's own element.
	Custom,
	Element,
	Content,
	LeftAccessory,
	RightAccessory,
}

/// Turns declarative callout and custom-annotation content into the
/// synchronous node callbacks the engine calls.
#[derive(Clone)]
pub struct CalloutBridge {
	container: Arc<dyn HostContainer>,
	renderer: Arc<dyn ContentRenderer>,
	placement: Arc<dyn PlacementStrategy>,
	mounts: Arc<Mutex<HashMap<MountScope, HashMap<MountSlot, ElementHandle>>>>,
	next_scope: Arc<AtomicU64>,
}

impl CalloutBridge {
	pub fn new(
		container: Arc<dyn HostContainer>,
		renderer: Arc<dyn ContentRenderer>,
		placement: Arc<dyn PlacementStrategy>,
	) -> Self {
		Self {
			container,
			renderer,
			placement,
			mounts: Arc::new(Mutex::new(HashMap::new())),
			next_scope: Arc::new(AtomicU64::new(1)),
		}
	}

	pub fn open_scope(&self) -> MountScope {
		self.next_scope.fetch_add(1, Ordering::SeqCst)
	}

	/// Mounts `content` and returns the engine-facing node.
	///
	/// The wrapper's single element child, if it has exactly one, becomes the
	/// node. Inline width/height on the content root win over measurement.
	/// The node is tracked under `(scope, slot)` until the slot renders again
	/// or [`Self::release`] runs.
	pub fn to_element(&self, scope: MountScope, slot: MountSlot, content: &ContentNode) -> ElementHandle {
		let mut node = mount_detached(self.renderer.as_ref(), content);
		if let [only] = node.element_children().as_slice() {
			node = node.reroot(*only);
		}

		let (explicit_width, explicit_height) = match content {
			ContentNode::Element(element) => (element.style_dimension("width"), element.style_dimension("height")),
			_ => (None, None),
		};
		let size = match (explicit_width, explicit_height) {
			(Some(width), Some(height)) => Size::new(width, height),
			(width, height) => {
				let measured = self.container.measure(&node);
				Size::new(width.unwrap_or(measured.width), height.unwrap_or(measured.height))
			}
		};

		node.set_style("pointer-events", "auto");
		if node.style("position").is_none() {
			node.set_style("position", "relative");
		}
		node.set_style("width", format!("{}px", size.width));
		node.set_style("height", format!("{}px", size.height));

		tracing::debug!(
			target = "mk.callout",
			scope,
			?slot,
			width = size.width,
			height = size.height,
			"mounted callout node"
		);

		let handle = ElementHandle::new(node);
		let previous = self.mounts.lock().entry(scope).or_default().insert(slot, handle.clone());
		if let Some(previous) = previous {
			previous.detach();
		}
		handle
	}

	/// Node factory for a custom annotation's content.
	///
	/// The host element gets `position:relative;pointer-events:auto` so the
	/// content can be interacted with.
	pub fn element_factory(&self, scope: MountScope, content: ContentNode) -> ElementFactory {
		let bridge = self.clone();
		Arc::new(move |_coordinate, _options| bridge.to_element(scope, MountSlot::Custom, &content))
	}

	/// Builds the engine delegate for `spec`.
	///
	/// Without an explicit anchor callback, the anchor offset comes from the
	/// placement strategy applied to the annotation's container position.
	pub fn delegate(&self, scope: MountScope, map: &Arc<dyn EngineMap>, spec: &CalloutSpec) -> CalloutDelegate {
		let slot = |f: &Option<ContentFn>, slot: MountSlot| -> Option<CalloutElementFn> {
			let f = f.clone()?;
			let bridge = self.clone();
			Some(Arc::new(move |annotation: &Arc<dyn EngineAnnotation>| {
				let content = f(annotation);
				bridge.to_element(scope, slot, &content)
			}))
		};

		let anchor_offset = spec.anchor_offset.clone().unwrap_or_else(|| {
			let bridge = self.clone();
			let map: Weak<dyn EngineMap> = Arc::downgrade(map);
			Arc::new(move |annotation, callout| match map.upgrade() {
				Some(map) => bridge.anchor_offset(&map, annotation, callout),
				None => DomPoint::default(),
			})
		});

		CalloutDelegate {
			element: slot(&spec.element, MountSlot::Element),
			content: slot(&spec.content, MountSlot::Content),
			left_accessory: slot(&spec.left_accessory, MountSlot::LeftAccessory),
			right_accessory: slot(&spec.right_accessory, MountSlot::RightAccessory),
			anchor_offset: Some(anchor_offset),
			should_appear: spec.should_appear.clone(),
			should_animate: spec.should_animate.clone(),
			appearance_animation: spec.appearance_animation.clone(),
		}
	}

	/// Anchor offset for `annotation` from the placement strategy.
	pub fn anchor_offset(&self, map: &Arc<dyn EngineMap>, annotation: &Arc<dyn EngineAnnotation>, callout: Size) -> DomPoint {
		let page = map.convert_coordinate_to_point_on_page(annotation.coordinate());
		let rect = self.container.bounding_rect();
		let local = to_container_space(page, rect, self.container.scroll_offset());
		self.placement.anchor_offset(local, rect.size(), callout)
	}

	/// Detaches every node mounted under `scope`. Returns how many were live.
	pub fn release(&self, scope: MountScope) -> usize {
		let handles = self.mounts.lock().remove(&scope).unwrap_or_default();
		let detached = handles.values().filter(|h| h.detach().is_some()).count();
		if detached > 0 {
			tracing::debug!(target = "mk.callout", scope, detached, "released mounted nodes");
		}
		detached
	}

	/// Nodes currently tracked under `scope`.
	pub fn mounted(&self, scope: MountScope) -> usize {
		self.mounts.lock().get(&scope).map_or(0, HashMap::len)
	}

	/// Nodes tracked across all scopes.
	pub fn total_mounted(&self) -> usize {
		self.mounts.lock().values().map(HashMap::len).sum()
	}
}
