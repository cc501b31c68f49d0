//! Synchronous rendering of content trees into detached nodes.

use mk_protocol::ContentNode;
use mk_runtime::{DomNode, DomTree, NodeId};

/// Placeholder text for content that cannot be rendered synchronously.
pub const COMPONENT_PLACEHOLDER: &str = "[Component]";

/// Attributes copied onto rendered elements. Everything else, including
/// event-handler attributes, is dropped.
const SAFE_ATTRIBUTES: [&str; 6] = ["id", "title", "alt", "role", "aria-label", "aria-describedby"];

pub fn is_safe_attribute(name: &str) -> bool {
	SAFE_ATTRIBUTES.contains(&name) || name.starts_with("data-") || name == "tabindex"
}

/// Mounts declarative content into a node tree.
///
/// Implementations must finish synchronously; the engine asks for callout
/// nodes from inside its own event handling.
pub trait ContentRenderer: Send + Sync {
	fn render(&self, content: &ContentNode, tree: &mut DomTree, parent: NodeId);
}

/// Default renderer: text, intrinsic elements, fragments; components become
/// a placeholder.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArenaRenderer;

impl ContentRenderer for ArenaRenderer {
	fn render(&self, content: &ContentNode, tree: &mut DomTree, parent: NodeId) {
		match content {
			ContentNode::Text { text } => {
				let node = tree.create_text(text.as_str());
				tree.append_child(parent, node);
			}
			ContentNode::Fragment { children } => {
				for child in children {
					self.render(child, tree, parent);
				}
			}
			ContentNode::Component { name } => {
				tracing::debug!(target = "mk.callout", component = %name, "component rendered as placeholder");
				let node = tree.create_text(COMPONENT_PLACEHOLDER);
				tree.append_child(parent, node);
			}
			ContentNode::Element(element) => {
				let node = tree.create_element(element.tag.as_str());
				if let Some(data) = tree.element_mut(node) {
					data.class_name = element.class_name.clone();
					data.style = element.style.clone();
					data.attributes = element
						.attributes
						.iter()
						.filter(|(name, _)| is_safe_attribute(name))
						.map(|(name, value)| (name.clone(), value.clone()))
						.collect();
				}
				for child in &element.children {
					self.render(child, tree, node);
				}
				tree.append_child(parent, node);
			}
		}
	}
}

/// Renders `content` into a fresh tree under a `div` wrapper.
pub fn mount_detached(renderer: &dyn ContentRenderer, content: &ContentNode) -> DomNode {
	let mut tree = DomTree::new();
	let wrapper = tree.create_element("div");
	renderer.render(content, &mut tree, wrapper);
	DomNode::new(tree, wrapper)
}
