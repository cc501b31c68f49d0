//! Detached node trees handed to the engine.
//!
//! Nodes live in an index arena owned by the tree; a [`DomNode`] is a tree
//! plus the index of its root. The engine receives an [`ElementHandle`], a
//! shared slot the host can empty when the owning entity goes away.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::Arc;

use parking_lot::Mutex;

/// Index of a node inside its [`DomTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone, PartialEq)]
pub struct ElementData {
	pub tag: String,
	pub class_name: Option<String>,
	pub style: BTreeMap<String, String>,
	pub attributes: BTreeMap<String, String>,
	pub children: Vec<NodeId>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeData {
	Element(ElementData),
	Text(String),
}

/// Arena of nodes. Nodes are never freed individually; the whole tree is
/// dropped with its last owner.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DomTree {
	nodes: Vec<NodeData>,
}

impl DomTree {
	pub fn new() -> Self {
		Self::default()
	}

	fn alloc(&mut self, data: NodeData) -> NodeId {
		self.nodes.push(data);
		NodeId(self.nodes.len() - 1)
	}

	pub fn create_element(&mut self, tag: impl Into<String>) -> NodeId {
		self.alloc(NodeData::Element(ElementData {
			tag: tag.into(),
			class_name: None,
			style: BTreeMap::new(),
			attributes: BTreeMap::new(),
			children: Vec::new(),
		}))
	}

	pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
		self.alloc(NodeData::Text(text.into()))
	}

	/// Appends `child` to `parent`. Text parents ignore the call.
	pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
		if let Some(NodeData::Element(element)) = self.nodes.get_mut(parent.0) {
			element.children.push(child);
		}
	}

	pub fn get(&self, id: NodeId) -> Option<&NodeData> {
		self.nodes.get(id.0)
	}

	pub fn element(&self, id: NodeId) -> Option<&ElementData> {
		match self.nodes.get(id.0) {
			Some(NodeData::Element(element)) => Some(element),
			_ => None,
		}
	}

	pub fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
		match self.nodes.get_mut(id.0) {
			Some(NodeData::Element(element)) => Some(element),
			_ => None,
		}
	}

	/// Element children only, skipping text nodes.
	pub fn element_children(&self, id: NodeId) -> Vec<NodeId> {
		self.element(id)
			.map(|element| {
				element
					.children
					.iter()
					.copied()
					.filter(|child| self.element(*child).is_some())
					.collect()
			})
			.unwrap_or_default()
	}

	pub fn text_content(&self, id: NodeId) -> String {
		let mut out = String::new();
		self.collect_text(id, &mut out);
		out
	}

	fn collect_text(&self, id: NodeId, out: &mut String) {
		match self.get(id) {
			Some(NodeData::Text(text)) => out.push_str(text),
			Some(NodeData::Element(element)) => {
				for child in &element.children {
					self.collect_text(*child, out);
				}
			}
			None => {}
		}
	}

	/// Serializes a subtree as HTML-ish markup, used for logs and CLI output.
	pub fn to_html(&self, id: NodeId) -> String {
		let mut out = String::new();
		self.write_html(id, &mut out);
		out
	}

	fn write_html(&self, id: NodeId, out: &mut String) {
		match self.get(id) {
			Some(NodeData::Text(text)) => out.push_str(&escape(text)),
			Some(NodeData::Element(element)) => {
				let _ = write!(out, "<{}", element.tag);
				if let Some(class_name) = &element.class_name {
					let _ = write!(out, " class=\"{}\"", escape(class_name));
				}
				if !element.style.is_empty() {
					let style: Vec<String> = element.style.iter().map(|(k, v)| format!("{k}:{v}")).collect();
					let _ = write!(out, " style=\"{}\"", escape(&style.join(";")));
				}
				for (name, value) in &element.attributes {
					let _ = write!(out, " {name}=\"{}\"", escape(value));
				}
				out.push('>');
				for child in &element.children {
					self.write_html(*child, out);
				}
				let _ = write!(out, "</{}>", element.tag);
			}
			None => {}
		}
	}
}

fn escape(text: &str) -> String {
	text.replace('&', "&amp;")
		.replace('<', "&lt;")
		.replace('>', "&gt;")
		.replace('"', "&quot;")
}

/// A rooted view into a detached tree.
#[derive(Debug, Clone, PartialEq)]
pub struct DomNode {
	tree: DomTree,
	root: NodeId,
}

impl DomNode {
	pub fn new(tree: DomTree, root: NodeId) -> Self {
		Self { tree, root }
	}

	pub fn tree(&self) -> &DomTree {
		&self.tree
	}

	pub fn root(&self) -> NodeId {
		self.root
	}

	/// Same tree, different root.
	pub fn reroot(self, root: NodeId) -> Self {
		Self { tree: self.tree, root }
	}

	pub fn tag(&self) -> Option<&str> {
		self.tree.element(self.root).map(|e| e.tag.as_str())
	}

	pub fn style(&self, name: &str) -> Option<&str> {
		self.tree
			.element(self.root)
			.and_then(|e| e.style.get(name))
			.map(String::as_str)
	}

	/// Sets an inline style on the root. No-op for text roots.
	pub fn set_style(&mut self, name: impl Into<String>, value: impl Into<String>) {
		if let Some(element) = self.tree.element_mut(self.root) {
			element.style.insert(name.into(), value.into());
		}
	}

	pub fn attribute(&self, name: &str) -> Option<&str> {
		self.tree
			.element(self.root)
			.and_then(|e| e.attributes.get(name))
			.map(String::as_str)
	}

	pub fn element_children(&self) -> Vec<NodeId> {
		self.tree.element_children(self.root)
	}

	pub fn text_content(&self) -> String {
		self.tree.text_content(self.root)
	}

	pub fn to_html(&self) -> String {
		self.tree.to_html(self.root)
	}
}

/// Shared, detachable slot holding a mounted node.
///
/// The engine keeps clones of the handle; detaching empties the slot for all
/// of them at once.
#[derive(Debug, Clone)]
pub struct ElementHandle {
	slot: Arc<Mutex<Option<DomNode>>>,
}

impl ElementHandle {
	pub fn new(node: DomNode) -> Self {
		Self {
			slot: Arc::new(Mutex::new(Some(node))),
		}
	}

	pub fn is_attached(&self) -> bool {
		self.slot.lock().is_some()
	}

	/// Empties the slot. Returns the node if it was still attached.
	pub fn detach(&self) -> Option<DomNode> {
		self.slot.lock().take()
	}

	pub fn snapshot(&self) -> Option<DomNode> {
		self.slot.lock().clone()
	}

	pub fn with<R>(&self, f: impl FnOnce(&DomNode) -> R) -> Option<R> {
		self.slot.lock().as_ref().map(f)
	}

	pub fn same_slot(&self, other: &ElementHandle) -> bool {
		Arc::ptr_eq(&self.slot, &other.slot)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_tree_builds_and_serializes() {
		let mut tree = DomTree::new();
		let root = tree.create_element("div");
		let text = tree.create_text("a < b");
		let span = tree.create_element("span");
		tree.append_child(root, text);
		tree.append_child(root, span);
		tree.element_mut(root).unwrap().style.insert("width".into(), "10px".into());

		let node = DomNode::new(tree, root);
		assert_eq!(node.element_children(), vec![span]);
		assert_eq!(node.text_content(), "a < b");
		assert_eq!(node.to_html(), "<div style=\"width:10px\">a &lt; b<span></span></div>");
	}

	#[test]
	fn test_detach_empties_every_clone() {
		let mut tree = DomTree::new();
		let root = tree.create_element("div");
		let handle = ElementHandle::new(DomNode::new(tree, root));
		let engine_copy = handle.clone();

		assert!(engine_copy.is_attached());
		assert!(handle.detach().is_some());
		assert!(!engine_copy.is_attached());
		assert!(handle.detach().is_none());
		assert!(handle.same_slot(&engine_copy));
	}
}
