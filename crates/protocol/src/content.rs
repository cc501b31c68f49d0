//! Declarative content trees for callouts and custom annotations.
//!
//! A tree is data only. Mounting it into engine-consumable nodes happens in
//! the callout bridge, synchronously, because the engine asks for nodes from
//! inside its own callbacks.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ContentNode {
	Text { text: String },
	Element(ElementNode),
	Fragment { children: Vec<ContentNode> },
	/// Reference to a host component that cannot be rendered synchronously.
	Component { name: String },
}

/// An empty fragment.
impl Default for ContentNode {
	fn default() -> Self {
		ContentNode::Fragment { children: Vec::new() }
	}
}

impl ContentNode {
	pub fn text(text: impl Into<String>) -> Self {
		ContentNode::Text { text: text.into() }
	}

	/// Numbers render through their display form, as text.
	pub fn number(value: f64) -> Self {
		ContentNode::Text {
			text: value.to_string(),
		}
	}

	pub fn fragment(children: impl IntoIterator<Item = ContentNode>) -> Self {
		ContentNode::Fragment {
			children: children.into_iter().collect(),
		}
	}

	pub fn component(name: impl Into<String>) -> Self {
		ContentNode::Component { name: name.into() }
	}

	pub fn element(tag: impl Into<String>) -> ElementNode {
		ElementNode::new(tag)
	}
}

/// An intrinsic element with class, inline style, attributes and children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementNode {
	pub tag: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub class_name: Option<String>,
	#[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
	pub style: BTreeMap<String, String>,
	#[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
	pub attributes: BTreeMap<String, String>,
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub children: Vec<ContentNode>,
}

impl ElementNode {
	pub fn new(tag: impl Into<String>) -> Self {
		Self {
			tag: tag.into(),
			class_name: None,
			style: BTreeMap::new(),
			attributes: BTreeMap::new(),
			children: Vec::new(),
		}
	}

	pub fn class(mut self, class_name: impl Into<String>) -> Self {
		self.class_name = Some(class_name.into());
		self
	}

	pub fn style(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.style.insert(name.into(), value.into());
		self
	}

	pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.attributes.insert(name.into(), value.into());
		self
	}

	pub fn child(mut self, child: impl Into<ContentNode>) -> Self {
		self.children.push(child.into());
		self
	}

	/// Parses a style value as a pixel dimension (`"120px"`, `"120"`).
	///
	/// Returns `None` for missing, non-numeric, or non-finite values.
	pub fn style_dimension(&self, name: &str) -> Option<f64> {
		parse_dimension(self.style.get(name)?)
	}
}

impl From<ElementNode> for ContentNode {
	fn from(element: ElementNode) -> Self {
		ContentNode::Element(element)
	}
}

impl From<&str> for ContentNode {
	fn from(text: &str) -> Self {
		ContentNode::text(text)
	}
}

impl From<String> for ContentNode {
	fn from(text: String) -> Self {
		ContentNode::Text { text }
	}
}

/// Leading-number parse: `"12.5px"` is 12.5, `"auto"` is `None`.
pub fn parse_dimension(value: &str) -> Option<f64> {
	let value = value.trim();
	let end = value
		.char_indices()
		.find(|(i, c)| !(c.is_ascii_digit() || *c == '.' || (*i == 0 && (*c == '-' || *c == '+'))))
		.map(|(i, _)| i)
		.unwrap_or(value.len());
	value[..end].parse::<f64>().ok().filter(|v| v.is_finite())
}
