use mk_protocol::Size;
use mk_protocol::content::parse_dimension;
use parking_lot::Mutex;

use crate::dom::DomNode;
use crate::engine::{DomPoint, DomRect, HostContainer};

/// Character cell used by [`HeadlessContainer::measure`].
const CHAR_WIDTH: f64 = 8.0;
const LINE_HEIGHT: f64 = 20.0;
const MAX_LINE_WIDTH: f64 = 320.0;

/// A fixed-geometry host element with deterministic text metrics.
pub struct HeadlessContainer {
	rect: Mutex<DomRect>,
	scroll: Mutex<DomPoint>,
}

impl HeadlessContainer {
	pub fn new(rect: DomRect) -> Self {
		Self {
			rect: Mutex::new(rect),
			scroll: Mutex::new(DomPoint::default()),
		}
	}

	pub fn set_rect(&self, rect: DomRect) {
		*self.rect.lock() = rect;
	}

	pub fn set_scroll(&self, scroll: DomPoint) {
		*self.scroll.lock() = scroll;
	}
}

impl HostContainer for HeadlessContainer {
	fn bounding_rect(&self) -> DomRect {
		*self.rect.lock()
	}

	fn scroll_offset(&self) -> DomPoint {
		*self.scroll.lock()
	}

	/// Inline width/height win; otherwise text wraps at a fixed line width.
	fn measure(&self, node: &DomNode) -> Size {
		let chars = node.text_content().chars().count() as f64;
		let natural_width = (chars * CHAR_WIDTH).min(MAX_LINE_WIDTH);
		let lines = ((chars * CHAR_WIDTH) / MAX_LINE_WIDTH).ceil().max(1.0);

		let width = node.style("width").and_then(parse_dimension).unwrap_or(natural_width);
		let height = node.style("height").and_then(parse_dimension).unwrap_or(lines * LINE_HEIGHT);
		Size::new(width, height)
	}
}
