//! View and gesture state for the topology canvas.
//!
//! Node positions live in the store. This module only tracks what the canvas
//! itself needs between events: pan/zoom, an in-progress drag or connect
//! gesture, and which node is under the pointer.

use std::collections::HashSet;

use crate::topology::model::{Link, Node, Position};

/// Pan and zoom transform applied to the entire graph view.
#[derive(Clone, Debug)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	/// Zoom factor (1.0 = 100%, clamped to 0.2..5.0).
	pub k: f64,
}

impl Default for ViewTransform {
	fn default() -> Self {
		Self {
			x: 0.0,
			y: 0.0,
			k: 1.0,
		}
	}
}

/// Tracks an in-progress node drag. The store only sees the final position.
#[derive(Clone, Debug, Default)]
pub struct DragState {
	pub node: Option<String>,
	pub start_x: f64,
	pub start_y: f64,
	pub node_start: Position,
	pub current: Position,
	pub moved: bool,
}

/// Tracks an in-progress canvas pan operation.
#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
}

/// Shift-drag from one node towards another to propose a link.
#[derive(Clone, Debug, Default)]
pub struct ConnectState {
	pub source: Option<String>,
	/// Pointer position in graph coordinates.
	pub cursor: Position,
}

/// Hovered node plus its direct neighbours.
#[derive(Clone, Debug, Default)]
pub struct HoverState {
	pub node: Option<String>,
	neighbors: HashSet<String>,
}

impl HoverState {
	/// Hover `node` and collect its direct neighbours from `links`.
	pub fn set(&mut self, node: Option<String>, links: &[Link]) {
		if self.node == node {
			return;
		}
		self.neighbors.clear();
		if let Some(id) = &node {
			for link in links {
				if &link.source == id {
					self.neighbors.insert(link.target.clone());
				} else if &link.target == id {
					self.neighbors.insert(link.source.clone());
				}
			}
		}
		self.node = node;
	}

	/// Whether `id` is the hovered node or one of its neighbours.
	pub fn is_highlighted(&self, id: &str) -> bool {
		self.node.as_deref() == Some(id) || self.neighbors.contains(id)
	}

	/// Whether any node is hovered.
	pub fn is_active(&self) -> bool {
		self.node.is_some()
	}
}

/// Everything the canvas needs between frames.
pub struct CanvasState {
	pub transform: ViewTransform,
	pub drag: DragState,
	pub pan: PanState,
	pub connect: ConnectState,
	pub hover: HoverState,
	pub width: f64,
	pub height: f64,
}

impl CanvasState {
	/// State for a canvas of the given size, at identity zoom.
	pub fn new(width: f64, height: f64) -> Self {
		Self {
			transform: ViewTransform::default(),
			drag: DragState::default(),
			pan: PanState::default(),
			connect: ConnectState::default(),
			hover: HoverState::default(),
			width,
			height,
		}
	}

	/// Convert a canvas pixel to graph coordinates.
	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> Position {
		Position::new(
			(sx - self.transform.x) / self.transform.k,
			(sy - self.transform.y) / self.transform.k,
		)
	}

	/// Where `node` should be drawn, honouring an in-progress drag.
	pub fn position_of(&self, node: &Node) -> Position {
		match &self.drag.node {
			Some(id) if *id == node.id => self.drag.current,
			_ => node.position,
		}
	}

	/// Topmost node within `hit_radius` of the screen point.
	pub fn node_at_position(&self, nodes: &[Node], sx: f64, sy: f64, hit_radius: f64) -> Option<String> {
		let p = self.screen_to_graph(sx, sy);
		nodes
			.iter()
			.rev()
			.find(|node| {
				let at = self.position_of(node);
				let (dx, dy) = (at.x - p.x, at.y - p.y);
				(dx * dx + dy * dy).sqrt() < hit_radius
			})
			.map(|node| node.id.clone())
	}

	/// Start dragging `node` from the pointer at (`sx`, `sy`).
	pub fn begin_drag(&mut self, node: &Node, sx: f64, sy: f64) {
		self.drag = DragState {
			node: Some(node.id.clone()),
			start_x: sx,
			start_y: sy,
			node_start: node.position,
			current: node.position,
			moved: false,
		};
	}

	/// Follow the pointer and mark the drag as a move.
	pub fn drag_to(&mut self, sx: f64, sy: f64) {
		let (dx, dy) = (
			(sx - self.drag.start_x) / self.transform.k,
			(sy - self.drag.start_y) / self.transform.k,
		);
		self.drag.current = Position::new(self.drag.node_start.x + dx, self.drag.node_start.y + dy);
		self.drag.moved = true;
	}

	/// End the drag, returning the node and its final position if it moved.
	pub fn end_drag(&mut self) -> Option<(String, Position)> {
		let drag = std::mem::take(&mut self.drag);
		match drag.node {
			Some(id) if drag.moved => Some((id, drag.current)),
			_ => None,
		}
	}

	/// Zoom by `factor` around the screen point (x, y).
	pub fn zoom_at(&mut self, x: f64, y: f64, factor: f64) {
		let new_k = (self.transform.k * factor).clamp(0.2, 5.0);
		let ratio = new_k / self.transform.k;
		self.transform.x = x - (x - self.transform.x) * ratio;
		self.transform.y = y - (y - self.transform.y) * ratio;
		self.transform.k = new_k;
	}

	/// Track a new canvas size.
	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn nodes() -> Vec<Node> {
		vec![
			Node::new("a", "linux", Position::new(100.0, 100.0)),
			Node::new("b", "linux", Position::new(300.0, 100.0)),
		]
	}

	#[test]
	fn hit_test_respects_transform() {
		let mut state = CanvasState::new(800.0, 600.0);
		assert_eq!(state.node_at_position(&nodes(), 102.0, 98.0, 10.0).as_deref(), Some("a"));
		state.zoom_at(0.0, 0.0, 2.0);
		assert_eq!(state.node_at_position(&nodes(), 600.0, 200.0, 10.0).as_deref(), Some("b"));
		assert_eq!(state.node_at_position(&nodes(), 300.0, 100.0, 10.0), None);
	}

	#[test]
	fn drag_reports_final_position_once_moved() {
		let mut state = CanvasState::new(800.0, 600.0);
		let node = &nodes()[0];
		state.begin_drag(node, 100.0, 100.0);
		assert_eq!(state.position_of(node), node.position);
		state.drag_to(150.0, 120.0);
		assert_eq!(state.position_of(node), Position::new(150.0, 120.0));
		assert_eq!(state.end_drag(), Some(("a".to_string(), Position::new(150.0, 120.0))));

		state.begin_drag(node, 0.0, 0.0);
		assert_eq!(state.end_drag(), None);
	}

	#[test]
	fn hover_highlights_neighbors() {
		let links = vec![Link::new("a", "eth1", "b", "eth1")];
		let mut hover = HoverState::default();
		hover.set(Some("a".into()), &links);
		assert!(hover.is_highlighted("a"));
		assert!(hover.is_highlighted("b"));
		assert!(!hover.is_highlighted("c"));
		hover.set(None, &links);
		assert!(!hover.is_active());
	}
}
