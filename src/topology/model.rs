//! In-memory graph model: nodes, links, kind templates and topology settings.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Interface assumed when a link endpoint does not name one.
pub const DEFAULT_INTERFACE: &str = "eth1";

/// Canvas coordinate of a node. Owned by the graph, never written to the document.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
	pub x: f64,
	pub y: f64,
}

/// Columns in the grid used to place nodes that have no position yet.
pub const GRID_COLUMNS: usize = 6;
/// Distance between neighbouring grid cells.
pub const GRID_SPACING: f64 = 140.0;

impl Position {
	/// Point at (`x`, `y`).
	pub const fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}

	/// Cell `index` of a fixed-width grid whose first cell sits at `self`.
	pub fn grid_cell(self, index: usize) -> Self {
		let (row, col) = (index / GRID_COLUMNS, index % GRID_COLUMNS);
		Self {
			x: self.x + col as f64 * GRID_SPACING,
			y: self.y + row as f64 * GRID_SPACING,
		}
	}
}

/// A host path mounted into a node's container.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindMount {
	pub source: String,
	pub target: String,
}

impl BindMount {
	/// Mount `source` on the host at `target` in the container.
	pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
		Self {
			source: source.into(),
			target: target.into(),
		}
	}

	/// Only binds with both sides filled in are emitted.
	pub fn is_complete(&self) -> bool {
		!self.source.trim().is_empty() && !self.target.trim().is_empty()
	}
}

/// One device in the topology. The identifier doubles as its display label.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Node {
	pub id: String,
	pub kind: String,
	pub image: String,
	pub position: Position,
	pub binds: Vec<BindMount>,
	pub mgmt_ipv4: Option<String>,
	pub mgmt_ipv6: Option<String>,
	pub startup_config: Option<String>,
	/// Environment variables, in the order the user entered them.
	pub env: IndexMap<String, String>,
	/// Document keys this model has no slot for; carried through re-rendering untouched.
	pub extra: IndexMap<String, serde_yaml::Value>,
}

impl Node {
	/// Node with no image, addresses or extras.
	pub fn new(id: impl Into<String>, kind: impl Into<String>, position: Position) -> Self {
		Self {
			id: id.into(),
			kind: kind.into(),
			position,
			..Self::default()
		}
	}
}

/// A connection between two node interfaces.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
	pub id: String,
	pub source: String,
	pub target: String,
	pub source_interface: String,
	pub target_interface: String,
}

impl Link {
	/// Link between two interfaces, keyed by its endpoints.
	pub fn new(
		source: impl Into<String>,
		source_interface: impl Into<String>,
		target: impl Into<String>,
		target_interface: impl Into<String>,
	) -> Self {
		let (source, source_interface) = (source.into(), source_interface.into());
		let (target, target_interface) = (target.into(), target_interface.into());
		Self {
			id: link_id(&source, &source_interface, &target, &target_interface),
			source,
			target,
			source_interface,
			target_interface,
		}
	}

	/// Recompute the id after an endpoint changed.
	pub fn rekey(&mut self) {
		self.id = link_id(&self.source, &self.source_interface, &self.target, &self.target_interface);
	}

	/// Whether `node` is either endpoint.
	pub fn touches(&self, node: &str) -> bool {
		self.source == node || self.target == node
	}

	/// Same endpoints, ignoring the id.
	pub fn same_endpoints(&self, other: &Link) -> bool {
		self.source == other.source
			&& self.target == other.target
			&& self.source_interface == other.source_interface
			&& self.target_interface == other.target_interface
	}

	/// Interface on the source side, falling back to [`DEFAULT_INTERFACE`].
	pub fn source_endpoint(&self) -> String {
		endpoint(&self.source, &self.source_interface)
	}

	/// Interface on the target side, falling back to [`DEFAULT_INTERFACE`].
	pub fn target_endpoint(&self) -> String {
		endpoint(&self.target, &self.target_interface)
	}
}

fn endpoint(node: &str, interface: &str) -> String {
	let interface = if interface.is_empty() {
		DEFAULT_INTERFACE
	} else {
		interface
	};
	format!("{node}:{interface}")
}

/// Deterministic link id derived from both endpoints.
pub fn link_id(source: &str, source_interface: &str, target: &str, target_interface: &str) -> String {
	format!("{source}:{source_interface}--{target}:{target_interface}")
}

/// Device-type template declared under `topology.kinds`.
///
/// Each optional field is only emitted when set, which is how a template
/// "enables" an override.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindTemplate {
	pub name: String,
	pub startup_config: Option<String>,
	pub image: Option<String>,
	pub exec: Option<Vec<String>>,
	pub binds: Option<Vec<String>>,
}

/// Out-of-band management network settings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Management {
	pub enabled: bool,
	pub network: String,
	pub ipv4_subnet: String,
	pub ipv6_subnet: String,
}

/// Topology-wide settings recovered from, and emitted to, the document.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
	pub name: String,
	pub mgmt: Management,
	pub default_kind: Option<String>,
	pub kinds: Vec<KindTemplate>,
}

impl Settings {
	/// Template declared for `name`, if any.
	pub fn kind_template(&self, name: &str) -> Option<&KindTemplate> {
		self.kinds.iter().find(|k| k.name == name)
	}
}

/// Opaque identity handed over by the authentication service at session start.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
	pub username: String,
	pub role: String,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn link_id_is_deterministic() {
		let a = Link::new("leaf1", "eth1", "spine1", "eth2");
		let b = Link::new("leaf1", "eth1", "spine1", "eth2");
		assert_eq!(a.id, b.id);
		assert_eq!(a.id, "leaf1:eth1--spine1:eth2");
	}

	#[test]
	fn rekey_follows_endpoints() {
		let mut link = Link::new("leaf1", "eth1", "spine1", "eth2");
		link.source = "edge1".into();
		link.rekey();
		assert_eq!(link.id, "edge1:eth1--spine1:eth2");
	}

	#[test]
	fn endpoints_default_missing_interface() {
		let link = Link::new("a", "", "b", "eth3");
		assert_eq!(link.source_endpoint(), "a:eth1");
		assert_eq!(link.target_endpoint(), "b:eth3");
	}

	#[test]
	fn grid_cells_wrap_rows() {
		let origin = Position::new(10.0, 20.0);
		assert_eq!(origin.grid_cell(0), origin);
		assert_eq!(origin.grid_cell(1), Position::new(10.0 + GRID_SPACING, 20.0));
		assert_eq!(origin.grid_cell(GRID_COLUMNS), Position::new(10.0, 20.0 + GRID_SPACING));
	}

	#[test]
	fn incomplete_binds_are_detected() {
		assert!(BindMount::new("/a", "/b").is_complete());
		assert!(!BindMount::new("/a", " ").is_complete());
		assert!(!BindMount::default().is_complete());
	}
}
