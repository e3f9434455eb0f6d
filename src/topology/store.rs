//! Single source of truth for graph, settings and document text.
//!
//! Readers get shared references at any time. Mutation is crate-private and
//! goes through transactional helpers so that links, the interface registry
//! and the rendered document never disagree after an operation returns.

use log::{debug, error, warn};
use serde::{Deserialize, Serialize};

use super::model::{Identity, Link, Node, Position, Settings};
use super::registry::InterfaceRegistry;
use super::translator::{self, ParsedTopology};
use crate::error::Result;

/// The document text in its two copies plus the parse status of the editable one.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentState {
	/// Last text produced from the graph.
	pub generated: String,
	/// What the text editor shows; diverges from `generated` while the user types.
	pub editable: String,
	/// Parse error for `editable`, if it is currently invalid.
	pub error: Option<String>,
}

impl DocumentState {
	/// Whether the editable text failed to parse.
	pub fn is_invalid(&self) -> bool {
		self.error.is_some()
	}
}

/// Single owner of the graph, its settings and the document text.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TopologyStore {
	nodes: Vec<Node>,
	links: Vec<Link>,
	settings: Settings,
	registry: InterfaceRegistry,
	document: DocumentState,
	identity: Identity,
}

impl TopologyStore {
	/// Empty store for a session identity.
	pub fn new(identity: Identity) -> Self {
		Self {
			identity,
			..Self::default()
		}
	}

	/// Nodes in insertion order.
	pub fn nodes(&self) -> &[Node] {
		&self.nodes
	}

	/// Links in insertion order.
	pub fn links(&self) -> &[Link] {
		&self.links
	}

	/// Topology-wide settings.
	pub fn settings(&self) -> &Settings {
		&self.settings
	}

	/// Interfaces in use per node.
	pub fn registry(&self) -> &InterfaceRegistry {
		&self.registry
	}

	/// Both document copies and the parse status.
	pub fn document(&self) -> &DocumentState {
		&self.document
	}

	/// The session identity.
	pub fn identity(&self) -> &Identity {
		&self.identity
	}

	/// Node by id.
	pub fn node(&self, id: &str) -> Option<&Node> {
		self.nodes.iter().find(|n| n.id == id)
	}

	/// Link by id.
	pub fn link(&self, id: &str) -> Option<&Link> {
		self.links.iter().find(|l| l.id == id)
	}

	/// Whether a node with this id exists.
	pub fn contains_node(&self, id: &str) -> bool {
		self.node(id).is_some()
	}

	pub(crate) fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
		self.nodes.iter_mut().find(|n| n.id == id)
	}

	pub(crate) fn nodes_mut(&mut self) -> &mut [Node] {
		&mut self.nodes
	}

	pub(crate) fn settings_mut(&mut self) -> &mut Settings {
		&mut self.settings
	}

	/// Append nodes, giving each a fresh, empty interface set.
	pub(crate) fn push_nodes(&mut self, nodes: Vec<Node>) {
		for node in &nodes {
			self.registry.register_node(&node.id);
		}
		self.nodes.extend(nodes);
	}

	/// Rename a node together with every link endpoint and its registry entry.
	pub(crate) fn rename_node(&mut self, old: &str, new: &str) {
		if old == new {
			return;
		}
		let Some(node) = self.node_mut(old) else {
			return;
		};
		node.id = new.to_string();
		for link in self.links.iter_mut().filter(|l| l.touches(old)) {
			if link.source == old {
				link.source = new.to_string();
			}
			if link.target == old {
				link.target = new.to_string();
			}
			link.rekey();
		}
		self.registry.rename(old, new);
	}

	/// Drop a node and every link touching it.
	///
	/// The peers' reservations are released; the removed node's own registry
	/// entry is left behind since nothing can reference it any more.
	pub(crate) fn remove_node(&mut self, id: &str) -> Option<Node> {
		let at = self.nodes.iter().position(|n| n.id == id)?;
		let removed = self.nodes.remove(at);
		let (gone, kept): (Vec<_>, Vec<_>) = self.links.drain(..).partition(|l| l.touches(id));
		self.links = kept;
		for link in &gone {
			if link.source != id {
				self.registry.release(&link.source, &link.source_interface);
			}
			if link.target != id {
				self.registry.release(&link.target, &link.target_interface);
			}
		}
		Some(removed)
	}

	/// Whether a live link already carries `id`.
	pub fn contains_link(&self, id: &str) -> bool {
		self.links.iter().any(|l| l.id == id)
	}

	/// Append a link and reserve its interfaces; refused when the id is live.
	pub(crate) fn insert_link(&mut self, link: Link) -> bool {
		if self.contains_link(&link.id) {
			warn!("clab-designer: link {} already exists", link.id);
			return false;
		}
		self.registry.reserve_link(&link);
		self.links.push(link);
		true
	}

	/// Swap the endpoints of an existing link in place.
	///
	/// The link is re-keyed from its new endpoints; refused when that id
	/// belongs to another live link.
	pub(crate) fn replace_link(&mut self, id: &str, mut link: Link) -> bool {
		link.rekey();
		if link.id != id && self.contains_link(&link.id) {
			warn!("clab-designer: link {} already exists", link.id);
			return false;
		}
		let Some(slot) = self.links.iter_mut().find(|l| l.id == id) else {
			return false;
		};
		self.registry.release_link(slot);
		self.registry.reserve_link(&link);
		*slot = link;
		true
	}

	pub(crate) fn remove_link(&mut self, id: &str) -> Option<Link> {
		let at = self.links.iter().position(|l| l.id == id)?;
		let link = self.links.remove(at);
		self.registry.release_link(&link);
		Some(link)
	}

	pub(crate) fn set_position(&mut self, id: &str, position: Position) -> bool {
		match self.node_mut(id) {
			Some(node) => {
				node.position = position;
				true
			}
			None => false,
		}
	}

	/// Re-render the document from the graph and overwrite both text copies.
	pub(crate) fn rerender(&mut self) -> Result<()> {
		let previous = if self.document.is_invalid() {
			&self.document.generated
		} else {
			&self.document.editable
		};
		let text = translator::render(
			&self.nodes,
			&self.links,
			&self.settings,
			&self.identity,
			Some(previous),
		)
		.inspect_err(|e| error!("clab-designer: render failed: {e}"))?;
		debug!(
			"clab-designer: rendered {} nodes, {} links",
			self.nodes.len(),
			self.links.len()
		);
		self.document = DocumentState {
			generated: text.clone(),
			editable: text,
			error: None,
		};
		Ok(())
	}

	/// Re-render only the generated copy, leaving the editable text as typed.
	pub(crate) fn rerender_generated(&mut self) -> Result<()> {
		let text = translator::render(
			&self.nodes,
			&self.links,
			&self.settings,
			&self.identity,
			Some(&self.document.editable),
		)?;
		self.document.generated = text;
		Ok(())
	}

	/// Parse `text` into the graph. On failure the graph stays as it was and
	/// the text is kept verbatim with the error attached.
	pub(crate) fn load_document(&mut self, text: &str) -> Result<()> {
		match translator::parse(text, &self.nodes) {
			Ok(ParsedTopology {
				nodes,
				links,
				settings,
				registry,
			}) => {
				self.nodes = nodes;
				self.links = links;
				self.settings = settings;
				self.registry = registry;
				self.document.generated = translator::render(
					&self.nodes,
					&self.links,
					&self.settings,
					&self.identity,
					Some(text),
				)?;
				self.document.editable = text.to_string();
				self.document.error = None;
				Ok(())
			}
			Err(e) => {
				self.document.editable = text.to_string();
				self.document.error = Some(e.to_string());
				Err(e)
			}
		}
	}

	/// Back to an empty topology. The identity is kept.
	pub(crate) fn reset(&mut self) {
		*self = Self::new(std::mem::take(&mut self.identity));
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn store_with_links() -> TopologyStore {
		let mut store = TopologyStore::new(Identity::default());
		store.push_nodes(vec![
			Node::new("a", "linux", Position::default()),
			Node::new("b", "linux", Position::default()),
			Node::new("c", "linux", Position::default()),
		]);
		store.insert_link(Link::new("a", "eth1", "b", "eth1"));
		store.insert_link(Link::new("c", "eth1", "a", "eth2"));
		store
	}

	#[test]
	fn rename_rewrites_links_and_registry() {
		let mut store = store_with_links();
		store.rename_node("a", "z");
		assert!(store.links().iter().all(|l| !l.touches("a")));
		assert_eq!(store.links().iter().filter(|l| l.touches("z")).count(), 2);
		assert!(!store.registry().contains_node("a"));
		assert!(store.registry().is_reserved("z", "eth2"));
	}

	#[test]
	fn remove_node_drops_links_and_frees_peers() {
		let mut store = store_with_links();
		assert!(store.remove_node("a").is_some());
		assert!(store.links().is_empty());
		assert!(!store.registry().is_reserved("b", "eth1"));
		assert!(!store.registry().is_reserved("c", "eth1"));
	}

	#[test]
	fn rename_rekeys_links() {
		let mut store = store_with_links();
		store.rename_node("a", "z");
		let ids: Vec<_> = store.links().iter().map(|l| l.id.as_str()).collect();
		assert_eq!(ids, vec!["z:eth1--b:eth1", "c:eth1--z:eth2"]);
	}

	#[test]
	fn replace_link_rekeys() {
		let mut store = store_with_links();
		let id = store.links()[0].id.clone();
		assert!(store.replace_link(&id, Link::new("a", "eth5", "b", "eth6")));
		assert!(store.link(&id).is_none());
		let link = store.link("a:eth5--b:eth6").unwrap();
		assert_eq!(link.source_interface, "eth5");
		assert!(!store.registry().is_reserved("a", "eth1"));
		assert!(store.registry().is_reserved("b", "eth6"));
	}

	#[test]
	fn live_ids_are_never_reused() {
		let mut store = store_with_links();
		assert!(!store.insert_link(Link::new("a", "eth1", "b", "eth1")));
		assert_eq!(store.links().len(), 2);
		let second = store.links()[1].id.clone();
		assert!(!store.replace_link(&second, Link::new("a", "eth1", "b", "eth1")));
		assert_eq!(store.links()[1].id, second);
	}

	#[test]
	fn invalid_document_keeps_graph_and_text() {
		let mut store = store_with_links();
		store.rerender().unwrap();
		let before = store.clone();
		let broken = "topology: [oops";
		assert!(store.load_document(broken).is_err());
		assert_eq!(store.nodes(), before.nodes());
		assert_eq!(store.links(), before.links());
		assert_eq!(store.document().editable, broken);
		assert!(store.document().is_invalid());
		assert_eq!(store.document().generated, before.document().generated);
	}

	#[test]
	fn reset_clears_everything_but_identity() {
		let mut store = TopologyStore::new(Identity {
			username: "bob".into(),
			role: "admin".into(),
		});
		store.push_nodes(vec![Node::new("a", "linux", Position::default())]);
		store.rerender().unwrap();
		store.reset();
		assert!(store.nodes().is_empty());
		assert!(store.document().generated.is_empty());
		assert_eq!(store.identity().username, "bob");
	}
}
