//! Per-node bookkeeping of interface names already claimed by links.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use super::model::Link;

/// Maps a node identifier to the interface names in use on it.
///
/// Derived from the link collection: rebuilt wholesale after a document parse,
/// patched incrementally for edits made on the graph.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceRegistry {
	nodes: HashMap<String, BTreeSet<String>>,
}

impl InterfaceRegistry {
	/// Empty registry.
	pub fn new() -> Self {
		Self::default()
	}

	/// Recompute every reservation from `links`.
	pub fn rebuild<'a>(links: impl IntoIterator<Item = &'a Link>) -> Self {
		let mut registry = Self::new();
		for link in links {
			registry.reserve_link(link);
		}
		registry
	}

	/// Start tracking `node` with no interfaces in use, replacing any stale entry.
	pub fn register_node(&mut self, node: &str) {
		self.nodes.insert(node.to_string(), BTreeSet::new());
	}

	/// Mark `interface` on `node` as in use.
	pub fn reserve(&mut self, node: &str, interface: &str) {
		self.nodes
			.entry(node.to_string())
			.or_default()
			.insert(interface.to_string());
	}

	/// Free `interface` on `node`.
	pub fn release(&mut self, node: &str, interface: &str) {
		if let Some(used) = self.nodes.get_mut(node) {
			used.remove(interface);
		}
	}

	/// Reserve both endpoints of a link.
	pub fn reserve_link(&mut self, link: &Link) {
		self.reserve(&link.source, &link.source_interface);
		self.reserve(&link.target, &link.target_interface);
	}

	/// Release exactly the two endpoints a link held.
	pub fn release_link(&mut self, link: &Link) {
		self.release(&link.source, &link.source_interface);
		self.release(&link.target, &link.target_interface);
	}

	/// Move the entry for `old` to `new`. The old key does not survive.
	pub fn rename(&mut self, old: &str, new: &str) {
		let used = self.nodes.remove(old).unwrap_or_default();
		self.nodes.insert(new.to_string(), used);
	}

	/// Whether `interface` on `node` is held by a link.
	pub fn is_reserved(&self, node: &str, interface: &str) -> bool {
		self.nodes
			.get(node)
			.is_some_and(|used| used.contains(interface))
	}

	/// Interfaces in use on `node`, if it is tracked.
	pub fn interfaces(&self, node: &str) -> Option<&BTreeSet<String>> {
		self.nodes.get(node)
	}

	/// Whether `node` has an entry.
	pub fn contains_node(&self, node: &str) -> bool {
		self.nodes.contains_key(node)
	}
}
