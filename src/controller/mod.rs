//! Edit operations: the only writer of the topology store.
//!
//! Each public method is one user action. It validates first, then mutates the
//! store and re-renders the document in one go, so a failed validation leaves
//! the store exactly as it was.

mod link_form;
mod node_form;

pub use link_form::{LinkForm, LinkFormMode};
pub use node_form::{FormWarning, MAX_BULK_NODES, NodeForm, NodeFormMode};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{DesignerError, Field, Result};
use crate::topology::allocator::{
	address_with_suffix, allocate_address_sequence, ipv4_subnet_valid, ipv6_subnet_valid,
	next_interface_name, next_node_number, node_id_valid,
};
use crate::topology::catalog::DesignerConfig;
use crate::topology::model::{KindTemplate, Link, Node, Position};
use crate::topology::names;
use crate::topology::store::TopologyStore;

/// Non-fatal message for the user, e.g. a subnet too small for every node.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice(pub String);

/// Owns the store and the open forms.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Designer {
	store: TopologyStore,
	config: DesignerConfig,
	#[serde(skip)]
	node_form: Option<NodeForm>,
	#[serde(skip)]
	link_form: Option<LinkForm>,
	#[serde(skip)]
	notice: Option<Notice>,
}

impl Designer {
	/// Empty designer for the given catalog and identity.
	pub fn new(config: DesignerConfig) -> Self {
		Self {
			store: TopologyStore::new(config.identity.clone()),
			config,
			node_form: None,
			link_form: None,
			notice: None,
		}
	}

	/// Read access to the graph and both document copies.
	pub fn store(&self) -> &TopologyStore {
		&self.store
	}

	/// Catalog, default management network and identity.
	pub fn config(&self) -> &DesignerConfig {
		&self.config
	}

	/// Pending notice, if any.
	pub fn notice(&self) -> Option<&Notice> {
		self.notice.as_ref()
	}

	/// Clear the pending notice.
	pub fn dismiss_notice(&mut self) {
		self.notice = None;
	}

	/// Give the topology a name from the pool if it has none yet.
	fn ensure_topology_name(&mut self) {
		if self.store.settings().name.trim().is_empty() {
			let name = names::generate(&mut rand::thread_rng());
			info!("clab-designer: naming topology {name}");
			self.store.settings_mut().name = name;
		}
	}

	fn commit(&mut self) -> Result<()> {
		self.store.rerender()
	}

	// ─── Node form ───────────────────────────────────────────────────────

	/// The open node form.
	pub fn node_form(&self) -> Option<&NodeForm> {
		self.node_form.as_ref()
	}

	/// Mutable access for binding form inputs.
	pub fn node_form_mut(&mut self) -> Option<&mut NodeForm> {
		self.node_form.as_mut()
	}

	/// Open the create form for a drop at `drop`.
	pub fn open_node_form(&mut self, drop: Position) {
		let default_kind = self.store.settings().default_kind.as_deref();
		self.node_form = Some(NodeForm::create(drop, default_kind));
	}

	/// Open the modify form pre-filled from node `id`.
	pub fn open_modify_node(&mut self, id: &str) -> Result<()> {
		let node = self
			.store
			.node(id)
			.ok_or_else(|| DesignerError::UnknownNode(id.to_string()))?;
		self.node_form = Some(NodeForm::modify(node));
		Ok(())
	}

	/// Discard the form and everything typed into it.
	pub fn cancel_node_form(&mut self) {
		self.node_form = None;
	}

	/// Validate and commit the open node form.
	///
	/// On failure the form stays open with an inline warning and the store is
	/// untouched. On success the form closes and the affected ids are returned.
	pub fn submit_node_form(&mut self) -> Result<Vec<String>> {
		let form = self.node_form.clone().ok_or(DesignerError::NoFormOpen)?;
		let result = match &form.mode {
			NodeFormMode::Create { .. } => self.create_nodes(&form),
			NodeFormMode::Modify { original } => self.modify_node(original, &form).map(|id| vec![id]),
		};
		match result {
			Ok(ids) => {
				self.node_form = None;
				Ok(ids)
			}
			Err(e) => {
				if let Some(open) = self.node_form.as_mut() {
					open.warning = Some(FormWarning::from(&e));
				}
				Err(e)
			}
		}
	}

	// ─── Node operations ─────────────────────────────────────────────────

	/// Create one node, or `form.count` nodes named `<prefix>N` laid out on a grid.
	///
	/// All-or-nothing: any validation failure adds no node at all.
	pub fn create_nodes(&mut self, form: &NodeForm) -> Result<Vec<String>> {
		form.check_required()?;
		let NodeFormMode::Create { drop } = form.mode else {
			return Err(DesignerError::NoFormOpen);
		};
		let kind = form.kind.trim();
		self.config
			.catalog
			.validate(self.store.settings(), kind, form.image.trim())?;

		let prefix = form.prefix.trim();
		let mut nodes = Vec::with_capacity(form.count);
		if form.is_bulk() {
			let first = next_node_number(prefix, self.store.nodes());
			for (index, number) in (first..).take(form.count).enumerate() {
				let id = format!("{prefix}{number}");
				let mut node = Node::new(id.clone(), kind, drop.grid_cell(index));
				form.apply_to(&mut node);
				node.mgmt_ipv4 = derive_address(&form.mgmt_ipv4, number, &id)?;
				node.mgmt_ipv6 = derive_address(&form.mgmt_ipv6, number, &id)?;
				nodes.push(node);
			}
		} else {
			let id = match form.name.trim() {
				"" => format!("{prefix}{}", next_node_number(prefix, self.store.nodes())),
				name => name.to_string(),
			};
			let mut node = Node::new(id, kind, drop);
			form.apply_to(&mut node);
			nodes.push(node);
		}

		let id_field = if form.is_bulk() || form.name.trim().is_empty() {
			Field::NamePrefix
		} else {
			Field::Name
		};
		for node in &nodes {
			check_node_id(&node.id, id_field)?;
			if self.store.contains_node(&node.id) {
				return Err(DesignerError::DuplicateNode(node.id.clone()));
			}
		}

		self.ensure_topology_name();
		self.fill_free_addresses(&mut nodes);
		let ids: Vec<String> = nodes.iter().map(|n| n.id.clone()).collect();
		self.store.push_nodes(nodes);
		self.commit()?;
		debug!("clab-designer: created {}", ids.join(", "));
		Ok(ids)
	}

	/// Give nodes without an IPv4 management address the next free one, when
	/// management addressing is on.
	fn fill_free_addresses(&mut self, nodes: &mut [Node]) {
		let mgmt = &self.store.settings().mgmt;
		if !mgmt.enabled || mgmt.ipv4_subnet.trim().is_empty() {
			return;
		}
		let wanted = nodes.iter().filter(|n| n.mgmt_ipv4.is_none()).count();
		if wanted == 0 {
			return;
		}
		let taken: Vec<&str> = self
			.store
			.nodes()
			.iter()
			.chain(nodes.iter())
			.filter_map(|n| n.mgmt_ipv4.as_deref())
			.collect();
		let pool = allocate_address_sequence(&mgmt.ipv4_subnet, taken.len() + wanted);
		let mut free = pool
			.into_iter()
			.filter(|a| !taken.contains(&a.as_str()))
			.collect::<Vec<_>>()
			.into_iter();
		let mut missing = 0;
		for node in nodes.iter_mut().filter(|n| n.mgmt_ipv4.is_none()) {
			match free.next() {
				Some(addr) => node.mgmt_ipv4 = Some(addr),
				None => missing += 1,
			}
		}
		if missing > 0 {
			self.warn_shortfall(missing);
		}
	}

	fn warn_shortfall(&mut self, missing: usize) {
		let subnet = &self.store.settings().mgmt.ipv4_subnet;
		let message =
			format!("{missing} node(s) got no management address: {subnet:?} has no free host left");
		warn!("clab-designer: {message}");
		self.notice = Some(Notice(message));
	}

	/// Apply a modify form: optional rename, then the device fields.
	pub fn modify_node(&mut self, original: &str, form: &NodeForm) -> Result<String> {
		form.check_required()?;
		if !self.store.contains_node(original) {
			return Err(DesignerError::UnknownNode(original.to_string()));
		}
		let new_id = form.name.trim();
		if new_id != original {
			check_node_id(new_id, Field::Name)?;
		}
		if new_id != original && self.store.contains_node(new_id) {
			return Err(DesignerError::DuplicateNode(new_id.to_string()));
		}
		self.config
			.catalog
			.validate(self.store.settings(), form.kind.trim(), form.image.trim())?;

		self.ensure_topology_name();
		self.store.rename_node(original, new_id);
		if let Some(node) = self.store.node_mut(new_id) {
			form.apply_to(node);
		}
		self.commit()?;
		Ok(new_id.to_string())
	}

	/// Rename a node, rewriting every link and registry entry in the same step.
	pub fn rename_node(&mut self, old: &str, new: &str) -> Result<()> {
		let new = new.trim();
		if new.is_empty() {
			return Err(DesignerError::MissingField(Field::Name));
		}
		if !self.store.contains_node(old) {
			return Err(DesignerError::UnknownNode(old.to_string()));
		}
		if new == old {
			return Ok(());
		}
		check_node_id(new, Field::Name)?;
		if self.store.contains_node(new) {
			return Err(DesignerError::DuplicateNode(new.to_string()));
		}
		self.ensure_topology_name();
		self.store.rename_node(old, new);
		self.commit()
	}

	/// Remove a node and all its links.
	pub fn remove_node(&mut self, id: &str) -> Result<()> {
		self.store
			.remove_node(id)
			.ok_or_else(|| DesignerError::UnknownNode(id.to_string()))?;
		self.commit()
	}

	/// Record a drag. Positions are not part of the document, so nothing re-renders.
	pub fn move_node(&mut self, id: &str, position: Position) -> bool {
		self.store.set_position(id, position)
	}

	// ─── Link form ───────────────────────────────────────────────────────

	/// The open link form.
	pub fn link_form(&self) -> Option<&LinkForm> {
		self.link_form.as_ref()
	}

	/// Mutable access for binding form inputs.
	pub fn link_form_mut(&mut self) -> Option<&mut LinkForm> {
		self.link_form.as_mut()
	}

	/// Open the link form for a connect gesture, pre-filled with the next free interfaces.
	pub fn open_link_form(&mut self, source: &str, target: &str) -> Result<()> {
		for id in [source, target] {
			if !self.store.contains_node(id) {
				return Err(DesignerError::UnknownNode(id.to_string()));
			}
		}
		let registry = self.store.registry();
		let source_interface = next_interface_name(registry, source)
			.ok_or_else(|| DesignerError::InterfacesExhausted(source.to_string()))?;
		let target_interface = if source == target {
			// Self-loop: the second port must differ from the first.
			let mut tentative = registry.clone();
			tentative.reserve(source, &source_interface);
			next_interface_name(&tentative, target)
		} else {
			next_interface_name(registry, target)
		};
		let target_interface =
			target_interface.ok_or_else(|| DesignerError::InterfacesExhausted(target.to_string()))?;

		self.link_form = Some(LinkForm {
			mode: LinkFormMode::Create,
			source: source.to_string(),
			target: target.to_string(),
			source_interface,
			target_interface,
			warning: None,
		});
		Ok(())
	}

	/// Open the link form pre-filled from link `link_id`.
	pub fn open_modify_link(&mut self, link_id: &str) -> Result<()> {
		let link = self
			.store
			.link(link_id)
			.ok_or_else(|| DesignerError::UnknownLink(link_id.to_string()))?;
		self.link_form = Some(LinkForm {
			mode: LinkFormMode::Modify {
				link_id: link.id.clone(),
			},
			source: link.source.clone(),
			target: link.target.clone(),
			source_interface: link.source_interface.clone(),
			target_interface: link.target_interface.clone(),
			warning: None,
		});
		Ok(())
	}

	/// Discard the link form.
	pub fn cancel_link_form(&mut self) {
		self.link_form = None;
	}

	/// Validate and commit the open link form, returning the link id.
	pub fn submit_link_form(&mut self) -> Result<String> {
		let form = self.link_form.clone().ok_or(DesignerError::NoFormOpen)?;
		let result = form
			.to_link()
			.and_then(|link| self.commit_link(link, form.link_id()));
		match result {
			Ok(id) => {
				self.link_form = None;
				Ok(id)
			}
			Err(e) => {
				if let Some(open) = self.link_form.as_mut() {
					open.warning = Some(FormWarning::from(&e));
				}
				Err(e)
			}
		}
	}

	// ─── Link operations ─────────────────────────────────────────────────

	/// Connect two interfaces directly, bypassing the form.
	pub fn connect(
		&mut self,
		source: &str,
		source_interface: &str,
		target: &str,
		target_interface: &str,
	) -> Result<String> {
		let form = LinkForm {
			mode: LinkFormMode::Create,
			source: source.to_string(),
			target: target.to_string(),
			source_interface: source_interface.to_string(),
			target_interface: target_interface.to_string(),
			warning: None,
		};
		self.commit_link(form.to_link()?, None)
	}

	/// Shared validation for new and modified links.
	///
	/// `replacing` is the id of the link being edited; its own reservations
	/// do not count as conflicts.
	fn commit_link(&mut self, mut link: Link, replacing: Option<&str>) -> Result<String> {
		for id in [&link.source, &link.target] {
			if !self.store.contains_node(id) {
				return Err(DesignerError::UnknownNode(id.clone()));
			}
		}
		let previous = match replacing {
			Some(id) => Some(
				self.store
					.link(id)
					.cloned()
					.ok_or_else(|| DesignerError::UnknownLink(id.to_string()))?,
			),
			None => None,
		};
		let others = || {
			self.store
				.links()
				.iter()
				.filter(|l| Some(l.id.as_str()) != replacing)
		};
		if others().any(|l| l.same_endpoints(&link)) {
			return Err(DesignerError::DuplicateLink {
				source_node: link.source.clone(),
				source_interface: link.source_interface.clone(),
				target: link.target.clone(),
				target_interface: link.target_interface.clone(),
			});
		}

		let held_by_previous = |node: &str, interface: &str| {
			previous.as_ref().is_some_and(|p| {
				(p.source == node && p.source_interface == interface)
					|| (p.target == node && p.target_interface == interface)
			})
		};
		let in_use = |node: &str, interface: &str| {
			self.store.registry().is_reserved(node, interface) && !held_by_previous(node, interface)
		};
		if in_use(&link.source, &link.source_interface) {
			return Err(DesignerError::InterfaceInUse {
				node: link.source.clone(),
				interface: link.source_interface.clone(),
				field: Field::SourceInterface,
			});
		}
		let self_loop_clash =
			link.source == link.target && link.source_interface == link.target_interface;
		if self_loop_clash || in_use(&link.target, &link.target_interface) {
			return Err(DesignerError::InterfaceInUse {
				node: link.target.clone(),
				interface: link.target_interface.clone(),
				field: Field::TargetInterface,
			});
		}

		self.ensure_topology_name();
		link.rekey();
		let duplicate = DesignerError::DuplicateLink {
			source_node: link.source.clone(),
			source_interface: link.source_interface.clone(),
			target: link.target.clone(),
			target_interface: link.target_interface.clone(),
		};
		let id = link.id.clone();
		let stored = match replacing {
			Some(old) => self.store.replace_link(old, link),
			None => self.store.insert_link(link),
		};
		if !stored {
			return Err(duplicate);
		}
		self.commit()?;
		Ok(id)
	}

	/// Change the interfaces of an existing link and return its new id.
	pub fn modify_link(&mut self, link_id: &str, source_interface: &str, target_interface: &str) -> Result<String> {
		self.open_modify_link(link_id)?;
		if let Some(form) = self.link_form.as_mut() {
			form.source_interface = source_interface.to_string();
			form.target_interface = target_interface.to_string();
		}
		self.submit_link_form()
	}

	/// Remove a link, freeing exactly its two interfaces.
	pub fn remove_link(&mut self, link_id: &str) -> Result<()> {
		self.store
			.remove_link(link_id)
			.ok_or_else(|| DesignerError::UnknownLink(link_id.to_string()))?;
		self.commit()
	}

	// ─── Settings ────────────────────────────────────────────────────────

	/// Rename the topology; a blank name draws a fresh one from the pool.
	pub fn set_topology_name(&mut self, name: &str) -> Result<()> {
		self.store.settings_mut().name = name.trim().to_string();
		self.ensure_topology_name();
		self.commit()
	}

	/// Switch management addressing on or off.
	///
	/// On with a subnet configured re-addresses every node; off clears the
	/// subnets and strips every node's management addresses.
	pub fn set_mgmt_enabled(&mut self, enabled: bool) -> Result<()> {
		self.ensure_topology_name();
		let network = self.config.mgmt_network.clone();
		let mgmt = &mut self.store.settings_mut().mgmt;
		mgmt.enabled = enabled;
		if enabled {
			if mgmt.network.is_empty() {
				mgmt.network = network;
			}
			if !mgmt.ipv4_subnet.trim().is_empty() {
				self.reassign_addresses();
			}
		} else {
			mgmt.ipv4_subnet.clear();
			mgmt.ipv6_subnet.clear();
			for node in self.store.nodes_mut() {
				node.mgmt_ipv4 = None;
				node.mgmt_ipv6 = None;
			}
		}
		self.commit()
	}

	/// Set the management network name.
	pub fn set_mgmt_network(&mut self, network: &str) -> Result<()> {
		self.ensure_topology_name();
		self.store.settings_mut().mgmt.network = network.trim().to_string();
		self.commit()
	}

	/// Change the IPv4 subnet. While management is on this re-addresses every node.
	pub fn set_ipv4_subnet(&mut self, subnet: &str) -> Result<()> {
		let subnet = subnet.trim();
		if !subnet.is_empty() && !ipv4_subnet_valid(subnet) {
			return Err(DesignerError::InvalidSubnet(subnet.to_string()));
		}
		self.ensure_topology_name();
		self.store.settings_mut().mgmt.ipv4_subnet = subnet.to_string();
		if self.store.settings().mgmt.enabled {
			self.reassign_addresses();
		}
		self.commit()
	}

	/// Set the IPv6 management subnet.
	pub fn set_ipv6_subnet(&mut self, subnet: &str) -> Result<()> {
		let subnet = subnet.trim();
		if !subnet.is_empty() && !ipv6_subnet_valid(subnet) {
			return Err(DesignerError::InvalidSubnet(subnet.to_string()));
		}
		self.ensure_topology_name();
		self.store.settings_mut().mgmt.ipv6_subnet = subnet.to_string();
		self.commit()
	}

	/// Overwrite every node's IPv4 management address from the subnet, in node order.
	fn reassign_addresses(&mut self) {
		let subnet = self.store.settings().mgmt.ipv4_subnet.clone();
		let count = self.store.nodes().len();
		let addresses = allocate_address_sequence(&subnet, count);
		let assigned = addresses.len();
		let mut addresses = addresses.into_iter();
		for node in self.store.nodes_mut() {
			node.mgmt_ipv4 = addresses.next();
		}
		if assigned < count {
			self.warn_shortfall(count - assigned);
		} else {
			self.notice = None;
		}
	}

	/// Set or clear the kind pre-selected in new node forms.
	pub fn set_default_kind(&mut self, kind: Option<&str>) -> Result<()> {
		self.ensure_topology_name();
		self.store.settings_mut().default_kind =
			kind.map(str::trim).filter(|k| !k.is_empty()).map(str::to_string);
		self.commit()
	}

	/// Add or replace a kind template by name.
	pub fn upsert_kind(&mut self, template: KindTemplate) -> Result<()> {
		if template.name.trim().is_empty() {
			return Err(DesignerError::MissingField(Field::Kind));
		}
		self.ensure_topology_name();
		let kinds = &mut self.store.settings_mut().kinds;
		match kinds.iter_mut().find(|k| k.name == template.name) {
			Some(slot) => *slot = template,
			None => kinds.push(template),
		}
		self.commit()
	}

	/// Drop the kind template called `name`.
	pub fn remove_kind(&mut self, name: &str) -> Result<()> {
		self.store.settings_mut().kinds.retain(|k| k.name != name);
		self.commit()
	}

	// ─── Document ────────────────────────────────────────────────────────

	/// Take hand-edited or imported text as the new topology.
	///
	/// A parse failure keeps the current graph and the offending text, and
	/// flags the document invalid. A document without a name gets one from the
	/// pool in the generated copy.
	pub fn edit_document(&mut self, text: &str) -> Result<()> {
		self.store.load_document(text).inspect_err(|e| {
			warn!("clab-designer: document rejected: {e}");
		})?;
		if self.store.settings().name.trim().is_empty() {
			self.ensure_topology_name();
			self.store.rerender_generated()?;
		}
		Ok(())
	}

	/// Clear everything back to an empty designer.
	pub fn reset(&mut self) {
		self.store.reset();
		self.node_form = None;
		self.link_form = None;
		self.notice = None;
		info!("clab-designer: topology reset");
	}
}

/// Address for bulk node `number` from a shared base; blank base means none.
fn check_node_id(id: &str, field: Field) -> Result<()> {
	if node_id_valid(id) {
		Ok(())
	} else {
		Err(DesignerError::InvalidNodeName {
			name: id.to_string(),
			field,
		})
	}
}

fn derive_address(base: &str, number: u32, node: &str) -> Result<Option<String>> {
	if base.trim().is_empty() {
		return Ok(None);
	}
	address_with_suffix(base, number)
		.map(Some)
		.ok_or_else(|| DesignerError::AddressExhausted {
			node: node.to_string(),
			base: base.to_string(),
		})
}
