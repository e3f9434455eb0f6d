//! Two-way translation between the graph model and the topology document.
//!
//! [`render`] turns nodes, links and settings into canonical YAML; [`parse`]
//! rebuilds all three from YAML text. Text produced by `render` parses back to
//! the same graph, positions aside.

use indexmap::IndexMap;
use log::{debug, warn};

use super::allocator::{interface_name_valid, node_id_valid};
use super::document::{
	DefaultsSection, KindSection, LinkSection, MgmtSection, NodeSection, TopologyDocument,
	split_endpoint,
};
use super::model::{
	BindMount, DEFAULT_INTERFACE, Identity, KindTemplate, Link, Management, Node, Position,
	Settings,
};
use super::names;
use super::registry::InterfaceRegistry;
use crate::error::Result;

/// Where the first node without a known position is placed.
pub const GRID_ORIGIN: Position = Position::new(120.0, 120.0);

/// Graph, settings and registry rebuilt from document text.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParsedTopology {
	pub nodes: Vec<Node>,
	pub links: Vec<Link>,
	pub settings: Settings,
	pub registry: InterfaceRegistry,
}

/// Serialize the graph to canonical document text.
///
/// `previous` is the last document text, if any. Keys it carries that the graph
/// has no slot for are merged back in; text that fails to parse is ignored.
pub fn render(
	nodes: &[Node],
	links: &[Link],
	settings: &Settings,
	identity: &Identity,
	previous: Option<&str>,
) -> Result<String> {
	let previous = previous_document(previous);
	let mut doc = TopologyDocument {
		name: names::qualify(&settings.name, &identity.username),
		extra: previous.extra.clone(),
		..TopologyDocument::default()
	};
	doc.topology.extra = previous.topology.extra.clone();

	for node in nodes {
		let mut section = node_section(node);
		if let Some(old) = previous.topology.nodes.get(&node.id) {
			merge_missing(&mut section.extra, &old.extra);
		}
		doc.topology.nodes.insert(node.id.clone(), section);
	}

	for link in links {
		let endpoints = vec![link.source_endpoint(), link.target_endpoint()];
		let extra = previous
			.topology
			.links
			.iter()
			.find(|old| old.endpoints == endpoints)
			.map(|old| old.extra.clone())
			.unwrap_or_default();
		doc.topology.links.push(LinkSection { endpoints, extra });
	}

	if settings.mgmt.enabled {
		doc.mgmt = Some(MgmtSection {
			network: settings.mgmt.network.clone(),
			ipv4_subnet: settings.mgmt.ipv4_subnet.trim().to_string(),
			ipv6_subnet: settings.mgmt.ipv6_subnet.trim().to_string(),
			extra: previous.mgmt.map(|m| m.extra).unwrap_or_default(),
		});
	}

	if let Some(kind) = settings.default_kind.as_ref().filter(|k| !k.is_empty()) {
		doc.topology.defaults = Some(DefaultsSection {
			kind: Some(kind.clone()),
			extra: previous.topology.defaults.map(|d| d.extra).unwrap_or_default(),
		});
	}
	doc.topology.kinds = settings
		.kinds
		.iter()
		.filter(|k| !k.name.is_empty())
		.map(|k| (k.name.clone(), kind_section(k)))
		.collect();

	doc.to_yaml()
}

fn previous_document(text: Option<&str>) -> TopologyDocument {
	let Some(text) = text.filter(|t| !t.trim().is_empty()) else {
		return TopologyDocument::default();
	};
	TopologyDocument::from_yaml(text).unwrap_or_else(|e| {
		warn!("clab-designer: previous document unreadable, not merging: {e}");
		TopologyDocument::default()
	})
}

fn merge_missing(into: &mut IndexMap<String, serde_yaml::Value>, from: &IndexMap<String, serde_yaml::Value>) {
	for (key, value) in from {
		if !into.contains_key(key) {
			into.insert(key.clone(), value.clone());
		}
	}
}

fn non_blank(value: &Option<String>) -> Option<String> {
	value
		.as_ref()
		.map(|v| v.trim())
		.filter(|v| !v.is_empty())
		.map(str::to_string)
}

fn node_section(node: &Node) -> NodeSection {
	NodeSection {
		kind: node.kind.clone(),
		image: node.image.clone(),
		binds: node
			.binds
			.iter()
			.filter(|b| b.is_complete())
			.map(|b| format!("{}:{}", b.source.trim(), b.target.trim()))
			.collect(),
		mgmt_ipv4: non_blank(&node.mgmt_ipv4),
		mgmt_ipv6: non_blank(&node.mgmt_ipv6),
		startup_config: non_blank(&node.startup_config),
		env: node
			.env
			.iter()
			.filter(|(k, v)| !k.trim().is_empty() && !v.is_empty())
			.map(|(k, v)| (k.trim().to_string(), v.clone()))
			.collect(),
		extra: node.extra.clone(),
	}
}

fn non_empty_list(list: &Option<Vec<String>>) -> Option<Vec<String>> {
	list.as_ref().map(|items| {
		items
			.iter()
			.map(|i| i.trim())
			.filter(|i| !i.is_empty())
			.map(str::to_string)
			.collect()
	})
}

fn kind_section(kind: &KindTemplate) -> KindSection {
	KindSection {
		startup_config: non_blank(&kind.startup_config),
		image: non_blank(&kind.image),
		exec: non_empty_list(&kind.exec),
		binds: non_empty_list(&kind.binds),
	}
}

/// Rebuild graph, settings and interface registry from document text.
///
/// Nodes keep the position of the same identifier in `previous_nodes`; new ones
/// are laid out on a grid in document order. Nodes whose id cannot appear in
/// an endpoint are skipped. Links to unknown nodes, links without exactly two
/// endpoints, links with an interface outside `eth1`..`eth54` and links reusing
/// an interface are dropped.
pub fn parse(text: &str, previous_nodes: &[Node]) -> Result<ParsedTopology> {
	let doc = TopologyDocument::from_yaml(text)?;
	let mut registry = InterfaceRegistry::new();

	let nodes: Vec<Node> = doc
		.topology
		.nodes
		.iter()
		.filter(|(id, _)| {
			let valid = node_id_valid(id);
			if !valid {
				warn!("clab-designer: skipping node {id:?}, ':' and whitespace are not allowed");
			}
			valid
		})
		.enumerate()
		.map(|(index, (id, section))| {
			registry.register_node(id);
			let position = previous_nodes
				.iter()
				.find(|n| &n.id == id)
				.map_or_else(|| GRID_ORIGIN.grid_cell(index), |n| n.position);
			graph_node(id, section, position)
		})
		.collect();

	let mut links = Vec::with_capacity(doc.topology.links.len());
	for section in &doc.topology.links {
		let [a, b] = section.endpoints.as_slice() else {
			warn!(
				"clab-designer: skipping link with {} endpoints",
				section.endpoints.len()
			);
			continue;
		};
		let (source, source_interface) = endpoint_parts(a);
		let (target, target_interface) = endpoint_parts(b);
		if !nodes.iter().any(|n| n.id == source) || !nodes.iter().any(|n| n.id == target) {
			debug!("clab-designer: dropping dangling link {a} <-> {b}");
			continue;
		}
		if !interface_name_valid(source_interface) || !interface_name_valid(target_interface) {
			warn!("clab-designer: dropping link {a} <-> {b}, interfaces must be eth1..eth54");
			continue;
		}
		if registry.is_reserved(source, source_interface)
			|| registry.is_reserved(target, target_interface)
			|| (source == target && source_interface == target_interface)
		{
			warn!("clab-designer: dropping link {a} <-> {b}, interface already in use");
			continue;
		}
		let link = Link::new(source, source_interface, target, target_interface);
		registry.reserve_link(&link);
		links.push(link);
	}

	Ok(ParsedTopology {
		nodes,
		links,
		settings: settings_from(&doc),
		registry,
	})
}

fn endpoint_parts(endpoint: &str) -> (&str, &str) {
	let (node, interface) = split_endpoint(endpoint.trim());
	let interface = interface.trim();
	if interface.is_empty() {
		(node, DEFAULT_INTERFACE)
	} else {
		(node, interface)
	}
}

fn graph_node(id: &str, section: &NodeSection, position: Position) -> Node {
	Node {
		id: id.to_string(),
		kind: section.kind.clone(),
		image: section.image.clone(),
		position,
		binds: section
			.binds
			.iter()
			.map(|bind| match bind.split_once(':') {
				Some((source, target)) => BindMount::new(source, target),
				None => BindMount::new(bind.as_str(), ""),
			})
			.collect(),
		mgmt_ipv4: section.mgmt_ipv4.clone(),
		mgmt_ipv6: section.mgmt_ipv6.clone(),
		startup_config: section.startup_config.clone(),
		env: section.env.clone(),
		extra: section.extra.clone(),
	}
}

fn settings_from(doc: &TopologyDocument) -> Settings {
	let mgmt = doc.mgmt.as_ref().map_or_else(Management::default, |m| Management {
		enabled: true,
		network: m.network.clone(),
		ipv4_subnet: m.ipv4_subnet.clone(),
		ipv6_subnet: m.ipv6_subnet.clone(),
	});
	Settings {
		name: doc.name.clone(),
		mgmt,
		default_kind: doc.topology.defaults.as_ref().and_then(|d| d.kind.clone()),
		kinds: doc
			.topology
			.kinds
			.iter()
			.map(|(name, section)| KindTemplate {
				name: name.clone(),
				startup_config: section.startup_config.clone(),
				image: section.image.clone(),
				exec: section.exec.clone(),
				binds: section.binds.clone(),
			})
			.collect(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn identity() -> Identity {
		Identity {
			username: "alice".into(),
			role: "user".into(),
		}
	}

	fn sample() -> (Vec<Node>, Vec<Link>, Settings) {
		let mut leaf = Node::new("leaf1", "ceos", Position::new(10.0, 10.0));
		leaf.image = "ceos:latest".into();
		leaf.binds = vec![BindMount::new("/tmp/a", "/a"), BindMount::new("/half", "")];
		leaf.mgmt_ipv4 = Some("172.20.20.2".into());
		leaf.startup_config = Some("configs/leaf1.cfg".into());
		leaf.env.insert("FOO".into(), "bar".into());
		leaf.env.insert("EMPTY".into(), String::new());
		let spine = Node::new("spine1", "ceos", Position::new(300.0, 10.0));
		let links = vec![Link::new("leaf1", "eth1", "spine1", "eth1")];
		let settings = Settings {
			name: "dc1".into(),
			mgmt: Management {
				enabled: true,
				network: "clab-mgmt".into(),
				ipv4_subnet: "172.20.20.0/24".into(),
				ipv6_subnet: String::new(),
			},
			default_kind: Some("ceos".into()),
			kinds: vec![KindTemplate {
				name: "ceos".into(),
				image: Some("ceos:latest".into()),
				exec: Some(vec!["ip link".into(), String::new()]),
				..KindTemplate::default()
			}],
		};
		(vec![leaf, spine], links, settings)
	}

	#[test]
	fn render_is_idempotent() {
		let (nodes, links, settings) = sample();
		let first = render(&nodes, &links, &settings, &identity(), None).unwrap();
		let second = render(&nodes, &links, &settings, &identity(), Some(&first)).unwrap();
		assert_eq!(first, second);
	}

	#[test]
	fn render_filters_incomplete_fields() {
		let (nodes, links, settings) = sample();
		let text = render(&nodes, &links, &settings, &identity(), None).unwrap();
		let doc = TopologyDocument::from_yaml(&text).unwrap();
		assert_eq!(doc.name, "alice-dc1");
		let leaf = &doc.topology.nodes["leaf1"];
		assert_eq!(leaf.binds, vec!["/tmp/a:/a"]);
		assert_eq!(leaf.env.len(), 1);
		assert!(doc.topology.nodes["spine1"].mgmt_ipv4.is_none());
		assert_eq!(doc.topology.kinds["ceos"].exec, Some(vec!["ip link".to_string()]));
		assert!(doc.topology.kinds["ceos"].binds.is_none());
		assert_eq!(
			doc.topology.links[0].endpoints,
			vec!["leaf1:eth1", "spine1:eth1"]
		);
	}

	#[test]
	fn round_trip_preserves_graph() {
		let (nodes, links, settings) = sample();
		let text = render(&nodes, &links, &settings, &identity(), None).unwrap();
		let parsed = parse(&text, &nodes).unwrap();

		assert_eq!(parsed.links, links);
		assert_eq!(parsed.nodes.len(), 2);
		assert_eq!(parsed.nodes[0].position, nodes[0].position);
		assert_eq!(parsed.nodes[0].binds, vec![BindMount::new("/tmp/a", "/a")]);
		assert_eq!(parsed.nodes[0].mgmt_ipv4, nodes[0].mgmt_ipv4);
		assert_eq!(parsed.nodes[1], nodes[1]);
		assert_eq!(parsed.settings.mgmt, settings.mgmt);
		assert_eq!(parsed.settings.default_kind, settings.default_kind);
		assert_eq!(parsed.settings.name, "alice-dc1");

		let again = render(&parsed.nodes, &parsed.links, &parsed.settings, &identity(), Some(&text))
			.unwrap();
		assert_eq!(again, text);
	}

	#[test]
	fn parse_places_new_nodes_on_grid() {
		let text = "name: t\ntopology:\n  nodes:\n    a: {kind: linux}\n    b: {kind: linux}\n";
		let parsed = parse(text, &[]).unwrap();
		assert_eq!(parsed.nodes[0].position, GRID_ORIGIN);
		assert_eq!(parsed.nodes[1].position, GRID_ORIGIN.grid_cell(1));
		assert!(parsed.registry.interfaces("a").unwrap().is_empty());
	}

	#[test]
	fn parse_drops_dangling_and_reused_links() {
		let text = r#"
name: t
topology:
  nodes:
    a: {kind: linux}
    b: {kind: linux}
  links:
    - endpoints: ["a:eth1", "b:eth1"]
    - endpoints: ["a:eth1", "b:eth2"]
    - endpoints: ["a:eth2", "ghost:eth1"]
    - endpoints: ["a:eth3"]
    - endpoints: ["a", "b:eth4"]
    - endpoints: ["a:eth99", "b:Eth0"]
    - endpoints: ["a:eth5", "b:eth06"]
"#;
		let parsed = parse(text, &[]).unwrap();
		assert_eq!(parsed.links, vec![Link::new("a", "eth1", "b", "eth1")]);
		assert!(!parsed.registry.is_reserved("a", "eth2"));
		assert!(!parsed.registry.is_reserved("b", "eth4"));
		assert!(!parsed.registry.is_reserved("a", "eth99"));
		assert!(!parsed.registry.is_reserved("a", "eth5"));
	}

	#[test]
	fn parse_skips_nodes_that_cannot_be_endpoints() {
		let text = r#"
name: t
topology:
  nodes:
    "r:1": {kind: linux}
    r2: {kind: linux}
  links:
    - endpoints: ["r:1:eth1", "r2:eth1"]
"#;
		let parsed = parse(text, &[]).unwrap();
		let ids: Vec<_> = parsed.nodes.iter().map(|n| n.id.as_str()).collect();
		assert_eq!(ids, vec!["r2"]);
		assert!(parsed.links.is_empty());
	}

	#[test]
	fn unknown_fields_survive_one_round_trip() {
		let text = r#"
name: alice-t
owner: netops
topology:
  nodes:
    a:
      kind: linux
      labels: {rack: r1}
"#;
		let parsed = parse(text, &[]).unwrap();
		let rendered = render(
			&parsed.nodes,
			&parsed.links,
			&parsed.settings,
			&identity(),
			Some(text),
		)
		.unwrap();
		let doc = TopologyDocument::from_yaml(&rendered).unwrap();
		assert!(doc.extra.contains_key("owner"));
		assert!(doc.topology.nodes["a"].extra.contains_key("labels"));
	}

	#[test]
	fn unreadable_previous_document_is_ignored() {
		let (nodes, links, settings) = sample();
		let clean = render(&nodes, &links, &settings, &identity(), None).unwrap();
		let merged = render(&nodes, &links, &settings, &identity(), Some("name: [unclosed")).unwrap();
		assert_eq!(clean, merged);
	}
}
