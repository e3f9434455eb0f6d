//! End-to-end editing sessions against the public designer API.

use std::collections::BTreeSet;

use clab_designer::controller::NodeForm;
use clab_designer::topology::document::TopologyDocument;
use clab_designer::topology::model::Position;
use clab_designer::{Designer, DesignerConfig, DesignerError};

fn designer() -> Designer {
	let mut designer = Designer::new(DesignerConfig::default());
	designer.set_topology_name("lab").unwrap();
	designer
}

fn add_node(designer: &mut Designer, name: &str, kind: &str) {
	let mut form = NodeForm::create(Position::new(50.0, 50.0), Some(kind));
	form.name = name.into();
	designer.create_nodes(&form).unwrap();
}

fn add_bulk(designer: &mut Designer, prefix: &str, count: usize) -> Vec<String> {
	let mut form = NodeForm::create(Position::default(), Some("linux"));
	form.prefix = prefix.into();
	form.count = count;
	designer.create_nodes(&form).unwrap()
}

fn document(designer: &Designer) -> TopologyDocument {
	TopologyDocument::from_yaml(&designer.store().document().generated).unwrap()
}

fn eth(names: &[&str]) -> BTreeSet<String> {
	names.iter().map(|n| n.to_string()).collect()
}

#[test]
fn create_and_link_two_nodes() {
	let mut d = designer();
	add_node(&mut d, "leaf1", "ceos");
	add_node(&mut d, "spine1", "ceos");

	d.open_link_form("leaf1", "spine1").unwrap();
	d.submit_link_form().unwrap();

	let doc = document(&d);
	assert_eq!(doc.topology.links.len(), 1);
	assert_eq!(doc.topology.links[0].endpoints, vec!["leaf1:eth1", "spine1:eth1"]);
	let registry = d.store().registry();
	assert_eq!(registry.interfaces("leaf1"), Some(&eth(&["eth1"])));
	assert_eq!(registry.interfaces("spine1"), Some(&eth(&["eth1"])));
}

#[test]
fn duplicate_link_is_rejected() {
	let mut d = designer();
	add_node(&mut d, "leaf1", "ceos");
	add_node(&mut d, "spine1", "ceos");
	d.connect("leaf1", "eth1", "spine1", "eth1").unwrap();

	let err = d.connect("leaf1", "eth1", "spine1", "eth1").unwrap_err();
	assert!(matches!(err, DesignerError::DuplicateLink { .. }));
	assert!(err.is_validation());
	assert_eq!(d.store().links().len(), 1);
	assert_eq!(document(&d).topology.links.len(), 1);
}

#[test]
fn management_toggle_reassigns_in_insertion_order() {
	let mut d = designer();
	for name in ["r1", "r2", "r3"] {
		add_node(&mut d, name, "linux");
	}
	d.set_mgmt_enabled(true).unwrap();
	d.set_ipv4_subnet("172.20.20.0/24").unwrap();

	let addresses: Vec<_> = d.store().nodes().iter().map(|n| n.mgmt_ipv4.clone()).collect();
	assert_eq!(
		addresses,
		vec![
			Some("172.20.20.2".to_string()),
			Some("172.20.20.3".to_string()),
			Some("172.20.20.4".to_string()),
		]
	);
	assert_eq!(document(&d).topology.nodes["r2"].mgmt_ipv4.as_deref(), Some("172.20.20.3"));

	d.set_mgmt_enabled(false).unwrap();
	assert!(d.store().nodes().iter().all(|n| n.mgmt_ipv4.is_none()));
	assert!(document(&d).mgmt.is_none_or(|m| m.ipv4_subnet.is_empty()));
}

#[test]
fn bulk_create_continues_numbering() {
	let mut d = designer();
	add_bulk(&mut d, "leaf", 3);
	let created = add_bulk(&mut d, "leaf", 5);
	assert_eq!(created, vec!["leaf4", "leaf5", "leaf6", "leaf7", "leaf8"]);
	assert_eq!(d.store().nodes().len(), 8);
}

#[test]
fn bulk_create_is_all_or_nothing() {
	let mut d = designer();
	add_node(&mut d, "leaf2", "linux");
	// Unknown kind: none of leaf3..leaf6 may appear.
	let mut form = NodeForm::create(Position::default(), Some("no-such-kind"));
	form.prefix = "leaf".into();
	form.count = 4;
	assert!(d.create_nodes(&form).is_err());
	assert_eq!(d.store().nodes().len(), 1);
}

#[test]
fn rename_cascades_to_links_and_registry() {
	let mut d = designer();
	for name in ["leaf1", "spine1", "spine2"] {
		add_node(&mut d, name, "ceos");
	}
	d.connect("leaf1", "eth1", "spine1", "eth1").unwrap();
	d.connect("leaf1", "eth2", "spine2", "eth1").unwrap();
	let before = d.store().links().iter().filter(|l| l.touches("leaf1")).count();

	d.rename_node("leaf1", "edge1").unwrap();

	let links = d.store().links();
	assert_eq!(links.iter().filter(|l| l.touches("leaf1")).count(), 0);
	assert_eq!(links.iter().filter(|l| l.touches("edge1")).count(), before);
	let registry = d.store().registry();
	assert!(!registry.contains_node("leaf1"));
	assert_eq!(registry.interfaces("edge1"), Some(&eth(&["eth1", "eth2"])));
	let text = &d.store().document().generated;
	assert!(text.contains("edge1:eth2"));
	assert!(!text.contains("leaf1"));
}

#[test]
fn document_round_trip_is_stable() {
	let mut d = designer();
	add_node(&mut d, "leaf1", "ceos");
	add_node(&mut d, "spine1", "ceos");
	d.connect("leaf1", "eth1", "spine1", "eth3").unwrap();
	d.set_mgmt_enabled(true).unwrap();
	d.set_ipv4_subnet("10.0.0.0/24").unwrap();
	let text = d.store().document().generated.clone();

	let mut copy = designer();
	copy.edit_document(&text).unwrap();
	assert_eq!(copy.store().document().generated, text);
	assert_eq!(copy.store().links(), d.store().links());
	assert_eq!(
		copy.store().registry().interfaces("spine1"),
		Some(&eth(&["eth3"]))
	);
	let ids: Vec<_> = copy.store().nodes().iter().map(|n| n.id.as_str()).collect();
	assert_eq!(ids, vec!["leaf1", "spine1"]);
}

#[test]
fn hand_edit_keeps_known_positions() {
	let mut d = designer();
	add_node(&mut d, "leaf1", "ceos");
	d.move_node("leaf1", Position::new(400.0, 250.0));
	let text = d.store().document().generated.replace("nodes:\n", "nodes:\n    host9:\n      kind: linux\n");

	d.edit_document(&text).unwrap();
	assert_eq!(d.store().node("leaf1").unwrap().position, Position::new(400.0, 250.0));
	assert!(d.store().contains_node("host9"));
}

#[test]
fn invalid_edit_keeps_graph_and_text() {
	let mut d = designer();
	add_node(&mut d, "leaf1", "ceos");
	let good = d.store().document().generated.clone();

	assert!(d.edit_document("topology: [").is_err());
	let state = d.store().document();
	assert!(state.is_invalid());
	assert_eq!(state.editable, "topology: [");
	assert_eq!(state.generated, good);
	assert!(d.store().contains_node("leaf1"));

	// The next graph edit starts from the last good document.
	add_node(&mut d, "leaf2", "ceos");
	assert!(!d.store().document().is_invalid());
	assert!(d.store().document().editable.contains("leaf2"));
}
