//! Collision-free node names, interface names and management addresses.
//!
//! Every function here is pure: calling it repeatedly without committing
//! anything returns the same answer. Exhaustion is reported through `None` or a
//! short result, never a panic; callers turn that into a validation error.

use std::net::{Ipv4Addr, Ipv6Addr};

use super::model::Node;
use super::registry::InterfaceRegistry;

/// Interface names run from `eth1` through `eth54`.
pub const MAX_INTERFACE: u32 = 54;

const INTERFACE_PREFIX: &str = "eth";

/// Lowest `ethN` not yet reserved on `node`, or `None` once all are taken.
pub fn next_interface_name(registry: &InterfaceRegistry, node: &str) -> Option<String> {
	(1..=MAX_INTERFACE)
		.map(|n| format!("{INTERFACE_PREFIX}{n}"))
		.find(|name| !registry.is_reserved(node, name))
}

/// Accepts exactly `eth1`..`eth54`, without leading zeros or whitespace.
pub fn interface_name_valid(name: &str) -> bool {
	let Some(digits) = name.strip_prefix(INTERFACE_PREFIX) else {
		return false;
	};
	if digits.is_empty() || digits.starts_with('0') || !digits.bytes().all(|b| b.is_ascii_digit()) {
		return false;
	}
	digits
		.parse::<u32>()
		.is_ok_and(|n| (1..=MAX_INTERFACE).contains(&n))
}

/// Node ids end up in `node:interface` endpoint strings, so they may not
/// contain `:` or whitespace.
pub fn node_id_valid(id: &str) -> bool {
	!id.is_empty() && !id.chars().any(|c| c == ':' || c.is_whitespace())
}

/// Numeric suffix of `id` when it is exactly `<prefix><digits>`.
pub fn node_number(prefix: &str, id: &str) -> Option<u32> {
	let digits = id.strip_prefix(prefix)?;
	if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
		return None;
	}
	digits.parse().ok()
}

/// One past the highest `<prefix>N` in use, or 1 when there is none.
pub fn next_node_number(prefix: &str, nodes: &[Node]) -> u32 {
	nodes
		.iter()
		.filter_map(|node| node_number(prefix, &node.id))
		.max()
		.map_or(1, |max| max + 1)
}

/// Host addresses of `subnet` starting from the second host (`.2`).
///
/// Stops at `count` or just before the broadcast address, whichever comes
/// first. Malformed input, IPv6 included, yields an empty list.
pub fn allocate_address_sequence(subnet: &str, count: usize) -> Vec<String> {
	let Some((network, broadcast)) = parse_ipv4_cidr(subnet) else {
		return Vec::new();
	};
	let first = network.saturating_add(2);
	(first..broadcast)
		.take(count)
		.map(|addr| Ipv4Addr::from(addr).to_string())
		.collect()
}

/// Network and broadcast addresses of an `a.b.c.d/len` string.
fn parse_ipv4_cidr(subnet: &str) -> Option<(u32, u32)> {
	let (addr, len) = subnet.trim().split_once('/')?;
	let addr: Ipv4Addr = addr.parse().ok()?;
	let len: u32 = len.parse().ok()?;
	if len > 32 {
		return None;
	}
	let mask = u32::MAX.checked_shl(32 - len).unwrap_or(0);
	let network = u32::from(addr) & mask;
	Some((network, network | !mask))
}

/// Whether `subnet` is an `a.b.c.d/len` IPv4 prefix.
pub fn ipv4_subnet_valid(subnet: &str) -> bool {
	parse_ipv4_cidr(subnet).is_some()
}

/// Whether `subnet` is an IPv6 `addr/len` prefix.
pub fn ipv6_subnet_valid(subnet: &str) -> bool {
	subnet.trim().split_once('/').is_some_and(|(addr, len)| {
		addr.parse::<Ipv6Addr>().is_ok() && len.parse::<u32>().is_ok_and(|len| len <= 128)
	})
}

/// Derive a node's management address from a shared base and its sequence number.
///
/// IPv4 bases replace everything after the last `.`; IPv6 bases append after
/// the `::` marker, or after the last `:` when there is none. Returns `None`
/// when the result would not be a usable host address.
pub fn address_with_suffix(base: &str, number: u32) -> Option<String> {
	let base = base.trim();
	if base.contains(':') {
		let head = match base.find("::") {
			Some(at) => &base[..at + 2],
			None => &base[..=base.rfind(':')?],
		};
		let candidate = format!("{head}{number}");
		return candidate.parse::<Ipv6Addr>().ok().map(|_| candidate);
	}
	let head = &base[..=base.rfind('.')?];
	if number == 0 || number > 254 {
		return None;
	}
	let candidate = format!("{head}{number}");
	candidate.parse::<Ipv4Addr>().ok().map(|_| candidate)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::topology::model::{Link, Position};

	fn nodes(ids: &[&str]) -> Vec<Node> {
		ids.iter()
			.map(|id| Node::new(*id, "linux", Position::default()))
			.collect()
	}

	#[test]
	fn interface_names_bounds() {
		assert!(interface_name_valid("eth1"));
		assert!(interface_name_valid("eth54"));
		for bad in ["eth0", "eth55", "Eth1", "eth", "eth01", " eth1", "eth1a", "e1"] {
			assert!(!interface_name_valid(bad), "{bad} should be rejected");
		}
	}

	#[test]
	fn node_ids_reject_separators() {
		assert!(node_id_valid("leaf-1.dc_2"));
		for bad in ["", "r:1", "leaf 1", "a\tb"] {
			assert!(!node_id_valid(bad), "{bad:?} should be rejected");
		}
	}

	#[test]
	fn subnet_syntax() {
		assert!(ipv4_subnet_valid("172.20.20.0/24"));
		assert!(!ipv4_subnet_valid("172.20.20.0"));
		assert!(!ipv4_subnet_valid("172.20.20.0/33"));
		assert!(ipv6_subnet_valid("2001:db8::/64"));
		assert!(!ipv6_subnet_valid("2001:db8::/129"));
		assert!(!ipv6_subnet_valid("10.0.0.0/8"));
	}

	#[test]
	fn next_interface_fills_lowest_gap() {
		let mut registry = InterfaceRegistry::new();
		assert_eq!(next_interface_name(&registry, "leaf1").as_deref(), Some("eth1"));
		registry.reserve_link(&Link::new("leaf1", "eth1", "x", "eth1"));
		registry.reserve_link(&Link::new("leaf1", "eth3", "y", "eth1"));
		assert_eq!(next_interface_name(&registry, "leaf1").as_deref(), Some("eth2"));
		// Pure: asking again without committing gives the same answer.
		assert_eq!(next_interface_name(&registry, "leaf1").as_deref(), Some("eth2"));
	}

	#[test]
	fn next_interface_exhausts() {
		let mut registry = InterfaceRegistry::new();
		for n in 1..=MAX_INTERFACE {
			registry.reserve("big", &format!("eth{n}"));
		}
		assert_eq!(next_interface_name(&registry, "big"), None);
	}

	#[test]
	fn next_node_number_scans_matching_ids() {
		assert_eq!(next_node_number("leaf", &[]), 1);
		let existing = nodes(&["leaf1", "leaf3", "leafy7", "spine9", "leaf"]);
		assert_eq!(next_node_number("leaf", &existing), 4);
		assert_eq!(next_node_number("spine", &existing), 10);
	}

	#[test]
	fn address_sequence_from_second_host() {
		assert_eq!(
			allocate_address_sequence("192.168.1.0/24", 5),
			vec![
				"192.168.1.2",
				"192.168.1.3",
				"192.168.1.4",
				"192.168.1.5",
				"192.168.1.6"
			]
		);
	}

	#[test]
	fn address_sequence_stops_before_broadcast() {
		assert_eq!(allocate_address_sequence("10.0.0.0/30", 10), vec!["10.0.0.2"]);
		let full = allocate_address_sequence("172.20.20.0/24", 1000);
		assert_eq!(full.len(), 253);
		assert_eq!(full.last().map(String::as_str), Some("172.20.20.254"));
		assert!(allocate_address_sequence("10.0.0.0/31", 4).is_empty());
	}

	#[test]
	fn malformed_subnet_is_empty() {
		for bad in ["", "172.20.20.0", "172.20.20/24", "1.2.3.4/33", "2001:db8::/64", "x/24"] {
			assert!(allocate_address_sequence(bad, 3).is_empty(), "{bad}");
		}
	}

	#[test]
	fn suffix_replaces_last_octet() {
		assert_eq!(address_with_suffix("172.20.20.", 4).as_deref(), Some("172.20.20.4"));
		assert_eq!(address_with_suffix("172.20.20.100", 7).as_deref(), Some("172.20.20.7"));
		assert_eq!(address_with_suffix("172.20.20.", 255), None);
		assert_eq!(address_with_suffix("nodots", 1), None);
	}

	#[test]
	fn suffix_appends_after_ipv6_marker() {
		assert_eq!(address_with_suffix("2001:db8::", 12).as_deref(), Some("2001:db8::12"));
		assert_eq!(address_with_suffix("2001:db8::1", 3).as_deref(), Some("2001:db8::3"));
	}
}
