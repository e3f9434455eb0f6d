//! Typed schema of the containerlab topology document.
//!
//! Every section keeps an `extra` bag of keys it does not model, so hand-written
//! extensions survive a parse/render round trip.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;

use crate::error::Result;

/// Unmodelled keys, kept in document order.
pub type Extra = IndexMap<String, Value>;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopologyDocument {
	pub name: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub mgmt: Option<MgmtSection>,
	pub topology: TopologySection,
	#[serde(flatten)]
	pub extra: Extra,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct MgmtSection {
	pub network: String,
	#[serde(skip_serializing_if = "String::is_empty")]
	pub ipv4_subnet: String,
	#[serde(skip_serializing_if = "String::is_empty")]
	pub ipv6_subnet: String,
	#[serde(flatten)]
	pub extra: Extra,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopologySection {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub defaults: Option<DefaultsSection>,
	#[serde(skip_serializing_if = "IndexMap::is_empty")]
	pub kinds: IndexMap<String, KindSection>,
	pub nodes: IndexMap<String, NodeSection>,
	#[serde(skip_serializing_if = "Vec::is_empty")]
	pub links: Vec<LinkSection>,
	#[serde(flatten)]
	pub extra: Extra,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultsSection {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub kind: Option<String>,
	#[serde(flatten)]
	pub extra: Extra,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct KindSection {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub startup_config: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub image: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub exec: Option<Vec<String>>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub binds: Option<Vec<String>>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct NodeSection {
	#[serde(skip_serializing_if = "String::is_empty")]
	pub kind: String,
	#[serde(skip_serializing_if = "String::is_empty")]
	pub image: String,
	#[serde(skip_serializing_if = "Vec::is_empty")]
	pub binds: Vec<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub mgmt_ipv4: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub mgmt_ipv6: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub startup_config: Option<String>,
	#[serde(skip_serializing_if = "IndexMap::is_empty")]
	pub env: IndexMap<String, String>,
	#[serde(flatten)]
	pub extra: Extra,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkSection {
	pub endpoints: Vec<String>,
	#[serde(flatten)]
	pub extra: Extra,
}

impl TopologyDocument {
	/// Parse document text.
	pub fn from_yaml(text: &str) -> Result<Self> {
		Ok(serde_yaml::from_str(text)?)
	}

	/// Serialize to document text.
	pub fn to_yaml(&self) -> Result<String> {
		Ok(serde_yaml::to_string(self)?)
	}
}

/// Split an `node:interface` endpoint. The interface is empty when there is no `:`.
pub fn split_endpoint(endpoint: &str) -> (&str, &str) {
	endpoint.split_once(':').unwrap_or((endpoint, ""))
}

#[cfg(test)]
mod tests {
	use super::*;

	const SAMPLE: &str = r#"
name: alice-dc1
mgmt:
  network: clab-mgmt
  ipv4-subnet: 172.20.20.0/24
topology:
  defaults:
    kind: ceos
  kinds:
    ceos:
      image: ceos:latest
      exec: [ "ip link" ]
  nodes:
    leaf1:
      kind: ceos
      mgmt-ipv4: 172.20.20.2
      labels:
        rack: r1
      env:
        FOO: bar
  links:
    - endpoints: ["leaf1:eth1", "spine1:eth1"]
      mtu: 9000
owner: netops
"#;

	#[test]
	fn parses_known_and_unknown_keys() {
		let doc = TopologyDocument::from_yaml(SAMPLE).unwrap();
		assert_eq!(doc.name, "alice-dc1");
		assert_eq!(doc.mgmt.as_ref().unwrap().ipv4_subnet, "172.20.20.0/24");
		assert_eq!(doc.topology.defaults.as_ref().unwrap().kind.as_deref(), Some("ceos"));
		let leaf = &doc.topology.nodes["leaf1"];
		assert_eq!(leaf.mgmt_ipv4.as_deref(), Some("172.20.20.2"));
		assert_eq!(leaf.env["FOO"], "bar");
		assert!(leaf.extra.contains_key("labels"));
		assert!(doc.topology.links[0].extra.contains_key("mtu"));
		assert!(doc.extra.contains_key("owner"));
	}

	#[test]
	fn empty_sections_are_omitted() {
		let doc = TopologyDocument {
			name: "lab".into(),
			..TopologyDocument::default()
		};
		let yaml = doc.to_yaml().unwrap();
		assert!(!yaml.contains("mgmt"));
		assert!(!yaml.contains("links"));
		assert!(yaml.contains("nodes: {}"));
	}

	#[test]
	fn malformed_text_is_an_error() {
		assert!(TopologyDocument::from_yaml("topology: [unclosed").is_err());
		assert!(TopologyDocument::from_yaml("name: [1, 2]").is_err());
	}

	#[test]
	fn split_endpoint_handles_missing_interface() {
		assert_eq!(split_endpoint("leaf1:eth2"), ("leaf1", "eth2"));
		assert_eq!(split_endpoint("leaf1"), ("leaf1", ""));
	}
}
