//! Device catalog and start-up configuration.
//!
//! The catalog is a read-only lookup table of kinds and the images each one may
//! run. It is supplied by the page hosting the designer; when nothing is
//! supplied the built-in list below is used.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::model::{Identity, Settings};
use crate::error::{DesignerError, Result};

/// Kinds and the container images valid for each.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceCatalog {
	kinds: IndexMap<String, Vec<String>>,
}

impl Default for DeviceCatalog {
	fn default() -> Self {
		let kinds = [
			("nokia_srlinux", &["ghcr.io/nokia/srlinux:latest"][..]),
			("ceos", &["ceos:latest", "ceos:4.32.0F"][..]),
			("crpd", &["crpd:latest"][..]),
			("vr-sros", &["vrnetlab/vr-sros:latest"][..]),
			("linux", &["alpine:latest", "ubuntu:latest", "frrouting/frr:latest"][..]),
			("bridge", &[][..]),
		]
		.into_iter()
		.map(|(kind, images)| {
			(
				kind.to_string(),
				images.iter().map(|i| i.to_string()).collect(),
			)
		})
		.collect();
		Self { kinds }
	}
}

impl DeviceCatalog {
	/// Catalog offering `kinds` with their images.
	pub fn new(kinds: IndexMap<String, Vec<String>>) -> Self {
		Self { kinds }
	}

	/// Kind names in catalog order.
	pub fn kinds(&self) -> impl Iterator<Item = &str> {
		self.kinds.keys().map(String::as_str)
	}

	/// Images offered for `kind`; empty when unknown.
	pub fn images(&self, kind: &str) -> &[String] {
		self.kinds.get(kind).map(Vec::as_slice).unwrap_or_default()
	}

	/// Check a kind/image pair against the catalog and the topology's own kind templates.
	///
	/// An empty image is always accepted. A kind only declared as a template has no
	/// image restriction.
	pub fn validate(&self, settings: &Settings, kind: &str, image: &str) -> Result<()> {
		let known = self.kinds.contains_key(kind) || settings.kind_template(kind).is_some();
		if !known {
			return Err(DesignerError::UnknownKind(kind.to_string()));
		}
		let images = self.images(kind);
		if image.is_empty() || images.is_empty() || images.iter().any(|i| i == image) {
			Ok(())
		} else {
			Err(DesignerError::ImageNotInCatalog {
				kind: kind.to_string(),
				image: image.to_string(),
			})
		}
	}
}

fn default_network() -> String {
	"clab-mgmt".to_string()
}

/// Everything the host page hands the designer at start-up.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DesignerConfig {
	pub catalog: DeviceCatalog,
	/// Network name pre-filled when management addressing is switched on.
	#[serde(default = "default_network")]
	pub mgmt_network: String,
	pub identity: Identity,
}

impl Default for DesignerConfig {
	fn default() -> Self {
		Self {
			catalog: DeviceCatalog::default(),
			mgmt_network: default_network(),
			identity: Identity::default(),
		}
	}
}

impl DesignerConfig {
	/// Parse the page-embedded JSON config.
	pub fn from_json(text: &str) -> Result<Self> {
		Ok(serde_json::from_str(text)?)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::topology::model::KindTemplate;

	#[test]
	fn validate_kind_and_image() {
		let catalog = DeviceCatalog::default();
		let settings = Settings::default();
		assert!(catalog.validate(&settings, "ceos", "ceos:latest").is_ok());
		assert!(catalog.validate(&settings, "ceos", "").is_ok());
		assert!(matches!(
			catalog.validate(&settings, "ceos", "alpine:latest"),
			Err(DesignerError::ImageNotInCatalog { .. })
		));
		assert!(matches!(
			catalog.validate(&settings, "juniper_vmx", ""),
			Err(DesignerError::UnknownKind(_))
		));
	}

	#[test]
	fn template_kinds_are_known() {
		let catalog = DeviceCatalog::default();
		let settings = Settings {
			kinds: vec![KindTemplate {
				name: "custom".into(),
				..KindTemplate::default()
			}],
			..Settings::default()
		};
		assert!(catalog.validate(&settings, "custom", "anything:1").is_ok());
	}

	#[test]
	fn config_parses_partial_json() {
		let config = DesignerConfig::from_json(
			r#"{"identity": {"username": "alice", "role": "admin"}, "catalog": {"linux": ["alpine:3"]}}"#,
		)
		.unwrap();
		assert_eq!(config.identity.username, "alice");
		assert_eq!(config.catalog.images("linux"), ["alpine:3".to_string()]);
		assert_eq!(config.mgmt_network, "clab-mgmt");
	}
}
