//! Error types for the designer core.
//!
//! Every failure here is recoverable: validation errors abort an operation before
//! the store is touched, and document errors leave the last good graph in place.

use thiserror::Error;

/// Form fields a validation error can be attached to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Field {
	/// Bulk name prefix.
	NamePrefix,
	/// Single node name.
	Name,
	/// Device kind.
	Kind,
	/// Container image.
	Image,
	/// Bulk node count.
	Count,
	/// Management IPv4 or IPv6 address or base.
	MgmtAddress,
	/// Interface on the source node.
	SourceInterface,
	/// Interface on the target node.
	TargetInterface,
	/// The link as a whole.
	Endpoints,
	/// Management IPv4 or IPv6 subnet.
	Subnet,
}

/// Everything an operation on the designer can fail with.
#[derive(Error, Debug)]
pub enum DesignerError {
	/// A required form field was left blank.
	#[error("{0:?} is required")]
	MissingField(Field),

	/// Node names may not contain `:` or whitespace.
	#[error("invalid node name {name:?}: ':' and whitespace are not allowed")]
	InvalidNodeName { name: String, field: Field },

	/// Interface name outside `eth1`..`eth54`.
	#[error("invalid interface name {name:?}: expected eth1..eth54")]
	InvalidInterface { name: String, field: Field },

	/// A link with the same endpoints and interfaces already exists.
	#[error("link {source_node}:{source_interface} <-> {target}:{target_interface} already exists")]
	DuplicateLink {
		source_node: String,
		source_interface: String,
		target: String,
		target_interface: String,
	},

	/// The interface is already reserved by another link.
	#[error("interface {interface} on {node} is already connected")]
	InterfaceInUse {
		node: String,
		interface: String,
		field: Field,
	},

	/// Every interface on the node is taken.
	#[error("no free interface left on {0}")]
	InterfacesExhausted(String),

	/// Node name already taken.
	#[error("a node named {0:?} already exists")]
	DuplicateNode(String),

	/// No node with that name.
	#[error("no node named {0:?}")]
	UnknownNode(String),

	/// No link with that id.
	#[error("no link with id {0:?}")]
	UnknownLink(String),

	/// Kind is neither in the catalog nor a declared template.
	#[error("unknown kind {0:?}")]
	UnknownKind(String),

	/// Image not offered for the chosen kind.
	#[error("image {image:?} is not available for kind {kind:?}")]
	ImageNotInCatalog { kind: String, image: String },

	/// Bulk count of zero or above the limit.
	#[error("node count must be between 1 and {max}, got {count}")]
	CountOutOfRange { count: usize, max: usize },

	/// A bulk address base has no room for this node's number.
	#[error("cannot derive a management address for {node} from {base:?}")]
	AddressExhausted { node: String, base: String },

	/// Management subnet is not in `addr/len` form.
	#[error("invalid subnet {0:?}: expected address/prefix-length")]
	InvalidSubnet(String),

	/// Submit without an open form.
	#[error("no form is open")]
	NoFormOpen,

	/// Handoff refused while the document does not parse.
	#[error("document is invalid: {0}")]
	InvalidDocument(String),

	/// The document text is not valid topology YAML.
	#[error("failed to parse topology document: {0}")]
	Parse(#[from] serde_yaml::Error),

	/// A JSON payload could not be encoded or decoded.
	#[error("failed to encode session data: {0}")]
	Encode(#[from] serde_json::Error),
}

impl DesignerError {
	/// The form field a validation error should be shown next to, if any.
	pub fn field(&self) -> Option<Field> {
		match self {
			Self::MissingField(field) => Some(*field),
			Self::InvalidNodeName { field, .. }
			| Self::InvalidInterface { field, .. }
			| Self::InterfaceInUse { field, .. } => Some(*field),
			Self::DuplicateLink { .. } | Self::UnknownNode(_) | Self::InterfacesExhausted(_) => {
				Some(Field::Endpoints)
			}
			Self::DuplicateNode(_) => Some(Field::Name),
			Self::UnknownKind(_) => Some(Field::Kind),
			Self::ImageNotInCatalog { .. } => Some(Field::Image),
			Self::CountOutOfRange { .. } => Some(Field::Count),
			Self::AddressExhausted { .. } => Some(Field::MgmtAddress),
			Self::InvalidSubnet(_) => Some(Field::Subnet),
			Self::UnknownLink(_)
			| Self::NoFormOpen
			| Self::InvalidDocument(_)
			| Self::Parse(_)
			| Self::Encode(_) => None,
		}
	}

	/// Whether this is a validation failure (as opposed to a document or encoding one).
	pub fn is_validation(&self) -> bool {
		!matches!(
			self,
			Self::InvalidDocument(_) | Self::Parse(_) | Self::Encode(_)
		)
	}
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, DesignerError>;

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_missing_field_message() {
		let error = DesignerError::MissingField(Field::Kind);
		assert_eq!(error.to_string(), "Kind is required");
		assert_eq!(error.field(), Some(Field::Kind));
	}

	#[test]
	fn test_duplicate_link_maps_to_endpoints() {
		let error = DesignerError::DuplicateLink {
			source_node: "leaf1".into(),
			source_interface: "eth1".into(),
			target: "spine1".into(),
			target_interface: "eth1".into(),
		};
		assert_eq!(
			error.to_string(),
			"link leaf1:eth1 <-> spine1:eth1 already exists"
		);
		assert_eq!(error.field(), Some(Field::Endpoints));
		assert!(error.is_validation());
	}

	#[test]
	fn test_invalid_node_name_keeps_its_field() {
		let error = DesignerError::InvalidNodeName {
			name: "r:1".into(),
			field: Field::NamePrefix,
		};
		assert_eq!(error.field(), Some(Field::NamePrefix));
		assert!(error.is_validation());
		assert_eq!(
			DesignerError::InvalidSubnet("10.0.0.0".into()).field(),
			Some(Field::Subnet)
		);
	}

	#[test]
	fn test_parse_error_is_not_validation() {
		let yaml_err = serde_yaml::from_str::<u32>("[").unwrap_err();
		let error = DesignerError::from(yaml_err);
		assert!(!error.is_validation());
		assert_eq!(error.field(), None);
	}
}
