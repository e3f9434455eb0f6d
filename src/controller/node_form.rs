//! Transient state of the create/modify node form.

use indexmap::IndexMap;

use crate::error::{DesignerError, Field};
use crate::topology::model::{BindMount, Node, Position};

/// Largest batch a single bulk create may add.
pub const MAX_BULK_NODES: usize = 100;

#[derive(Clone, Debug, PartialEq)]
pub enum NodeFormMode {
	/// New node(s) dropped on the canvas at this position.
	Create { drop: Position },
	/// Editing the node currently named `original`.
	Modify { original: String },
}

/// Inline warning shown in the form after a failed submit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FormWarning {
	pub field: Option<Field>,
	pub message: String,
}

impl From<&DesignerError> for FormWarning {
	fn from(error: &DesignerError) -> Self {
		Self {
			field: error.field(),
			message: error.to_string(),
		}
	}
}

/// Fields the user fills in. Nothing here touches the store until submit.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeForm {
	pub mode: NodeFormMode,
	pub prefix: String,
	/// Explicit name; when blank the next `<prefix>N` is used.
	pub name: String,
	pub count: usize,
	pub kind: String,
	pub image: String,
	pub binds: Vec<BindMount>,
	pub startup_config: String,
	pub env: Vec<(String, String)>,
	/// Address for a single node, or the shared base when creating several.
	pub mgmt_ipv4: String,
	pub mgmt_ipv6: String,
	pub warning: Option<FormWarning>,
}

impl NodeForm {
	/// Empty create form for a drop at `drop`.
	pub fn create(drop: Position, default_kind: Option<&str>) -> Self {
		Self {
			mode: NodeFormMode::Create { drop },
			prefix: "node".to_string(),
			name: String::new(),
			count: 1,
			kind: default_kind.unwrap_or_default().to_string(),
			image: String::new(),
			binds: Vec::new(),
			startup_config: String::new(),
			env: Vec::new(),
			mgmt_ipv4: String::new(),
			mgmt_ipv6: String::new(),
			warning: None,
		}
	}

	/// Modify form pre-filled from `node`.
	pub fn modify(node: &Node) -> Self {
		Self {
			mode: NodeFormMode::Modify {
				original: node.id.clone(),
			},
			prefix: String::new(),
			name: node.id.clone(),
			count: 1,
			kind: node.kind.clone(),
			image: node.image.clone(),
			binds: node.binds.clone(),
			startup_config: node.startup_config.clone().unwrap_or_default(),
			env: node
				.env
				.iter()
				.map(|(k, v)| (k.clone(), v.clone()))
				.collect(),
			mgmt_ipv4: node.mgmt_ipv4.clone().unwrap_or_default(),
			mgmt_ipv6: node.mgmt_ipv6.clone().unwrap_or_default(),
			warning: None,
		}
	}

	/// Whether submitting creates more than one node.
	pub fn is_bulk(&self) -> bool {
		matches!(self.mode, NodeFormMode::Create { .. }) && self.count > 1
	}

	/// Required-field checks. Never fills in a missing value.
	pub(crate) fn check_required(&self) -> Result<(), DesignerError> {
		if self.kind.trim().is_empty() {
			return Err(DesignerError::MissingField(Field::Kind));
		}
		match self.mode {
			NodeFormMode::Modify { .. } if self.name.trim().is_empty() => {
				Err(DesignerError::MissingField(Field::Name))
			}
			NodeFormMode::Create { .. } => {
				if !(1..=MAX_BULK_NODES).contains(&self.count) {
					return Err(DesignerError::CountOutOfRange {
						count: self.count,
						max: MAX_BULK_NODES,
					});
				}
				let needs_prefix = self.is_bulk() || self.name.trim().is_empty();
				if needs_prefix && self.prefix.trim().is_empty() {
					return Err(DesignerError::MissingField(Field::NamePrefix));
				}
				Ok(())
			}
			NodeFormMode::Modify { .. } => Ok(()),
		}
	}

	/// Copy the form's device fields onto `node`, leaving id and position alone.
	pub(crate) fn apply_to(&self, node: &mut Node) {
		node.kind = self.kind.trim().to_string();
		node.image = self.image.trim().to_string();
		node.binds = self.binds.clone();
		node.startup_config = optional(&self.startup_config);
		node.env = self
			.env
			.iter()
			.filter(|(k, _)| !k.trim().is_empty())
			.map(|(k, v)| (k.trim().to_string(), v.clone()))
			.collect::<IndexMap<_, _>>();
		node.mgmt_ipv4 = optional(&self.mgmt_ipv4);
		node.mgmt_ipv6 = optional(&self.mgmt_ipv6);
	}
}

fn optional(value: &str) -> Option<String> {
	let value = value.trim();
	(!value.is_empty()).then(|| value.to_string())
}
