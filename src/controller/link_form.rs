//! Transient state of the create/modify link form.

use super::node_form::FormWarning;
use crate::error::{DesignerError, Field, Result};
use crate::topology::allocator::interface_name_valid;
use crate::topology::model::Link;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LinkFormMode {
	Create,
	/// Editing the link with this id; the id survives the edit.
	Modify { link_id: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LinkForm {
	pub mode: LinkFormMode,
	pub source: String,
	pub target: String,
	pub source_interface: String,
	pub target_interface: String,
	pub warning: Option<FormWarning>,
}

impl LinkForm {
	/// Id of the link being edited, for a modify form.
	pub fn link_id(&self) -> Option<&str> {
		match &self.mode {
			LinkFormMode::Create => None,
			LinkFormMode::Modify { link_id } => Some(link_id),
		}
	}

	/// Trim both interface names and check them against the `ethN` grammar.
	///
	/// Names are compared as trimmed strings everywhere after this, so
	/// `" eth1"` and `"eth1"` can never claim the same port twice.
	pub(crate) fn to_link(&self) -> Result<Link> {
		let source_interface = self.source_interface.trim();
		let target_interface = self.target_interface.trim();
		if !interface_name_valid(source_interface) {
			return Err(DesignerError::InvalidInterface {
				name: self.source_interface.clone(),
				field: Field::SourceInterface,
			});
		}
		if !interface_name_valid(target_interface) {
			return Err(DesignerError::InvalidInterface {
				name: self.target_interface.clone(),
				field: Field::TargetInterface,
			});
		}
		Ok(Link::new(
			self.source.as_str(),
			source_interface,
			self.target.as_str(),
			target_interface,
		))
	}
}
