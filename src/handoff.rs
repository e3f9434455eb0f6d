//! Payloads handed to the services around the designer.
//!
//! The designer never talks to the network itself. It produces these
//! requests from a committed, valid document; the page's glue code sends them
//! and streams any progress output straight to the screen.

use log::{info, warn};
use serde::{Deserialize, Serialize};
use wasm_bindgen::JsValue;
use web_sys::{CustomEvent, CustomEventInit};

use crate::controller::Designer;
use crate::error::{DesignerError, Result};
use crate::topology::names;

/// Window event carrying a [`DeployRequest`] as its JSON `detail`.
pub const DEPLOY_EVENT: &str = "clab-designer:deploy";
/// Window event carrying an [`ExportRequest`] as its JSON `detail`.
pub const EXPORT_EVENT: &str = "clab-designer:export";

/// Deploy/destroy/reconfigure request for the lab orchestration service.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployRequest {
	pub document_text: String,
	pub topology_name: String,
	pub target_server: String,
}

/// Upload of the document to the file service.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
	/// `<topology name>.clab.yml`
	pub file_name: String,
	pub document_text: String,
}

/// The text to hand over: the editor copy, refused while it does not parse.
fn valid_document(designer: &Designer) -> Result<&str> {
	let document = designer.store().document();
	if let Some(error) = &document.error {
		return Err(DesignerError::InvalidDocument(error.clone()));
	}
	Ok(&document.editable)
}

fn qualified_name(designer: &Designer) -> String {
	let store = designer.store();
	names::qualify(&store.settings().name, &store.identity().username)
}

/// Payload asking the page to deploy the current document on `target_server`.
pub fn deploy_request(designer: &Designer, target_server: &str) -> Result<DeployRequest> {
	Ok(DeployRequest {
		document_text: valid_document(designer)?.to_string(),
		topology_name: qualified_name(designer),
		target_server: target_server.to_string(),
	})
}

/// Payload carrying the current document for download.
pub fn export_request(designer: &Designer) -> Result<ExportRequest> {
	Ok(ExportRequest {
		file_name: format!("{}.clab.yml", qualified_name(designer)),
		document_text: valid_document(designer)?.to_string(),
	})
}

/// Hand `payload` to the page by dispatching `event` on `window`.
pub fn dispatch(event: &str, payload: &impl Serialize) -> Result<()> {
	let detail = serde_json::to_string(payload)?;
	let Some(window) = web_sys::window() else {
		return Ok(());
	};
	let init = CustomEventInit::new();
	init.set_detail(&JsValue::from_str(&detail));
	match CustomEvent::new_with_event_init_dict(event, &init) {
		Ok(custom) => match window.dispatch_event(&custom) {
			Ok(_) => info!("clab-designer: dispatched {event}"),
			Err(_) => warn!("clab-designer: {event} listener threw"),
		},
		Err(_) => warn!("clab-designer: could not create {event}"),
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::controller::NodeForm;
	use crate::topology::catalog::DesignerConfig;
	use crate::topology::model::{Identity, Position};

	fn designer_with_node() -> Designer {
		let mut designer = Designer::new(DesignerConfig {
			identity: Identity {
				username: "carol".into(),
				role: "user".into(),
			},
			..DesignerConfig::default()
		});
		designer.set_topology_name("core").unwrap();
		let mut form = NodeForm::create(Position::default(), Some("linux"));
		form.name = "r1".into();
		designer.create_nodes(&form).unwrap();
		designer
	}

	#[test]
	fn deploy_request_carries_document() {
		let designer = designer_with_node();
		let request = deploy_request(&designer, "lab-server-2").unwrap();
		assert_eq!(request.topology_name, "carol-core");
		assert!(request.document_text.contains("r1"));
		let json = serde_json::to_string(&request).unwrap();
		assert!(json.contains("\"targetServer\":\"lab-server-2\""));
	}

	#[test]
	fn invalid_document_is_refused() {
		let mut designer = designer_with_node();
		assert!(designer.edit_document("topology: [").is_err());
		assert!(matches!(
			export_request(&designer),
			Err(DesignerError::InvalidDocument(_))
		));
	}

	#[test]
	fn export_uses_qualified_file_name() {
		let designer = designer_with_node();
		assert_eq!(export_request(&designer).unwrap().file_name, "carol-core.clab.yml");
	}
}
