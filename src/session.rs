//! Keeps the designer alive across page navigation within one browser session.

use log::warn;
use web_sys::Storage;

use crate::controller::Designer;
use crate::error::Result;

const SESSION_KEY: &str = "clab-designer.topology";

/// Snapshot the designer as JSON.
pub fn encode(designer: &Designer) -> Result<String> {
	Ok(serde_json::to_string(designer)?)
}

/// Rebuild a designer from a snapshot.
pub fn decode(text: &str) -> Result<Designer> {
	Ok(serde_json::from_str(text)?)
}

fn session_storage() -> Option<Storage> {
	web_sys::window()?.session_storage().ok()?
}

/// Restore the designer saved earlier in this session, if any.
pub fn restore() -> Option<Designer> {
	let text = session_storage()?.get_item(SESSION_KEY).ok()??;
	match decode(&text) {
		Ok(designer) => Some(designer),
		Err(e) => {
			warn!("clab-designer: discarding saved session: {e}");
			None
		}
	}
}

/// Write the snapshot to session storage, logging any failure.
pub fn save(designer: &Designer) {
	let Some(storage) = session_storage() else {
		return;
	};
	match encode(designer) {
		Ok(text) => {
			if storage.set_item(SESSION_KEY, &text).is_err() {
				warn!("clab-designer: session storage rejected the snapshot");
			}
		}
		Err(e) => warn!("clab-designer: could not encode session: {e}"),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::controller::NodeForm;
	use crate::topology::catalog::DesignerConfig;
	use crate::topology::model::Position;

	#[test]
	fn snapshot_round_trips_store() {
		let mut designer = Designer::new(DesignerConfig::default());
		let mut form = NodeForm::create(Position::new(3.0, 4.0), Some("linux"));
		form.prefix = "h".into();
		form.count = 2;
		designer.create_nodes(&form).unwrap();
		designer.connect("h1", "eth1", "h2", "eth1").unwrap();
		designer.open_node_form(Position::default());

		let restored = decode(&encode(&designer).unwrap()).unwrap();
		assert_eq!(restored.store(), designer.store());
		// Open forms are transient and not saved.
		assert!(restored.node_form().is_none());
	}

	#[test]
	fn garbage_does_not_decode() {
		assert!(decode("{not json").is_err());
	}
}
