//! clab-designer: visual designer for containerlab topology definitions.
//!
//! Nodes and links drawn on a canvas and the topology YAML document are kept
//! in step both ways: every graph edit re-renders the document, and every
//! document edit that parses rebuilds the graph. Interface names, management
//! addresses and bulk node names are allocated automatically.

use leptos::prelude::*;
use leptos_meta::*;
use log::{Level, info, warn};
use wasm_bindgen::JsCast;
use web_sys::{HtmlScriptElement, Window};

pub mod components;
pub mod controller;
pub mod error;
pub mod handoff;
pub mod session;
pub mod topology;

#[cfg(target_arch = "wasm32")]
use getrandom as _;

use components::{
	DocumentEditor, HandoffPanel, KindPanel, LinkFormPanel, LinkList, NodeFormPanel, Toolbar, TopologyCanvas,
};
pub use controller::Designer;
pub use error::{DesignerError, Result};
pub use topology::DesignerConfig;

/// Initialize logging and panic hooks for the WASM target.
pub fn init_logging() {
	let _ = console_log::init_with_level(Level::Debug);
	console_error_panic_hook::set_once();
	info!("clab-designer: logging initialized");
}

/// Load the designer config from a script element with id="designer-config".
/// Expected format: JSON with { catalog: {...}, mgmt_network, identity: {...} }
fn load_config() -> Option<DesignerConfig> {
	let window: Window = web_sys::window()?;
	let document = window.document()?;
	let element = document.get_element_by_id("designer-config")?;
	let script: HtmlScriptElement = element.dyn_into().ok()?;
	let json_text = script.text().ok()?;

	match DesignerConfig::from_json(&json_text) {
		Ok(config) => {
			info!(
				"clab-designer: loaded catalog with {} kinds for {:?}",
				config.catalog.kinds().count(),
				config.identity.username
			);
			Some(config)
		}
		Err(e) => {
			warn!("clab-designer: failed to parse designer config: {}", e);
			None
		}
	}
}

/// Main application component.
/// Restores the session or starts empty, then lays out canvas, panels and document.
#[component]
pub fn App() -> impl IntoView {
	provide_meta_context();

	let designer = session::restore().unwrap_or_else(|| Designer::new(load_config().unwrap_or_default()));
	let designer = RwSignal::new(designer);

	Effect::new(move |_| designer.with(session::save));

	view! {
		<Html attr:lang="en" attr:dir="ltr" attr:data-theme="dark" />
		<Title text="Topology Designer" />
		<Meta charset="UTF-8" />
		<Meta name="viewport" content="width=device-width, initial-scale=1.0" />

		<div class="designer">
			<Toolbar designer=designer />
			<main class="workspace">
				<div class="canvas-pane">
					<TopologyCanvas designer=designer />
					<p class="hint">
						"Double-click to add a node. Shift-drag between nodes to link them. Scroll to zoom."
					</p>
				</div>
				<aside class="sidebar">
					<NodeFormPanel designer=designer />
					<LinkFormPanel designer=designer />
					<LinkList designer=designer />
					<KindPanel designer=designer />
					<HandoffPanel designer=designer />
				</aside>
				<DocumentEditor designer=designer />
			</main>
		</div>
	}
}
