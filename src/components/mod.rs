pub mod canvas;
pub mod document_editor;
pub mod panels;

pub use canvas::TopologyCanvas;
pub use document_editor::DocumentEditor;
pub use panels::{HandoffPanel, KindPanel, LinkFormPanel, LinkList, NodeFormPanel, Toolbar};
