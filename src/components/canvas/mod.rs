//! Interactive topology canvas.
//!
//! Renders nodes at their stored positions with links and interface names,
//! and turns pointer gestures into designer operations:
//! - drag a node to move it
//! - shift-drag between nodes to open the link form
//! - double-click to add or edit a node
//! - pan and zoom with background drag and the wheel

mod component;
mod render;
mod state;
pub mod theme;

pub use component::TopologyCanvas;
pub use theme::Theme;
