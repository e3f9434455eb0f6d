//! Topology core: graph model, allocator, document translator and store.

pub mod allocator;
pub mod catalog;
pub mod document;
pub mod model;
pub mod names;
pub mod registry;
pub mod store;
pub mod translator;

pub use catalog::{DesignerConfig, DeviceCatalog};
pub use model::{BindMount, Identity, KindTemplate, Link, Management, Node, Position, Settings};
pub use registry::InterfaceRegistry;
pub use store::{DocumentState, TopologyStore};
