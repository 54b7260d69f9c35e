//! Siteview Hierarchy - The spatial tree over an imported model
//!
//! - `HierarchyBuilder` turns the engine's raw spatial structure into a `SpatialTree`
//! - `NameChain` resolves display names through a prioritized list of resolvers
//! - `VisibilityController` cascades a node's checkbox to its elements
//! - `TreeView` flattens the tree into rows for a tree panel

mod builder;
mod naming;
mod tree;
mod tree_view;
mod visibility;

pub use builder::HierarchyBuilder;
pub use naming::{humanize_category, NameChain, NameQuery, NameResolver};
pub use tree::{Node, NodeIndex, SpatialTree};
pub use tree_view::{TreeRow, TreeView};
pub use visibility::VisibilityController;
