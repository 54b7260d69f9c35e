//! Siteview Core - Foundational types for the Siteview annotation engine
//!
//! This crate provides the types every other Siteview crate depends on:
//! - `ElementId`, `NodeId`, `CommentId` - identifiers
//! - `Vec3`, `Color` - spatial and display types
//! - `SiteviewConfig` - layered configuration
//! - Error types and Result alias

mod config;
mod error;
mod id;
mod types;

pub use config::{
    AnchorConfig, CommentConfig, GizmoConfig, HierarchyConfig, NodeIdStrategy, PointerButton,
    SiteviewConfig,
};
pub use error::{Result, SiteviewError};
pub use id::{CommentId, ElementId, NodeId};
pub use types::{Color, Vec3};
