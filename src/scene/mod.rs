//! Retained scene graph
//!
//! The persistent tree mutated by the channel dispatcher: arena-backed
//! nodes, standalone assets, and the id registry that ties wire ids to
//! both.

mod asset;
mod node;
mod registry;

pub use asset::{Asset, BitmapAsset, LineMetrics, ShapeAsset, TextAsset, TextLayout, VideoAsset};
pub use node::{Node, NodeIndex, NodeKind, SceneGraph, Stage};
pub use registry::Registry;
