//! Retained scene tree
//!
//! Nodes live in an arena owned by [`SceneGraph`] and are addressed by
//! [`NodeIndex`]. Wire container ids map to arena indexes through the
//! registry; shape leaves created by reference resolution are anonymous
//! arena nodes with no wire id. Nodes are never removed from the arena —
//! a detached node simply stops being reachable from the root.

use crate::protocol::{BlendMode, Color, ColorTransform, Filter, Matrix, PixelSnapping, Rectangle, Smoothing};

/// Index of a node in the scene arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIndex(u32);

impl NodeIndex {
    /// Position in the arena
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Container/shape split of a tree node.
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// Ordered list of child node references
    Container {
        /// Children in paint order
        children: Vec<NodeIndex>,
    },
    /// Leaf wrapping exactly one asset
    Shape {
        /// Asset table id of the wrapped asset
        asset_id: i32,
        /// Shape-tween interpolation ratio in `[0, 1]`
        ratio: f32,
    },
}

/// One node of the retained tree: shared render state plus the
/// container/shape split.
#[derive(Debug, Clone)]
pub struct Node {
    /// Affine transform relative to the parent
    pub matrix: Matrix,
    /// Color transform applied to the subtree
    pub color_transform: ColorTransform,
    /// Mask node, if any
    pub mask: Option<NodeIndex>,
    /// Numeric clip depth, if any
    pub clip_depth: Option<i32>,
    /// Compositing blend mode
    pub blend_mode: BlendMode,
    /// Filter list applied to the subtree
    pub filters: Vec<Filter>,
    /// Visibility flag
    pub visible: bool,
    /// Pixel snapping mode
    pub pixel_snapping: PixelSnapping,
    /// Bitmap smoothing mode
    pub smoothing: Smoothing,
    /// Container or shape payload
    pub kind: NodeKind,
}

impl Node {
    pub(crate) fn container() -> Self {
        Self::with_kind(NodeKind::Container {
            children: Vec::new(),
        })
    }

    pub(crate) fn shape(asset_id: i32) -> Self {
        Self::with_kind(NodeKind::Shape {
            asset_id,
            ratio: 0.0,
        })
    }

    fn with_kind(kind: NodeKind) -> Self {
        Self {
            matrix: Matrix::IDENTITY,
            color_transform: ColorTransform::IDENTITY,
            mask: None,
            clip_depth: None,
            blend_mode: BlendMode::Normal,
            filters: Vec::new(),
            visible: true,
            pixel_snapping: PixelSnapping::Auto,
            smoothing: Smoothing::Never,
            kind,
        }
    }

    /// Check whether this node is a container
    #[must_use]
    pub const fn is_container(&self) -> bool {
        matches!(self.kind, NodeKind::Container { .. })
    }

    /// Check whether this node is a shape leaf
    #[must_use]
    pub const fn is_shape(&self) -> bool {
        matches!(self.kind, NodeKind::Shape { .. })
    }

    /// Children in paint order (empty for shape leaves)
    #[must_use]
    pub fn children(&self) -> &[NodeIndex] {
        match &self.kind {
            NodeKind::Container { children } => children,
            NodeKind::Shape { .. } => &[],
        }
    }

    /// Asset id wrapped by a shape leaf
    #[must_use]
    pub const fn shape_asset(&self) -> Option<i32> {
        match self.kind {
            NodeKind::Shape { asset_id, .. } => Some(asset_id),
            NodeKind::Container { .. } => None,
        }
    }

    /// Interpolation ratio of a shape leaf
    #[must_use]
    pub const fn ratio(&self) -> Option<f32> {
        match self.kind {
            NodeKind::Shape { ratio, .. } => Some(ratio),
            NodeKind::Container { .. } => None,
        }
    }

    /// Stamp an interpolation ratio; a no-op on containers.
    ///
    /// Returns whether the ratio was applied.
    pub fn set_ratio(&mut self, value: f32) -> bool {
        match &mut self.kind {
            NodeKind::Shape { ratio, .. } => {
                *ratio = value;
                true
            }
            NodeKind::Container { .. } => false,
        }
    }
}

/// Mutable state of the root container.
#[derive(Debug, Clone)]
pub struct Stage {
    /// Stage bounds
    pub bounds: Rectangle,
    /// Background color
    pub color: Color,
    /// Whether the root composites over a transparent background
    pub transparent: bool,
}

/// Arena of tree nodes with a persistent root container.
///
/// The root is created once per session and only ever mutated, never
/// replaced.
#[derive(Debug)]
pub struct SceneGraph {
    nodes: Vec<Node>,
    root: NodeIndex,
    stage: Stage,
}

impl SceneGraph {
    /// Create a graph holding only the root container
    #[must_use]
    pub fn new(stage: Stage) -> Self {
        Self {
            nodes: vec![Node::container()],
            root: NodeIndex(0),
            stage,
        }
    }

    /// The root container
    #[must_use]
    pub const fn root(&self) -> NodeIndex {
        self.root
    }

    /// Stage state carried by the root
    #[must_use]
    pub const fn stage(&self) -> &Stage {
        &self.stage
    }

    /// Mutable stage state
    pub fn stage_mut(&mut self) -> &mut Stage {
        &mut self.stage
    }

    /// Borrow a node
    #[must_use]
    pub fn node(&self, index: NodeIndex) -> &Node {
        &self.nodes[index.index()]
    }

    /// Mutably borrow a node
    pub fn node_mut(&mut self, index: NodeIndex) -> &mut Node {
        &mut self.nodes[index.index()]
    }

    /// Number of nodes ever created, root included
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false; the root exists from construction
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub(crate) fn insert(&mut self, node: Node) -> NodeIndex {
        let index = NodeIndex(self.nodes.len() as u32);
        self.nodes.push(node);
        index
    }

    /// Swap in a new children list, returning the detached one.
    ///
    /// Shape leaves have no children; the call returns empty and stores
    /// nothing.
    pub(crate) fn replace_children(
        &mut self,
        index: NodeIndex,
        new: Vec<NodeIndex>,
    ) -> Vec<NodeIndex> {
        match &mut self.nodes[index.index()].kind {
            NodeKind::Container { children } => std::mem::replace(children, new),
            NodeKind::Shape { .. } => Vec::new(),
        }
    }

    pub(crate) fn push_child(&mut self, parent: NodeIndex, child: NodeIndex) {
        if let NodeKind::Container { children } = &mut self.nodes[parent.index()].kind {
            children.push(child);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph() -> SceneGraph {
        SceneGraph::new(Stage {
            bounds: Rectangle::new(0.0, 0.0, 128.0, 128.0),
            color: Color::from_argb(0),
            transparent: false,
        })
    }

    #[test]
    fn test_root_is_container() {
        let graph = graph();
        assert!(graph.node(graph.root()).is_container());
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn test_replace_children_returns_detached() {
        let mut graph = graph();
        let root = graph.root();
        let a = graph.insert(Node::container());
        let b = graph.insert(Node::shape(3));
        graph.push_child(root, a);
        graph.push_child(root, b);

        let old = graph.replace_children(root, vec![a]);
        assert_eq!(old, vec![a, b]);
        assert_eq!(graph.node(root).children(), &[a]);
    }

    #[test]
    fn test_ratio_stamp_ignores_containers() {
        let mut graph = graph();
        let container = graph.insert(Node::container());
        let shape = graph.insert(Node::shape(1));

        assert!(!graph.node_mut(container).set_ratio(0.5));
        assert!(graph.node_mut(shape).set_ratio(0.5));
        assert_eq!(graph.node(shape).ratio(), Some(0.5));
    }
}
