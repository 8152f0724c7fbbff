//! Wire-id tables and composite reference resolution
//!
//! Two parallel tables: wire container ids to arena indexes, and asset ids
//! to assets. Referrer tracking is kept as explicit reverse indexes so
//! in-place asset updates propagate without re-resolving references.

use std::collections::{BTreeSet, HashMap};

use super::asset::{Asset, BitmapAsset, ShapeAsset, TextAsset};
use super::node::{Node, NodeIndex, SceneGraph};
use crate::protocol::{Error, IdSpace, NodeRef, Result};

/// Session tables: tree-node ids, asset ids, and the referrer indexes.
#[derive(Debug, Default)]
pub struct Registry {
    nodes: HashMap<i32, NodeIndex>,
    assets: HashMap<i32, Asset>,
    /// asset id -> shape leaves wrapping it
    shape_referrers: HashMap<i32, BTreeSet<NodeIndex>>,
    /// bitmap asset id -> shape assets using it as a fill
    fill_referrers: HashMap<i32, BTreeSet<i32>>,
}

impl Registry {
    /// Create empty tables
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a wire container id
    pub fn node(&self, id: i32) -> Result<NodeIndex> {
        self.find_node(id).ok_or(Error::UnresolvedReference {
            space: IdSpace::Node,
            id,
        })
    }

    /// Look up a wire container id without failing
    #[must_use]
    pub fn find_node(&self, id: i32) -> Option<NodeIndex> {
        self.nodes.get(&id).copied()
    }

    /// Bind a wire container id to an arena index
    pub fn bind_node(&mut self, id: i32, index: NodeIndex) {
        self.nodes.insert(id, index);
    }

    /// Check whether an asset id is defined
    #[must_use]
    pub fn contains_asset(&self, id: i32) -> bool {
        self.assets.contains_key(&id)
    }

    /// Insert a newly defined asset.
    ///
    /// Shape assets have their fill references added to the reverse index
    /// in the same step.
    pub fn insert_asset(&mut self, id: i32, asset: Asset) {
        if let Asset::Shape(shape) = &asset {
            for &fill in &shape.fills {
                self.fill_referrers.entry(fill).or_default().insert(id);
            }
        }
        self.assets.insert(id, asset);
    }

    /// Borrow an asset
    pub fn asset(&self, id: i32) -> Result<&Asset> {
        self.assets.get(&id).ok_or(Error::UnresolvedReference {
            space: IdSpace::Asset,
            id,
        })
    }

    /// Mutably borrow an asset
    pub fn asset_mut(&mut self, id: i32) -> Result<&mut Asset> {
        self.assets.get_mut(&id).ok_or(Error::UnresolvedReference {
            space: IdSpace::Asset,
            id,
        })
    }

    /// Borrow an asset as a bitmap
    pub fn bitmap(&self, id: i32) -> Result<&BitmapAsset> {
        self.asset(id)?
            .as_bitmap()
            .ok_or(Error::AssetKindMismatch {
                id,
                expected: "bitmap",
            })
    }

    /// Mutably borrow an asset as a bitmap
    pub fn bitmap_mut(&mut self, id: i32) -> Result<&mut BitmapAsset> {
        match self.asset_mut(id)? {
            Asset::Bitmap(bitmap) => Ok(bitmap),
            _ => Err(Error::AssetKindMismatch {
                id,
                expected: "bitmap",
            }),
        }
    }

    /// Mutably borrow an asset as a shape
    pub fn shape_mut(&mut self, id: i32) -> Result<&mut ShapeAsset> {
        match self.asset_mut(id)? {
            Asset::Shape(shape) => Ok(shape),
            _ => Err(Error::AssetKindMismatch {
                id,
                expected: "shape",
            }),
        }
    }

    /// Borrow an asset as a text block
    pub fn text(&self, id: i32) -> Result<&TextAsset> {
        self.asset(id)?.as_text().ok_or(Error::AssetKindMismatch {
            id,
            expected: "text",
        })
    }

    /// Mutably borrow an asset as a text block
    pub fn text_mut(&mut self, id: i32) -> Result<&mut TextAsset> {
        match self.asset_mut(id)? {
            Asset::Text(text) => Ok(text),
            _ => Err(Error::AssetKindMismatch {
                id,
                expected: "text",
            }),
        }
    }

    /// Resolve a composite reference.
    ///
    /// Asset references wrap the asset in a fresh anonymous shape leaf and
    /// record the leaf in the referrer index; node references look up the
    /// container table. Ids absent from the relevant table fail with
    /// [`Error::UnresolvedReference`] — definitions precede references on
    /// a well-formed stream.
    pub fn resolve(
        &mut self,
        reference: NodeRef,
        graph: &mut SceneGraph,
    ) -> Result<Option<NodeIndex>> {
        match reference {
            NodeRef::None => Ok(None),
            NodeRef::Node(id) => self.node(id).map(Some),
            NodeRef::Asset(id) => {
                if !self.contains_asset(id) {
                    return Err(Error::UnresolvedReference {
                        space: IdSpace::Asset,
                        id,
                    });
                }
                let leaf = graph.insert(Node::shape(id));
                self.shape_referrers.entry(id).or_default().insert(leaf);
                Ok(Some(leaf))
            }
        }
    }

    /// Shape leaves currently registered as referrers of an asset
    pub fn shape_referrers(&self, asset_id: i32) -> impl Iterator<Item = NodeIndex> + '_ {
        self.shape_referrers
            .get(&asset_id)
            .into_iter()
            .flatten()
            .copied()
    }

    /// Shape assets currently using a bitmap as a fill
    pub fn fill_referrers(&self, bitmap_id: i32) -> impl Iterator<Item = i32> + '_ {
        self.fill_referrers
            .get(&bitmap_id)
            .into_iter()
            .flatten()
            .copied()
    }

    /// Drop a shape leaf from an asset's referrer set (the leaf was
    /// detached by a children replace)
    pub fn remove_shape_referrer(&mut self, asset_id: i32, node: NodeIndex) {
        if let Some(referrers) = self.shape_referrers.get_mut(&asset_id) {
            referrers.remove(&node);
            if referrers.is_empty() {
                self.shape_referrers.remove(&asset_id);
            }
        }
    }

    /// Re-point the fill reverse index after a shape redefinition
    pub fn repoint_fills(&mut self, shape_id: i32, old: &[i32], new: &[i32]) {
        for &fill in old {
            if let Some(referrers) = self.fill_referrers.get_mut(&fill) {
                referrers.remove(&shape_id);
                if referrers.is_empty() {
                    self.fill_referrers.remove(&fill);
                }
            }
        }
        for &fill in new {
            self.fill_referrers.entry(fill).or_default().insert(shape_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{Color, ImageFormat, Rectangle};
    use crate::scene::node::Stage;
    use bytes::Bytes;

    fn graph() -> SceneGraph {
        SceneGraph::new(Stage {
            bounds: Rectangle::new(0.0, 0.0, 128.0, 128.0),
            color: Color::from_argb(0),
            transparent: false,
        })
    }

    fn bitmap() -> Asset {
        Asset::Bitmap(BitmapAsset {
            symbol_id: 9,
            bounds: Rectangle::new(0.0, 0.0, 8.0, 8.0),
            format: ImageFormat::StraightAlphaRgba,
            pixels: Bytes::from_static(&[0; 4]),
        })
    }

    #[test]
    fn test_undefined_references_fail() {
        let mut registry = Registry::new();
        let mut graph = graph();

        assert!(matches!(
            registry.node(5),
            Err(Error::UnresolvedReference {
                space: IdSpace::Node,
                id: 5
            })
        ));
        assert!(matches!(
            registry.resolve(NodeRef::Asset(5), &mut graph),
            Err(Error::UnresolvedReference {
                space: IdSpace::Asset,
                id: 5
            })
        ));
    }

    #[test]
    fn test_asset_resolution_creates_referring_leaf() {
        let mut registry = Registry::new();
        let mut graph = graph();
        registry.insert_asset(2, bitmap());

        let leaf = registry
            .resolve(NodeRef::Asset(2), &mut graph)
            .unwrap()
            .unwrap();
        assert_eq!(graph.node(leaf).shape_asset(), Some(2));
        assert_eq!(registry.shape_referrers(2).collect::<Vec<_>>(), vec![leaf]);

        // a second reference wraps the asset in a second, distinct leaf
        let other = registry
            .resolve(NodeRef::Asset(2), &mut graph)
            .unwrap()
            .unwrap();
        assert_ne!(leaf, other);
        assert_eq!(registry.shape_referrers(2).count(), 2);
    }

    #[test]
    fn test_none_reference_resolves_to_nothing() {
        let mut registry = Registry::new();
        let mut graph = graph();
        assert_eq!(registry.resolve(NodeRef::None, &mut graph).unwrap(), None);
    }

    #[test]
    fn test_kind_mismatch() {
        let mut registry = Registry::new();
        registry.insert_asset(1, bitmap());
        assert!(matches!(
            registry.shape_mut(1),
            Err(Error::AssetKindMismatch {
                id: 1,
                expected: "shape"
            })
        ));
    }

    #[test]
    fn test_fill_reverse_index() {
        let mut registry = Registry::new();
        registry.insert_asset(1, bitmap());
        registry.insert_asset(2, bitmap());
        registry.insert_asset(
            10,
            Asset::Shape(ShapeAsset {
                symbol_id: 3,
                bounds: Rectangle::EMPTY,
                path_data: Bytes::new(),
                fills: vec![1, 2],
            }),
        );

        assert_eq!(registry.fill_referrers(1).collect::<Vec<_>>(), vec![10]);

        registry.repoint_fills(10, &[1, 2], &[2]);
        assert_eq!(registry.fill_referrers(1).count(), 0);
        assert_eq!(registry.fill_referrers(2).collect::<Vec<_>>(), vec![10]);
    }
}
