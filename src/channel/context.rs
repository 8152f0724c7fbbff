//! Session state for one remoting channel

use std::sync::Arc;

use crate::protocol::{Color, NodeRef, Rectangle, Result};
use crate::scene::{Asset, NodeIndex, Registry, SceneGraph, Stage};

use super::host::RenderHost;
use super::stats::ChannelStats;

/// Construction-time options for a channel session.
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// Initial bounds of the root container
    pub root_bounds: Rectangle,
    /// Whether the root composites over a transparent background
    pub transparent: bool,
    /// Bounds assigned to video assets at registration
    pub video_bounds: Rectangle,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            root_bounds: Rectangle::new(0.0, 0.0, 128.0, 128.0),
            transparent: false,
            video_bounds: Rectangle::new(0.0, 0.0, 960.0, 480.0),
        }
    }
}

/// Per-channel session state: the tree, both id tables, and the host
/// handle.
///
/// Created once when a channel is established and torn down when it
/// closes. Tables and tree persist for the session and are only ever
/// additively or mutably updated. Not internally synchronized — batch
/// processing owns the context exclusively.
pub struct ChannelContext {
    graph: SceneGraph,
    registry: Registry,
    host: Arc<dyn RenderHost>,
    config: ChannelConfig,
    stats: ChannelStats,
}

impl ChannelContext {
    /// Create a session with a fresh root container
    #[must_use]
    pub fn new(host: Arc<dyn RenderHost>, config: ChannelConfig) -> Self {
        let stage = Stage {
            bounds: config.root_bounds,
            color: Color::from_argb(0),
            transparent: config.transparent,
        };
        Self {
            graph: SceneGraph::new(stage),
            registry: Registry::new(),
            host,
            config,
            stats: ChannelStats::default(),
        }
    }

    /// The retained tree
    #[must_use]
    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    /// Mutable access to the retained tree
    pub fn graph_mut(&mut self) -> &mut SceneGraph {
        &mut self.graph
    }

    /// The id tables
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Mutable access to the id tables
    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    /// The rendering host
    #[must_use]
    pub fn host(&self) -> &Arc<dyn RenderHost> {
        &self.host
    }

    /// Session options
    #[must_use]
    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }

    /// Message counters for this channel
    #[must_use]
    pub fn stats(&self) -> &ChannelStats {
        &self.stats
    }

    pub(crate) fn stats_mut(&mut self) -> &mut ChannelStats {
        &mut self.stats
    }

    /// Register an asset and announce it to the inspector hook
    pub fn register_asset(&mut self, id: i32, asset: Asset) {
        self.host.register_inspector_asset(id, asset.symbol_id(), &asset);
        self.registry.insert_asset(id, asset);
    }

    /// Resolve a composite reference against the session tables
    pub fn resolve(&mut self, reference: NodeRef) -> Result<Option<NodeIndex>> {
        self.registry.resolve(reference, &mut self.graph)
    }

    pub(crate) fn parts_mut(&mut self) -> (&mut SceneGraph, &mut Registry) {
        (&mut self.graph, &mut self.registry)
    }
}
