//! Rendering-host collaborator interface
//!
//! The channel owns the tree and tables; everything that touches real
//! pixels, fonts, or the return transport is lent by the host through
//! [`RenderHost`].

use bytes::Bytes;

use crate::protocol::{BlendMode, ColorTransform, ImageFormat, Matrix, Rectangle};
use crate::scene::{Asset, BitmapAsset, NodeIndex, SceneGraph, TextAsset, TextLayout};

/// Pixels produced by the host's asynchronous image decode.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    /// Width in pixels
    pub width: i32,
    /// Height in pixels
    pub height: i32,
    /// Straight-alpha RGBA pixel bytes
    pub pixels: Bytes,
}

/// Completion callback for [`RenderHost::decode_image`].
///
/// Fires with `None` when decoding fails; failure is reported to the
/// producer as a success-shaped "no image" response, never as an error.
pub type DecodeCallback = Box<dyn FnOnce(Option<DecodedImage>) + Send + 'static>;

/// Pixels produced by rendering a node into a bitmap.
#[derive(Debug, Clone)]
pub struct BitmapContent {
    /// Bounds of the rendered content
    pub bounds: Rectangle,
    /// Pixel format of `pixels`
    pub format: ImageFormat,
    /// Raw pixel bytes
    pub pixels: Bytes,
}

/// Bitmask-gated parameters for [`RenderHost::render_node`].
#[derive(Debug, Clone)]
pub struct DrawNodeParams {
    /// Source transform (identity when the message omits it)
    pub matrix: Matrix,
    /// Optional color transform
    pub color_transform: Option<ColorTransform>,
    /// Optional clip rectangle
    pub clip: Option<Rectangle>,
    /// Compositing blend mode
    pub blend_mode: BlendMode,
    /// Smoothing flag carried by the message; currently unused by the
    /// reference rasterizer
    pub smoothing: bool,
}

/// Capabilities the rendering host lends to a channel session.
///
/// Implementations must be shareable across threads: the decode-image
/// completion path may run on a different scheduling context than batch
/// processing. The callback only ever touches the host itself, never the
/// session tables.
pub trait RenderHost: Send + Sync {
    /// Register an embedded font binary under `id`; text layout refers to
    /// the family name derived from the id. Repeated registration of the
    /// same id is accepted.
    fn register_font(&self, id: i32, bold: bool, italic: bool, data: Bytes);

    /// Lay out a text asset, returning the text rectangle and per-line
    /// metrics.
    fn layout_text(&self, text: &TextAsset) -> TextLayout;

    /// Render `source` into a bitmap. `target` carries the existing
    /// content when redrawing an already-defined bitmap in place; `None`
    /// means the bitmap is being created by this draw.
    fn render_node(
        &self,
        graph: &SceneGraph,
        source: NodeIndex,
        target: Option<&BitmapAsset>,
        params: &DrawNodeParams,
    ) -> BitmapContent;

    /// Decode encoded image bytes asynchronously. `complete` may fire on
    /// any thread, after the current batch has finished.
    fn decode_image(&self, data: Bytes, complete: DecodeCallback);

    /// Deliver an asynchronously produced response batch to the producer.
    fn send_updates(&self, buffer: Bytes, assets: Vec<Bytes>);

    /// Introspection hook invoked on each asset registration. Must not
    /// affect protocol semantics.
    fn register_inspector_asset(&self, id: i32, symbol_id: i32, asset: &Asset) {
        let _ = (id, symbol_id, asset);
    }
}
