//! Message dispatch
//!
//! Decodes one batch of tagged messages and applies each to the session's
//! retained tree. Processing is synchronous and uninterrupted; the only
//! message that outlives the batch is `DecodeImage`, whose completion
//! callback builds an independent response batch (see
//! [`ChannelSerializer`]).

use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, instrument, warn};

use crate::protocol::{
    BlendMode, ChannelReader, ChannelWriter, Error, IdSpace, ImageFormat, Matrix, MessageTag,
    NodeRef, PixelSnapping, Smoothing, UpdateFlags, RATIO_SCALE,
};
use crate::scene::{Asset, BitmapAsset, Node, ShapeAsset, TextAsset, VideoAsset};

use super::context::ChannelContext;
use super::host::DrawNodeParams;
use super::serializer::ChannelSerializer;

/// Applies one batch of messages to a [`ChannelContext`].
///
/// Attach an output writer with [`ChannelDeserializer::with_output`] to
/// receive the synchronous responses (`UpdateTextContent` layout metrics,
/// `RequestBitmapData` pixel readback) produced while the batch runs.
pub struct ChannelDeserializer<'a> {
    context: &'a mut ChannelContext,
    reader: ChannelReader,
    output: Option<&'a mut ChannelWriter>,
}

impl<'a> ChannelDeserializer<'a> {
    /// Create a deserializer over one delivered batch
    pub fn new(context: &'a mut ChannelContext, reader: ChannelReader) -> Self {
        Self {
            context,
            reader,
            output: None,
        }
    }

    /// Attach the synchronous output channel
    #[must_use]
    pub fn with_output(mut self, output: &'a mut ChannelWriter) -> Self {
        self.output = Some(output);
        self
    }

    /// Process messages until `Eof` or the cursor is exhausted.
    ///
    /// A fatal protocol error aborts the remainder of the batch; updates
    /// already applied by earlier messages are not rolled back.
    #[instrument(level = "debug", skip(self), fields(bytes = self.reader.remaining()))]
    pub fn run(&mut self) -> Result<(), Error> {
        let result = self.dispatch();
        if result.is_err() {
            self.context.stats_mut().record_error();
        }
        result
    }

    fn dispatch(&mut self) -> Result<(), Error> {
        while self.reader.has_remaining() {
            let raw = self.reader.read_i32()?;
            let tag = MessageTag::from_i32(raw).ok_or(Error::UnknownTag { tag: raw })?;
            self.context.stats_mut().record(tag);
            match tag {
                MessageTag::Eof => return Ok(()),
                MessageTag::UpdateGraphics => self.update_graphics()?,
                MessageTag::UpdateBitmapData => self.update_bitmap_data()?,
                MessageTag::UpdateTextContent => self.update_text_content()?,
                MessageTag::UpdateFrame => self.update_frame()?,
                MessageTag::UpdateStage => self.update_stage()?,
                MessageTag::UpdateNetStream => self.update_net_stream()?,
                MessageTag::RegisterFont => self.register_font()?,
                MessageTag::DrawToBitmap => self.draw_to_bitmap()?,
                MessageTag::RequestBitmapData => self.request_bitmap_data()?,
                MessageTag::DecodeImage => self.decode_image()?,
                MessageTag::MouseEvent
                | MessageTag::KeyboardEvent
                | MessageTag::FocusEvent
                | MessageTag::DecodeImageResponse => {
                    return Err(Error::UnexpectedTag { tag });
                }
            }
        }
        Ok(())
    }

    /// Define or update a vector-shape asset.
    fn update_graphics(&mut self) -> Result<(), Error> {
        let id = self.reader.read_i32()?;
        let symbol_id = self.reader.read_i32()?;
        let bounds = self.reader.read_rectangle()?;
        let path_data = self.reader.read_asset()?;
        let fill_count = self.reader.read_i32()?;
        let mut fills = Vec::with_capacity(fill_count.max(0) as usize);
        for _ in 0..fill_count {
            let bitmap_id = self.reader.read_i32()?;
            // fills must name bitmap assets defined earlier in the stream
            self.context.registry().bitmap(bitmap_id)?;
            fills.push(bitmap_id);
        }
        debug!(id, symbol_id, fills = fills.len(), "update graphics");

        if self.context.registry().contains_asset(id) {
            let registry = self.context.registry_mut();
            let shape = registry.shape_mut(id)?;
            let old_fills = std::mem::replace(&mut shape.fills, fills.clone());
            shape.bounds = bounds;
            shape.path_data = path_data;
            registry.repoint_fills(id, &old_fills, &fills);
        } else {
            self.context.register_asset(
                id,
                Asset::Shape(ShapeAsset {
                    symbol_id,
                    bounds,
                    path_data,
                    fills,
                }),
            );
        }
        Ok(())
    }

    /// Define or update a bitmap asset.
    fn update_bitmap_data(&mut self) -> Result<(), Error> {
        let id = self.reader.read_i32()?;
        let symbol_id = self.reader.read_i32()?;
        let bounds = self.reader.read_rectangle()?;
        let format_raw = self.reader.read_i32()?;
        let format = ImageFormat::from_i32(format_raw).ok_or(Error::InvalidValue {
            what: "image format",
            value: format_raw,
        })?;
        let pixels = self.reader.read_asset()?;
        debug!(id, symbol_id, ?format, bytes = pixels.len(), "update bitmap data");

        if self.context.registry().contains_asset(id) {
            // bounds keep their original value on redefinition
            let bitmap = self.context.registry_mut().bitmap_mut(id)?;
            bitmap.format = format;
            bitmap.pixels = pixels;
        } else {
            self.context.register_asset(
                id,
                Asset::Bitmap(BitmapAsset {
                    symbol_id,
                    bounds,
                    format,
                    pixels,
                }),
            );
        }
        Ok(())
    }

    /// Define or update a text asset, then write host-computed layout
    /// metrics to the output channel.
    fn update_text_content(&mut self) -> Result<(), Error> {
        let id = self.reader.read_i32()?;
        let symbol_id = self.reader.read_i32()?;
        let bounds = self.reader.read_rectangle()?;
        let matrix = self.reader.read_matrix()?;
        let background_color = self.reader.read_color()?;
        let border_color = self.reader.read_color()?;
        let auto_size_raw = self.reader.read_i32()?;
        let auto_size = crate::protocol::AutoSizeMode::from_i32(auto_size_raw).unwrap_or_default();
        let word_wrap = self.reader.read_bool()?;
        let scroll_v = self.reader.read_i32()?;
        let scroll_h = self.reader.read_i32()?;
        let content = String::from_utf8(self.reader.read_asset()?.to_vec())?;
        let run_data = self.reader.read_asset()?;
        let coord_count = self.reader.read_i32()?;
        let coords = if coord_count > 0 {
            Some(self.reader.read_bytes(coord_count as usize * 4)?)
        } else {
            None
        };
        debug!(id, symbol_id, chars = content.len(), "update text content");

        if self.context.registry().contains_asset(id) {
            let text = self.context.registry_mut().text_mut(id)?;
            text.bounds = bounds;
            text.matrix = matrix;
            text.background_color = background_color;
            text.border_color = border_color;
            text.auto_size = auto_size;
            text.word_wrap = word_wrap;
            text.scroll_v = scroll_v;
            text.scroll_h = scroll_h;
            text.content = content;
            text.run_data = run_data;
            text.coords = coords;
        } else {
            self.context.register_asset(
                id,
                Asset::Text(TextAsset {
                    symbol_id,
                    bounds,
                    matrix,
                    background_color,
                    border_color,
                    auto_size,
                    word_wrap,
                    scroll_v,
                    scroll_h,
                    content,
                    run_data,
                    coords,
                    layout: None,
                }),
            );
        }

        let layout = self
            .context
            .host()
            .layout_text(self.context.registry().text(id)?);
        self.context.registry_mut().text_mut(id)?.layout = Some(layout.clone());

        if let Some(output) = self.output.as_deref_mut() {
            output.write_rectangle(&layout.rect);
            output.write_i32(layout.lines.len() as i32);
            for line in &layout.lines {
                output.write_i32(line.x);
                output.write_i32(line.width);
                output.write_i32(line.ascent);
                output.write_i32(line.descent);
                output.write_i32(line.leading);
            }
        }
        Ok(())
    }

    /// Bind the root container's wire id and update stage state.
    fn update_stage(&mut self) -> Result<(), Error> {
        let id = self.reader.read_i32()?;
        if self.context.registry().find_node(id).is_none() {
            let root = self.context.graph().root();
            self.context.registry_mut().bind_node(id, root);
        }
        let color = self.reader.read_color()?;
        let bounds = self.reader.read_rectangle()?;
        debug!(id, ?bounds, "update stage");

        let stage = self.context.graph_mut().stage_mut();
        stage.bounds = bounds;
        stage.color = color;
        Ok(())
    }

    /// Register a video asset; a no-op when the id is already defined.
    fn update_net_stream(&mut self) -> Result<(), Error> {
        let id = self.reader.read_i32()?;
        let url = self.reader.read_string()?;
        if self.context.registry().contains_asset(id) {
            debug!(id, "net stream already registered");
            return Ok(());
        }
        debug!(id, url, "update net stream");
        let bounds = self.context.config().video_bounds;
        self.context
            .register_asset(id, Asset::Video(VideoAsset { url, bounds }));
        Ok(())
    }

    /// Create or mutate a container node, applying only the fields named
    /// by the bitmask.
    fn update_frame(&mut self) -> Result<(), Error> {
        let id = self.reader.read_i32()?;
        let index = match self.context.registry().find_node(id) {
            Some(index) => index,
            None => {
                let (graph, registry) = self.context.parts_mut();
                let index = graph.insert(Node::container());
                registry.bind_node(id, index);
                index
            }
        };
        let flags = UpdateFlags::from_raw(self.reader.read_i32()? as u32);
        debug!(id, flags = flags.as_u32(), "update frame");

        let mut ratio = None;
        if flags.has_matrix() {
            let matrix = self.reader.read_matrix()?;
            self.context.graph_mut().node_mut(index).matrix = matrix;
        }
        if flags.has_color_transform() {
            let transform = self.reader.read_color_transform()?;
            self.context.graph_mut().node_mut(index).color_transform = transform;
        }
        if flags.has_mask() {
            let mask = self.context.resolve(NodeRef::from_raw(self.reader.read_i32()?))?;
            self.context.graph_mut().node_mut(index).mask = mask;
        }
        if flags.has_clip_depth() {
            let depth = self.reader.read_i32()?;
            self.context.graph_mut().node_mut(index).clip_depth = Some(depth);
        }
        if flags.has_misc() {
            ratio = Some(self.reader.read_i32()? as f32 / RATIO_SCALE);
            let blend_mode =
                BlendMode::from_i32(self.reader.read_i32()?).unwrap_or_default();
            let filters = self.reader.read_filters()?;
            let visible = self.reader.read_bool()?;
            let pixel_snapping =
                PixelSnapping::from_i32(self.reader.read_i32()?).unwrap_or_default();
            let smoothing = Smoothing::from_i32(self.reader.read_i32()?).unwrap_or_default();

            let node = self.context.graph_mut().node_mut(index);
            node.blend_mode = blend_mode;
            node.filters = filters;
            node.visible = visible;
            node.pixel_snapping = pixel_snapping;
            node.smoothing = smoothing;
        }
        if flags.has_children() {
            let count = self.reader.read_i32()?;
            // replace semantics: clear first, even when the new list is empty
            let detached = self.context.graph_mut().replace_children(index, Vec::new());
            {
                let (graph, registry) = self.context.parts_mut();
                for &child in &detached {
                    if let Some(asset_id) = graph.node(child).shape_asset() {
                        registry.remove_shape_referrer(asset_id, child);
                    }
                }
            }
            for _ in 0..count {
                let raw = self.reader.read_i32()?;
                let child = self.context.resolve(NodeRef::from_raw(raw))?.ok_or(
                    Error::UnresolvedReference {
                        space: IdSpace::Node,
                        id: raw,
                    },
                )?;
                self.context.graph_mut().push_child(index, child);
            }
        }
        if let Some(ratio) = ratio {
            if ratio > 0.0 {
                // drives shape tweening; containers in first position are
                // left untouched
                let first = self.context.graph().node(index).children().first().copied();
                if let Some(first) = first {
                    self.context.graph_mut().node_mut(first).set_ratio(ratio);
                }
            }
        }
        Ok(())
    }

    /// Register an embedded font with the host.
    fn register_font(&mut self) -> Result<(), Error> {
        let id = self.reader.read_i32()?;
        let bold = self.reader.read_bool()?;
        let italic = self.reader.read_bool()?;
        let data = self.reader.read_asset()?;
        debug!(id, bold, italic, bytes = data.len(), "register font");
        self.context.host().register_font(id, bold, italic, data);
        Ok(())
    }

    /// Render a source node into a target bitmap asset.
    fn draw_to_bitmap(&mut self) -> Result<(), Error> {
        let target_id = self.reader.read_i32()?;
        let source_raw = self.reader.read_i32()?;
        let flags = UpdateFlags::from_raw(self.reader.read_i32()? as u32);
        let matrix = if flags.has_matrix() {
            self.reader.read_matrix()?
        } else {
            Matrix::IDENTITY
        };
        let color_transform = if flags.has_color_transform() {
            Some(self.reader.read_color_transform()?)
        } else {
            None
        };
        let clip = if flags.has_clip_rect() {
            Some(self.reader.read_rectangle()?)
        } else {
            None
        };
        let blend_mode = BlendMode::from_i32(self.reader.read_i32()?).unwrap_or_default();
        let smoothing = self.reader.read_bool()?;

        let source = self.context.resolve(NodeRef::from_raw(source_raw))?.ok_or(
            Error::UnresolvedReference {
                space: IdSpace::Node,
                id: source_raw,
            },
        )?;
        let params = DrawNodeParams {
            matrix,
            color_transform,
            clip,
            blend_mode,
            smoothing,
        };
        debug!(target_id, source_raw, "draw to bitmap");

        if self.context.registry().contains_asset(target_id) {
            // redraw into the existing bitmap in place
            let content = self.context.host().render_node(
                self.context.graph(),
                source,
                Some(self.context.registry().bitmap(target_id)?),
                &params,
            );
            let bitmap = self.context.registry_mut().bitmap_mut(target_id)?;
            bitmap.format = content.format;
            bitmap.pixels = content.pixels;
        } else {
            let content =
                self.context
                    .host()
                    .render_node(self.context.graph(), source, None, &params);
            self.context.register_asset(
                target_id,
                Asset::Bitmap(BitmapAsset {
                    symbol_id: -1,
                    bounds: content.bounds,
                    format: content.format,
                    pixels: content.pixels,
                }),
            );
        }
        Ok(())
    }

    /// Read bitmap pixels back through the output channel.
    fn request_bitmap_data(&mut self) -> Result<(), Error> {
        let id = self.reader.read_i32()?;
        let bitmap = self.context.registry().bitmap(id)?;
        match self.output.as_deref_mut() {
            Some(output) => {
                output.write_i32(bitmap.format.as_i32());
                output.write_i32(bitmap.pixels.len() as i32);
                output.write_bytes(&bitmap.pixels);
            }
            None => warn!(id, "bitmap readback requested without an output channel"),
        }
        Ok(())
    }

    /// Hand encoded image bytes to the host's asynchronous decoder; the
    /// completion callback ships an independent response batch.
    fn decode_image(&mut self) -> Result<(), Error> {
        let promise_id = self.reader.read_i32()?;
        let declared_format = self.reader.read_i32()?;
        let data = self.reader.read_asset()?;
        debug!(promise_id, declared_format, bytes = data.len(), "decode image");

        let sink = Arc::clone(self.context.host());
        self.context.host().decode_image(
            data,
            Box::new(move |decoded| {
                let mut serializer = ChannelSerializer::new();
                match decoded {
                    Some(image) => serializer.write_decode_image_response(
                        promise_id,
                        ImageFormat::StraightAlphaRgba,
                        image.pixels,
                        image.width,
                        image.height,
                    ),
                    None => serializer.write_decode_image_response(
                        promise_id,
                        ImageFormat::None,
                        Bytes::new(),
                        0,
                        0,
                    ),
                }
                let (buffer, assets) = serializer.finish();
                sink.send_updates(buffer, assets);
            }),
        );
        Ok(())
    }
}
