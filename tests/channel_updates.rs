use std::sync::{Arc, Mutex};

use bytes::Bytes;

use sgp::channel::{
    BitmapContent, ChannelConfig, ChannelContext, ChannelDeserializer, DecodeCallback,
    DrawNodeParams, RenderHost,
};
use sgp::protocol::{
    BlendMode, ChannelWriter, Error, Filter, IdSpace, ImageFormat, Matrix, MessageTag, NodeRef,
    PixelSnapping, Rectangle, Smoothing, UpdateFlags,
};
use sgp::scene::{BitmapAsset, LineMetrics, NodeIndex, SceneGraph, TextAsset, TextLayout};

/// Host stub: deterministic layout, render generations, synchronous decode.
#[derive(Default)]
struct StubHost {
    fonts: Mutex<Vec<(i32, bool, bool, usize)>>,
    renders: Mutex<u8>,
}

impl RenderHost for StubHost {
    fn register_font(&self, id: i32, bold: bool, italic: bool, data: Bytes) {
        self.fonts.lock().unwrap().push((id, bold, italic, data.len()));
    }

    fn layout_text(&self, text: &TextAsset) -> TextLayout {
        TextLayout {
            rect: Rectangle::new(text.bounds.x, text.bounds.y, 100.0, 20.0),
            lines: vec![LineMetrics {
                x: 0,
                width: 100,
                ascent: 12,
                descent: 4,
                leading: 2,
            }],
        }
    }

    fn render_node(
        &self,
        _graph: &SceneGraph,
        _source: NodeIndex,
        target: Option<&BitmapAsset>,
        _params: &DrawNodeParams,
    ) -> BitmapContent {
        let mut renders = self.renders.lock().unwrap();
        *renders += 1;
        BitmapContent {
            bounds: target.map_or(Rectangle::new(0.0, 0.0, 16.0, 16.0), |t| t.bounds),
            format: ImageFormat::StraightAlphaRgba,
            pixels: Bytes::from(vec![*renders; 4]),
        }
    }

    fn decode_image(&self, _data: Bytes, complete: DecodeCallback) {
        complete(None);
    }

    fn send_updates(&self, _buffer: Bytes, _assets: Vec<Bytes>) {}
}

fn session() -> (Arc<StubHost>, ChannelContext) {
    let host = Arc::new(StubHost::default());
    let context = ChannelContext::new(host.clone(), ChannelConfig::default());
    (host, context)
}

fn run(context: &mut ChannelContext, writer: ChannelWriter) -> sgp::Result<()> {
    ChannelDeserializer::new(context, writer.into_reader()).run()
}

fn write_update_graphics(writer: &mut ChannelWriter, id: i32, fills: &[i32]) {
    writer.write_tag(MessageTag::UpdateGraphics);
    writer.write_i32(id);
    writer.write_i32(100 + id); // symbol id
    writer.write_rectangle(&Rectangle::new(0.0, 0.0, 10.0, 10.0));
    writer.write_asset(Bytes::from_static(b"path data"));
    writer.write_i32(fills.len() as i32);
    for &fill in fills {
        writer.write_i32(fill);
    }
}

fn write_update_bitmap(writer: &mut ChannelWriter, id: i32, pixels: &[u8]) {
    writer.write_tag(MessageTag::UpdateBitmapData);
    writer.write_i32(id);
    writer.write_i32(200 + id); // symbol id
    writer.write_rectangle(&Rectangle::new(0.0, 0.0, 8.0, 8.0));
    writer.write_i32(ImageFormat::StraightAlphaRgba.as_i32());
    writer.write_asset(Bytes::copy_from_slice(pixels));
}

fn write_frame_children(writer: &mut ChannelWriter, id: i32, children: &[NodeRef]) {
    writer.write_tag(MessageTag::UpdateFrame);
    writer.write_i32(id);
    writer.write_i32(UpdateFlags::new().with(UpdateFlags::HAS_CHILDREN).as_u32() as i32);
    writer.write_i32(children.len() as i32);
    for child in children {
        writer.write_i32(child.to_raw());
    }
}

#[test]
fn graphics_then_frame_children_builds_shape_leaf() {
    let (_, mut context) = session();
    let mut writer = ChannelWriter::new();
    write_update_graphics(&mut writer, 1, &[]);
    write_frame_children(&mut writer, 2, &[NodeRef::Asset(1)]);
    writer.write_tag(MessageTag::Eof);

    run(&mut context, writer).unwrap();

    let container = context.registry().find_node(2).unwrap();
    let node = context.graph().node(container);
    assert!(node.is_container());
    assert_eq!(node.children().len(), 1);

    let child = node.children()[0];
    assert_eq!(context.graph().node(child).shape_asset(), Some(1));
    assert_eq!(
        context.registry().shape_referrers(1).collect::<Vec<_>>(),
        vec![child]
    );
}

#[test]
fn partial_frame_update_touches_only_the_flagged_field() {
    let (_, mut context) = session();

    // first pass: matrix, misc block, and children all set
    let mut writer = ChannelWriter::new();
    write_update_graphics(&mut writer, 1, &[]);
    writer.write_tag(MessageTag::UpdateFrame);
    writer.write_i32(2);
    let flags = UpdateFlags::new()
        .with(UpdateFlags::HAS_MATRIX)
        .with(UpdateFlags::HAS_MISC)
        .with(UpdateFlags::HAS_CHILDREN);
    writer.write_i32(flags.as_u32() as i32);
    writer.write_matrix(&Matrix {
        a: 2.0,
        b: 0.0,
        c: 0.0,
        d: 2.0,
        tx: 5.0,
        ty: 5.0,
    });
    writer.write_i32(0); // ratio
    writer.write_i32(BlendMode::Multiply.as_i32());
    writer.write_filters(&[Filter::Blur(sgp::protocol::BlurFilter {
        blur_x: 2.0,
        blur_y: 2.0,
        quality: 1,
    })]);
    writer.write_bool(false); // visible
    writer.write_i32(PixelSnapping::Always.as_i32());
    writer.write_i32(Smoothing::Always.as_i32());
    writer.write_i32(1); // child count
    writer.write_i32(NodeRef::Asset(1).to_raw());
    writer.write_tag(MessageTag::Eof);
    run(&mut context, writer).unwrap();

    // second pass: only the matrix
    let mut writer = ChannelWriter::new();
    writer.write_tag(MessageTag::UpdateFrame);
    writer.write_i32(2);
    writer.write_i32(UpdateFlags::new().with(UpdateFlags::HAS_MATRIX).as_u32() as i32);
    let new_matrix = Matrix {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        tx: -3.0,
        ty: 0.5,
    };
    writer.write_matrix(&new_matrix);
    writer.write_tag(MessageTag::Eof);
    run(&mut context, writer).unwrap();

    let node = context
        .graph()
        .node(context.registry().find_node(2).unwrap());
    assert_eq!(node.matrix, new_matrix);
    // everything else keeps its prior value
    assert_eq!(node.blend_mode, BlendMode::Multiply);
    assert_eq!(node.filters.len(), 1);
    assert!(!node.visible);
    assert_eq!(node.pixel_snapping, PixelSnapping::Always);
    assert_eq!(node.smoothing, Smoothing::Always);
    assert_eq!(node.children().len(), 1);
}

#[test]
fn children_replace_clears_even_when_new_list_is_empty() {
    let (_, mut context) = session();
    let mut writer = ChannelWriter::new();
    write_update_graphics(&mut writer, 1, &[]);
    write_frame_children(&mut writer, 2, &[NodeRef::Asset(1), NodeRef::Asset(1)]);
    writer.write_tag(MessageTag::Eof);
    run(&mut context, writer).unwrap();

    let container = context.registry().find_node(2).unwrap();
    assert_eq!(context.graph().node(container).children().len(), 2);
    assert_eq!(context.registry().shape_referrers(1).count(), 2);

    let mut writer = ChannelWriter::new();
    write_frame_children(&mut writer, 2, &[]);
    writer.write_tag(MessageTag::Eof);
    run(&mut context, writer).unwrap();

    assert!(context.graph().node(container).children().is_empty());
    // detached leaves leave the referrer index
    assert_eq!(context.registry().shape_referrers(1).count(), 0);
}

#[test]
fn asset_redefinition_preserves_referrers() {
    let (_, mut context) = session();
    let mut writer = ChannelWriter::new();
    write_update_bitmap(&mut writer, 1, &[9; 4]);
    write_update_graphics(&mut writer, 2, &[1]);
    write_frame_children(&mut writer, 3, &[NodeRef::Asset(2)]);
    writer.write_tag(MessageTag::Eof);
    run(&mut context, writer).unwrap();

    let leaf = context.registry().shape_referrers(2).next().unwrap();

    // redefine both assets in place
    let mut writer = ChannelWriter::new();
    write_update_bitmap(&mut writer, 1, &[5; 4]);
    write_update_graphics(&mut writer, 2, &[1]);
    writer.write_tag(MessageTag::Eof);
    run(&mut context, writer).unwrap();

    assert_eq!(
        context.registry().bitmap(1).unwrap().pixels.as_ref(),
        &[5; 4]
    );
    // the shape leaf still wraps asset 2, and asset 2 still fills from 1
    assert_eq!(context.graph().node(leaf).shape_asset(), Some(2));
    assert_eq!(
        context.registry().shape_referrers(2).collect::<Vec<_>>(),
        vec![leaf]
    );
    assert_eq!(
        context.registry().fill_referrers(1).collect::<Vec<_>>(),
        vec![2]
    );
}

#[test]
fn unresolved_child_reference_is_fatal() {
    let (_, mut context) = session();
    let mut writer = ChannelWriter::new();
    write_frame_children(&mut writer, 2, &[NodeRef::Asset(9)]);
    writer.write_tag(MessageTag::Eof);

    let result = run(&mut context, writer);
    assert!(matches!(
        result,
        Err(Error::UnresolvedReference {
            space: IdSpace::Asset,
            id: 9
        })
    ));
    assert_eq!(context.stats().errors, 1);
}

#[test]
fn unknown_tag_aborts_but_keeps_earlier_updates() {
    let (_, mut context) = session();
    let mut writer = ChannelWriter::new();
    writer.write_tag(MessageTag::UpdateStage);
    writer.write_i32(1);
    writer.write_i32(0x0011_2233);
    writer.write_rectangle(&Rectangle::new(0.0, 0.0, 550.0, 400.0));
    writer.write_i32(999); // not a message tag
    writer.write_tag(MessageTag::Eof);

    let result = run(&mut context, writer);
    assert!(matches!(result, Err(Error::UnknownTag { tag: 999 })));
    // the stage update that preceded the bad tag stands
    assert_eq!(
        context.graph().stage().bounds,
        Rectangle::new(0.0, 0.0, 550.0, 400.0)
    );
}

#[test]
fn producer_direction_tag_is_rejected() {
    let (_, mut context) = session();
    let mut writer = ChannelWriter::new();
    writer.write_tag(MessageTag::MouseEvent);

    let result = run(&mut context, writer);
    assert!(matches!(
        result,
        Err(Error::UnexpectedTag {
            tag: MessageTag::MouseEvent
        })
    ));
}

#[test]
fn truncated_batch_is_fatal() {
    let (_, mut context) = session();
    let mut writer = ChannelWriter::new();
    writer.write_tag(MessageTag::UpdateFrame);
    // id and flags missing

    let result = run(&mut context, writer);
    assert!(matches!(result, Err(Error::Truncated { .. })));
}

#[test]
fn update_stage_binds_root_and_mutates_it() {
    let (_, mut context) = session();
    let root = context.graph().root();
    let mut writer = ChannelWriter::new();
    writer.write_tag(MessageTag::UpdateStage);
    writer.write_i32(1);
    writer.write_i32(0x0011_2233u32 as i32);
    writer.write_rectangle(&Rectangle::new(0.0, 0.0, 550.0, 400.0));
    writer.write_tag(MessageTag::Eof);
    run(&mut context, writer).unwrap();

    assert_eq!(context.registry().find_node(1), Some(root));
    assert_eq!(
        context.graph().stage().bounds,
        Rectangle::new(0.0, 0.0, 550.0, 400.0)
    );
    assert_eq!(context.graph().stage().color.as_argb(), 0x0011_2233);
}

#[test]
fn net_stream_registration_is_idempotent() {
    let (_, mut context) = session();
    let mut writer = ChannelWriter::new();
    for url in ["rtmp://first", "rtmp://second"] {
        writer.write_tag(MessageTag::UpdateNetStream);
        writer.write_i32(4);
        writer.write_string(url);
    }
    writer.write_tag(MessageTag::Eof);
    run(&mut context, writer).unwrap();

    let video = context.registry().asset(4).unwrap().as_video().unwrap();
    assert_eq!(video.url, "rtmp://first");
    assert_eq!(video.bounds, Rectangle::new(0.0, 0.0, 960.0, 480.0));
}

#[test]
fn mask_and_clip_depth_apply_through_the_bitmask() {
    let (_, mut context) = session();
    let mut writer = ChannelWriter::new();
    write_frame_children(&mut writer, 2, &[]); // creates container 2
    writer.write_tag(MessageTag::UpdateFrame);
    writer.write_i32(3);
    let flags = UpdateFlags::new()
        .with(UpdateFlags::HAS_MASK)
        .with(UpdateFlags::HAS_CLIP_DEPTH);
    writer.write_i32(flags.as_u32() as i32);
    writer.write_i32(NodeRef::Node(2).to_raw());
    writer.write_i32(5);
    writer.write_tag(MessageTag::Eof);
    run(&mut context, writer).unwrap();

    let mask_target = context.registry().find_node(2).unwrap();
    let node = context
        .graph()
        .node(context.registry().find_node(3).unwrap());
    assert_eq!(node.mask, Some(mask_target));
    assert_eq!(node.clip_depth, Some(5));
}

#[test]
fn ratio_stamps_shape_first_child_only() {
    let (_, mut context) = session();
    let mut writer = ChannelWriter::new();
    write_update_graphics(&mut writer, 1, &[]);
    writer.write_tag(MessageTag::UpdateFrame);
    writer.write_i32(2);
    let flags = UpdateFlags::new()
        .with(UpdateFlags::HAS_MISC)
        .with(UpdateFlags::HAS_CHILDREN);
    writer.write_i32(flags.as_u32() as i32);
    writer.write_i32(32767); // ratio
    writer.write_i32(BlendMode::Normal.as_i32());
    writer.write_i32(0); // no filters
    writer.write_bool(true);
    writer.write_i32(PixelSnapping::Auto.as_i32());
    writer.write_i32(Smoothing::Never.as_i32());
    writer.write_i32(1);
    writer.write_i32(NodeRef::Asset(1).to_raw());
    writer.write_tag(MessageTag::Eof);
    run(&mut context, writer).unwrap();

    let container = context.registry().find_node(2).unwrap();
    let first = context.graph().node(container).children()[0];
    assert_eq!(
        context.graph().node(first).ratio(),
        Some(32767.0 / 65535.0)
    );
}

#[test]
fn ratio_is_a_noop_when_first_child_is_a_container() {
    let (_, mut context) = session();
    let mut writer = ChannelWriter::new();
    write_frame_children(&mut writer, 4, &[]); // container to use as child
    writer.write_tag(MessageTag::UpdateFrame);
    writer.write_i32(2);
    let flags = UpdateFlags::new()
        .with(UpdateFlags::HAS_MISC)
        .with(UpdateFlags::HAS_CHILDREN);
    writer.write_i32(flags.as_u32() as i32);
    writer.write_i32(32767);
    writer.write_i32(BlendMode::Normal.as_i32());
    writer.write_i32(0);
    writer.write_bool(true);
    writer.write_i32(PixelSnapping::Auto.as_i32());
    writer.write_i32(Smoothing::Never.as_i32());
    writer.write_i32(1);
    writer.write_i32(NodeRef::Node(4).to_raw());
    writer.write_tag(MessageTag::Eof);
    run(&mut context, writer).unwrap();

    let child = context.registry().find_node(4).unwrap();
    assert_eq!(context.graph().node(child).ratio(), None);
}

#[test]
fn text_layout_metrics_flow_to_the_output_channel() {
    let (_, mut context) = session();
    let mut writer = ChannelWriter::new();
    writer.write_tag(MessageTag::UpdateTextContent);
    writer.write_i32(6);
    writer.write_i32(306); // symbol id
    writer.write_rectangle(&Rectangle::new(1.0, 2.0, 30.0, 40.0));
    writer.write_matrix(&Matrix::IDENTITY);
    writer.write_i32(0x00FF_FFFFu32 as i32); // background
    writer.write_i32(0); // border
    writer.write_i32(0); // auto size
    writer.write_bool(true); // word wrap
    writer.write_i32(0); // scrollV
    writer.write_i32(0); // scrollH
    writer.write_asset(Bytes::from_static(b"hello"));
    writer.write_asset(Bytes::from_static(b"runs"));
    writer.write_i32(0); // no coords
    writer.write_tag(MessageTag::Eof);

    let mut output = ChannelWriter::new();
    ChannelDeserializer::new(&mut context, writer.into_reader())
        .with_output(&mut output)
        .run()
        .unwrap();

    let text = context.registry().asset(6).unwrap().as_text().unwrap();
    assert_eq!(text.content, "hello");
    assert!(text.layout.is_some());

    let mut reader = output.into_reader();
    // StubHost lays out a 100x20 rectangle at the field origin
    assert_eq!(
        reader.read_rectangle().unwrap(),
        Rectangle::new(1.0, 2.0, 100.0, 20.0)
    );
    assert_eq!(reader.read_i32().unwrap(), 1); // line count
    assert_eq!(reader.read_i32().unwrap(), 0); // x
    assert_eq!(reader.read_i32().unwrap(), 100); // width
    assert_eq!(reader.read_i32().unwrap(), 12); // ascent
    assert_eq!(reader.read_i32().unwrap(), 4); // descent
    assert_eq!(reader.read_i32().unwrap(), 2); // leading
    assert!(!reader.has_remaining());
}

#[test]
fn register_font_reaches_the_host() {
    let (host, mut context) = session();
    let mut writer = ChannelWriter::new();
    writer.write_tag(MessageTag::RegisterFont);
    writer.write_i32(7);
    writer.write_bool(true); // bold
    writer.write_bool(false); // italic
    writer.write_asset(Bytes::from_static(b"OTTO...."));
    writer.write_tag(MessageTag::Eof);
    run(&mut context, writer).unwrap();

    assert_eq!(*host.fonts.lock().unwrap(), vec![(7, true, false, 8)]);
}

#[test]
fn draw_to_bitmap_creates_then_redraws_in_place() {
    let (_, mut context) = session();
    let mut writer = ChannelWriter::new();
    write_update_graphics(&mut writer, 1, &[]);
    for _ in 0..2 {
        writer.write_tag(MessageTag::DrawToBitmap);
        writer.write_i32(50); // target
        writer.write_i32(NodeRef::Asset(1).to_raw()); // source
        writer.write_i32(0); // no optional fields
        writer.write_i32(BlendMode::Normal.as_i32());
        writer.write_bool(false); // smoothing
    }
    writer.write_tag(MessageTag::Eof);
    run(&mut context, writer).unwrap();

    let bitmap = context.registry().bitmap(50).unwrap();
    assert_eq!(bitmap.symbol_id, -1);
    assert_eq!(bitmap.bounds, Rectangle::new(0.0, 0.0, 16.0, 16.0));
    // second render generation landed in the same asset
    assert_eq!(bitmap.pixels.as_ref(), &[2; 4]);
}

#[test]
fn request_bitmap_data_reads_back_pixels() {
    let (_, mut context) = session();
    let mut writer = ChannelWriter::new();
    write_update_bitmap(&mut writer, 1, &[9, 8, 7, 6]);
    writer.write_tag(MessageTag::RequestBitmapData);
    writer.write_i32(1);
    writer.write_tag(MessageTag::Eof);

    let mut output = ChannelWriter::new();
    ChannelDeserializer::new(&mut context, writer.into_reader())
        .with_output(&mut output)
        .run()
        .unwrap();

    let mut reader = output.into_reader();
    assert_eq!(
        reader.read_i32().unwrap(),
        ImageFormat::StraightAlphaRgba.as_i32()
    );
    assert_eq!(reader.read_i32().unwrap(), 4);
    assert_eq!(reader.read_bytes(4).unwrap().as_ref(), &[9, 8, 7, 6]);
}

#[test]
fn request_bitmap_data_for_undefined_id_fails() {
    let (_, mut context) = session();
    let mut writer = ChannelWriter::new();
    writer.write_tag(MessageTag::RequestBitmapData);
    writer.write_i32(42);

    let result = run(&mut context, writer);
    assert!(matches!(
        result,
        Err(Error::UnresolvedReference {
            space: IdSpace::Asset,
            id: 42
        })
    ));
}

#[test]
fn stats_count_applied_messages() {
    let (_, mut context) = session();
    let mut writer = ChannelWriter::new();
    write_update_graphics(&mut writer, 1, &[]);
    write_frame_children(&mut writer, 2, &[NodeRef::Asset(1)]);
    write_frame_children(&mut writer, 3, &[]);
    writer.write_tag(MessageTag::Eof);
    run(&mut context, writer).unwrap();

    assert_eq!(context.stats().update_graphics, 1);
    assert_eq!(context.stats().update_frame, 2);
    assert_eq!(context.stats().total(), 3);
    assert_eq!(context.stats().errors, 0);
}
