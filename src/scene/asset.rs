//! Renderable assets addressed by the asset table
//!
//! Assets are standalone resources referenced by id, distinct from tree
//! nodes. They are mutated in place on redefinition so existing references
//! from shape leaves keep pointing at live content.

use bytes::Bytes;

use crate::protocol::{AutoSizeMode, Color, ImageFormat, Matrix, Rectangle};

/// Vector shape definition: path data plus the bitmap fills it references.
#[derive(Debug, Clone)]
pub struct ShapeAsset {
    /// Producer-side symbol id, for introspection only
    pub symbol_id: i32,
    /// Shape bounds
    pub bounds: Rectangle,
    /// Opaque path data consumed by the rasterizer
    pub path_data: Bytes,
    /// Bitmap asset ids used as fills
    pub fills: Vec<i32>,
}

/// Bitmap pixels in one of the transported image formats.
#[derive(Debug, Clone)]
pub struct BitmapAsset {
    /// Producer-side symbol id; `-1` for bitmaps created by `DrawToBitmap`
    pub symbol_id: i32,
    /// Bitmap bounds
    pub bounds: Rectangle,
    /// Pixel format of `pixels`
    pub format: ImageFormat,
    /// Raw pixel or encoded image bytes
    pub pixels: Bytes,
}

/// Metrics for one laid-out text line, in host pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineMetrics {
    /// Line left edge
    pub x: i32,
    /// Line advance width
    pub width: i32,
    /// Ascent above the baseline
    pub ascent: i32,
    /// Descent below the baseline
    pub descent: i32,
    /// Leading to the next line
    pub leading: i32,
}

/// Host-computed text layout written back to the producer.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLayout {
    /// Tight rectangle around the laid-out text
    pub rect: Rectangle,
    /// Per-line metrics in layout order
    pub lines: Vec<LineMetrics>,
}

/// Editable text block with host-computed layout.
#[derive(Debug, Clone)]
pub struct TextAsset {
    /// Producer-side symbol id, for introspection only
    pub symbol_id: i32,
    /// Field bounds
    pub bounds: Rectangle,
    /// Content transform
    pub matrix: Matrix,
    /// Background fill color
    pub background_color: Color,
    /// Border color
    pub border_color: Color,
    /// Auto-size mode
    pub auto_size: AutoSizeMode,
    /// Word wrapping enabled
    pub word_wrap: bool,
    /// Vertical scroll offset in lines
    pub scroll_v: i32,
    /// Horizontal scroll offset in pixels
    pub scroll_h: i32,
    /// Plain text content
    pub content: String,
    /// Opaque run-formatting records
    pub run_data: Bytes,
    /// Optional per-glyph coordinate table (four bytes per entry)
    pub coords: Option<Bytes>,
    /// Layout computed by the host after the last content update
    pub layout: Option<TextLayout>,
}

/// Video stream registration; playback is handled by the host.
#[derive(Debug, Clone)]
pub struct VideoAsset {
    /// Source locator handed to the host's playback engine
    pub url: String,
    /// Display bounds
    pub bounds: Rectangle,
}

/// A standalone renderable resource addressed by asset id.
#[derive(Debug, Clone)]
pub enum Asset {
    /// Vector shape
    Shape(ShapeAsset),
    /// Bitmap pixels
    Bitmap(BitmapAsset),
    /// Text block
    Text(TextAsset),
    /// Video stream
    Video(VideoAsset),
}

impl Asset {
    /// Kind name used in error reporting
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Shape(_) => "shape",
            Self::Bitmap(_) => "bitmap",
            Self::Text(_) => "text",
            Self::Video(_) => "video",
        }
    }

    /// Producer-side symbol id (videos carry none and report 0)
    #[must_use]
    pub const fn symbol_id(&self) -> i32 {
        match self {
            Self::Shape(shape) => shape.symbol_id,
            Self::Bitmap(bitmap) => bitmap.symbol_id,
            Self::Text(text) => text.symbol_id,
            Self::Video(_) => 0,
        }
    }

    /// Borrow as a shape asset
    #[must_use]
    pub const fn as_shape(&self) -> Option<&ShapeAsset> {
        match self {
            Self::Shape(shape) => Some(shape),
            _ => None,
        }
    }

    /// Borrow as a bitmap asset
    #[must_use]
    pub const fn as_bitmap(&self) -> Option<&BitmapAsset> {
        match self {
            Self::Bitmap(bitmap) => Some(bitmap),
            _ => None,
        }
    }

    /// Borrow as a text asset
    #[must_use]
    pub const fn as_text(&self) -> Option<&TextAsset> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Borrow as a video asset
    #[must_use]
    pub const fn as_video(&self) -> Option<&VideoAsset> {
        match self {
            Self::Video(video) => Some(video),
            _ => None,
        }
    }
}
