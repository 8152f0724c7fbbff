//! SGP protocol core
//!
//! Wire format constants, message tags, the primitive codec, and the
//! geometry/effect decoders.

mod codec;
mod error;
mod geometry;
mod types;

pub use codec::{ChannelReader, ChannelWriter};
pub use error::{Error, IdSpace, Result};
pub use geometry::{
    BlurFilter, Color, ColorTransform, DropShadowFilter, Filter, Matrix, Rectangle,
};
pub use types::{
    AutoSizeMode, BlendMode, ColorTransformTag, EventModifiers, FilterTag, FocusEventKind,
    ImageFormat, KeyboardEventKind, MessageTag, MouseEventKind, NodeRef, PixelSnapping, Smoothing,
    UpdateFlags,
};

/// Fixed-point scale applied to rectangle fields and matrix translation
pub const FIXED_POINT_SCALE: f32 = 20.0;

/// High bit marking a composite id as an asset-table reference
pub const ASSET_ID_FLAG: i32 = 0x0800_0000;

/// Sentinel id carried on the wire for "no reference"
pub const ID_NONE: i32 = -1;

/// Denominator for interpolation ratios transmitted as integers
pub const RATIO_SCALE: f32 = 65535.0;
