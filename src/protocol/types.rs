//! SGP message tags, update bitmasks, and closed wire enums

use std::fmt;

use super::{ASSET_ID_FLAG, ID_NONE};

/// SGP message tags
///
/// One tag per message kind. The `Update*` family plus `RegisterFont`,
/// `DrawToBitmap`, `RequestBitmapData`, and `DecodeImage` flow producer to
/// consumer; the input events and `DecodeImageResponse` flow back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum MessageTag {
    /// End of batch
    Eof = 0,
    /// Define/update a vector-shape asset
    UpdateGraphics = 1,
    /// Define/update a bitmap asset
    UpdateBitmapData = 2,
    /// Define/update a text asset
    UpdateTextContent = 3,
    /// Create/mutate a container node
    UpdateFrame = 4,
    /// Bind the root container and update stage state
    UpdateStage = 5,
    /// Register a video stream asset
    UpdateNetStream = 6,
    /// Register an embedded font with the host
    RegisterFont = 7,
    /// Render a node into a bitmap asset
    DrawToBitmap = 8,
    /// Read bitmap pixels back through the output channel
    RequestBitmapData = 9,
    /// Asynchronously decode encoded image bytes
    DecodeImage = 10,

    /// Forwarded pointer event
    MouseEvent = 11,
    /// Forwarded key event
    KeyboardEvent = 12,
    /// Forwarded focus/visibility event
    FocusEvent = 13,
    /// Completion of an earlier `DecodeImage`
    DecodeImageResponse = 14,
}

impl MessageTag {
    /// Convert from the wire representation
    #[must_use]
    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::Eof),
            1 => Some(Self::UpdateGraphics),
            2 => Some(Self::UpdateBitmapData),
            3 => Some(Self::UpdateTextContent),
            4 => Some(Self::UpdateFrame),
            5 => Some(Self::UpdateStage),
            6 => Some(Self::UpdateNetStream),
            7 => Some(Self::RegisterFont),
            8 => Some(Self::DrawToBitmap),
            9 => Some(Self::RequestBitmapData),
            10 => Some(Self::DecodeImage),
            11 => Some(Self::MouseEvent),
            12 => Some(Self::KeyboardEvent),
            13 => Some(Self::FocusEvent),
            14 => Some(Self::DecodeImageResponse),
            _ => None,
        }
    }

    /// Convert to the wire representation
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self as i32
    }

    /// Check if this tag is applied by the consumer's dispatch loop
    #[must_use]
    pub const fn is_command(self) -> bool {
        !matches!(
            self,
            Self::MouseEvent | Self::KeyboardEvent | Self::FocusEvent | Self::DecodeImageResponse
        )
    }

    /// Check if this tag flows consumer to producer
    #[must_use]
    pub const fn is_response(self) -> bool {
        !self.is_command()
    }
}

impl fmt::Display for MessageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Eof => "Eof",
            Self::UpdateGraphics => "UpdateGraphics",
            Self::UpdateBitmapData => "UpdateBitmapData",
            Self::UpdateTextContent => "UpdateTextContent",
            Self::UpdateFrame => "UpdateFrame",
            Self::UpdateStage => "UpdateStage",
            Self::UpdateNetStream => "UpdateNetStream",
            Self::RegisterFont => "RegisterFont",
            Self::DrawToBitmap => "DrawToBitmap",
            Self::RequestBitmapData => "RequestBitmapData",
            Self::DecodeImage => "DecodeImage",
            Self::MouseEvent => "MouseEvent",
            Self::KeyboardEvent => "KeyboardEvent",
            Self::FocusEvent => "FocusEvent",
            Self::DecodeImageResponse => "DecodeImageResponse",
        };
        write!(f, "{name}")
    }
}

/// Composite reference into one of the two id spaces.
///
/// Wire form is a single `i32`: `-1` for no reference, the
/// [`ASSET_ID_FLAG`] high bit for asset-table ids, a plain non-negative id
/// for tree nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeRef {
    /// No reference (`-1` on the wire)
    None,
    /// Tree-node table id
    Node(i32),
    /// Asset table id (flag already masked off)
    Asset(i32),
}

impl NodeRef {
    /// Decode a composite id
    #[must_use]
    pub const fn from_raw(raw: i32) -> Self {
        if raw == ID_NONE {
            Self::None
        } else if raw & ASSET_ID_FLAG != 0 {
            Self::Asset(raw & !ASSET_ID_FLAG)
        } else {
            Self::Node(raw)
        }
    }

    /// Encode back to a composite id
    #[must_use]
    pub const fn to_raw(self) -> i32 {
        match self {
            Self::None => ID_NONE,
            Self::Node(id) => id,
            Self::Asset(id) => id | ASSET_ID_FLAG,
        }
    }
}

/// Field-presence bitmask carried by `UpdateFrame` and `DrawToBitmap`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateFlags(u32);

impl UpdateFlags {
    /// Transform matrix present
    pub const HAS_MATRIX: u32 = 1 << 0;
    /// Color transform present
    pub const HAS_COLOR_TRANSFORM: u32 = 1 << 1;
    /// Mask reference present
    pub const HAS_MASK: u32 = 1 << 2;
    /// Numeric clip depth present
    pub const HAS_CLIP_DEPTH: u32 = 1 << 3;
    /// Miscellaneous block (ratio, blend, filters, visibility, snapping,
    /// smoothing) present
    pub const HAS_MISC: u32 = 1 << 4;
    /// Full children-list replace present
    pub const HAS_CHILDREN: u32 = 1 << 5;
    /// Clip rectangle present (`DrawToBitmap` only)
    pub const HAS_CLIP_RECT: u32 = 1 << 6;
    /// Valid flag bits mask
    pub const VALID_MASK: u32 = Self::HAS_MATRIX
        | Self::HAS_COLOR_TRANSFORM
        | Self::HAS_MASK
        | Self::HAS_CLIP_DEPTH
        | Self::HAS_MISC
        | Self::HAS_CHILDREN
        | Self::HAS_CLIP_RECT;

    /// Create empty flags
    #[must_use]
    pub const fn new() -> Self {
        Self(0)
    }

    /// Decode from the wire, ignoring bits outside [`Self::VALID_MASK`]
    #[must_use]
    pub const fn from_raw(value: u32) -> Self {
        Self(value & Self::VALID_MASK)
    }

    /// Convert to the wire representation
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// Set a flag
    #[must_use]
    pub const fn with(mut self, flag: u32) -> Self {
        debug_assert!(flag & !Self::VALID_MASK == 0, "invalid flag bit");
        self.0 |= flag;
        self
    }

    /// Check if a flag is set
    #[must_use]
    pub const fn has(self, flag: u32) -> bool {
        (self.0 & flag) != 0
    }

    /// Check for the transform matrix field
    #[must_use]
    pub const fn has_matrix(self) -> bool {
        self.has(Self::HAS_MATRIX)
    }

    /// Check for the color transform field
    #[must_use]
    pub const fn has_color_transform(self) -> bool {
        self.has(Self::HAS_COLOR_TRANSFORM)
    }

    /// Check for the mask reference field
    #[must_use]
    pub const fn has_mask(self) -> bool {
        self.has(Self::HAS_MASK)
    }

    /// Check for the clip depth field
    #[must_use]
    pub const fn has_clip_depth(self) -> bool {
        self.has(Self::HAS_CLIP_DEPTH)
    }

    /// Check for the miscellaneous block
    #[must_use]
    pub const fn has_misc(self) -> bool {
        self.has(Self::HAS_MISC)
    }

    /// Check for the children-list replace
    #[must_use]
    pub const fn has_children(self) -> bool {
        self.has(Self::HAS_CHILDREN)
    }

    /// Check for the clip rectangle field
    #[must_use]
    pub const fn has_clip_rect(self) -> bool {
        self.has(Self::HAS_CLIP_RECT)
    }
}

/// Sparse color-transform encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ColorTransformTag {
    /// Identity transform, no further bytes
    Identity = 0,
    /// One float: alpha multiplier
    AlphaMultiplierOnly = 1,
    /// Four multipliers plus four integer offsets
    All = 2,
}

impl ColorTransformTag {
    /// Convert from the wire representation
    #[must_use]
    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::Identity),
            1 => Some(Self::AlphaMultiplierOnly),
            2 => Some(Self::All),
            _ => None,
        }
    }

    /// Convert to the wire representation
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self as i32
    }
}

/// Filter record tags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum FilterTag {
    /// Gaussian blur
    Blur = 0,
    /// Drop shadow
    DropShadow = 1,
}

impl FilterTag {
    /// Convert from the wire representation
    #[must_use]
    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::Blur),
            1 => Some(Self::DropShadow),
            _ => None,
        }
    }

    /// Convert to the wire representation
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self as i32
    }
}

/// Pixel formats carried by bitmap payloads and decode responses
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[repr(i32)]
pub enum ImageFormat {
    /// No image (decode failed)
    #[default]
    None = 0,
    /// 32-bit ARGB, premultiplied alpha
    PremultipliedAlphaArgb = 1,
    /// 32-bit ARGB, straight alpha
    StraightAlphaArgb = 2,
    /// 32-bit RGBA, straight alpha
    StraightAlphaRgba = 3,
    /// Encoded JPEG bytes
    Jpeg = 4,
    /// Encoded PNG bytes
    Png = 5,
    /// Encoded GIF bytes
    Gif = 6,
}

impl ImageFormat {
    /// Convert from the wire representation
    #[must_use]
    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::None),
            1 => Some(Self::PremultipliedAlphaArgb),
            2 => Some(Self::StraightAlphaArgb),
            3 => Some(Self::StraightAlphaRgba),
            4 => Some(Self::Jpeg),
            5 => Some(Self::Png),
            6 => Some(Self::Gif),
            _ => None,
        }
    }

    /// Convert to the wire representation
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self as i32
    }
}

/// Compositing blend modes
///
/// Unknown wire values fall back to `Normal` rather than aborting the batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[repr(i32)]
#[allow(missing_docs)]
pub enum BlendMode {
    #[default]
    Normal = 1,
    Layer = 2,
    Multiply = 3,
    Screen = 4,
    Lighten = 5,
    Darken = 6,
    Difference = 7,
    Add = 8,
    Subtract = 9,
    Invert = 10,
    Alpha = 11,
    Erase = 12,
    Overlay = 13,
    HardLight = 14,
}

impl BlendMode {
    /// Convert from the wire representation
    #[must_use]
    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            1 => Some(Self::Normal),
            2 => Some(Self::Layer),
            3 => Some(Self::Multiply),
            4 => Some(Self::Screen),
            5 => Some(Self::Lighten),
            6 => Some(Self::Darken),
            7 => Some(Self::Difference),
            8 => Some(Self::Add),
            9 => Some(Self::Subtract),
            10 => Some(Self::Invert),
            11 => Some(Self::Alpha),
            12 => Some(Self::Erase),
            13 => Some(Self::Overlay),
            14 => Some(Self::HardLight),
            _ => None,
        }
    }

    /// Convert to the wire representation
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self as i32
    }
}

/// Pixel snapping applied when positioning a node
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[repr(i32)]
pub enum PixelSnapping {
    /// Never snap
    Never = 0,
    /// Always snap to whole pixels
    Always = 1,
    /// Snap when the transform is axis-aligned
    #[default]
    Auto = 2,
}

impl PixelSnapping {
    /// Convert from the wire representation
    #[must_use]
    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::Never),
            1 => Some(Self::Always),
            2 => Some(Self::Auto),
            _ => None,
        }
    }

    /// Convert to the wire representation
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self as i32
    }
}

/// Bitmap smoothing applied when scaling a node
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[repr(i32)]
pub enum Smoothing {
    /// Nearest-neighbor sampling
    #[default]
    Never = 0,
    /// Bilinear sampling
    Always = 1,
}

impl Smoothing {
    /// Convert from the wire representation
    #[must_use]
    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::Never),
            1 => Some(Self::Always),
            _ => None,
        }
    }

    /// Convert to the wire representation
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self as i32
    }
}

/// Text field auto-size modes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[repr(i32)]
pub enum AutoSizeMode {
    /// Fixed bounds
    #[default]
    None = 0,
    /// Grow from the left edge
    Left = 1,
    /// Grow from the center
    Center = 2,
    /// Grow from the right edge
    Right = 3,
}

impl AutoSizeMode {
    /// Convert from the wire representation
    #[must_use]
    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::None),
            1 => Some(Self::Left),
            2 => Some(Self::Center),
            3 => Some(Self::Right),
            _ => None,
        }
    }

    /// Convert to the wire representation
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self as i32
    }
}

/// Forwarded pointer event kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
#[allow(missing_docs)]
pub enum MouseEventKind {
    Click = 0,
    DblClick = 1,
    MouseDown = 2,
    MouseMove = 3,
    MouseUp = 4,
    MouseOver = 5,
    MouseOut = 6,
}

impl MouseEventKind {
    /// Convert from the wire representation
    #[must_use]
    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::Click),
            1 => Some(Self::DblClick),
            2 => Some(Self::MouseDown),
            3 => Some(Self::MouseMove),
            4 => Some(Self::MouseUp),
            5 => Some(Self::MouseOver),
            6 => Some(Self::MouseOut),
            _ => None,
        }
    }

    /// Convert to the wire representation
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self as i32
    }
}

/// Forwarded key event kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
#[allow(missing_docs)]
pub enum KeyboardEventKind {
    KeyDown = 0,
    KeyPress = 1,
    KeyUp = 2,
}

impl KeyboardEventKind {
    /// Convert from the wire representation
    #[must_use]
    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::KeyDown),
            1 => Some(Self::KeyPress),
            2 => Some(Self::KeyUp),
            _ => None,
        }
    }

    /// Convert to the wire representation
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self as i32
    }
}

/// Forwarded focus/visibility event kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
#[allow(missing_docs)]
pub enum FocusEventKind {
    DocumentHidden = 0,
    DocumentVisible = 1,
    WindowBlur = 2,
    WindowFocus = 3,
}

impl FocusEventKind {
    /// Convert from the wire representation
    #[must_use]
    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::DocumentHidden),
            1 => Some(Self::DocumentVisible),
            2 => Some(Self::WindowBlur),
            3 => Some(Self::WindowFocus),
            _ => None,
        }
    }

    /// Convert to the wire representation
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self as i32
    }
}

/// Modifier-key bits carried by forwarded input events
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventModifiers(u32);

impl EventModifiers {
    /// Control key held
    pub const CTRL: u32 = 1 << 0;
    /// Alt key held
    pub const ALT: u32 = 1 << 1;
    /// Shift key held
    pub const SHIFT: u32 = 1 << 2;
    /// Valid modifier bits mask
    pub const VALID_MASK: u32 = Self::CTRL | Self::ALT | Self::SHIFT;

    /// Create empty modifiers
    #[must_use]
    pub const fn new() -> Self {
        Self(0)
    }

    /// Decode from the wire, ignoring bits outside [`Self::VALID_MASK`]
    #[must_use]
    pub const fn from_raw(value: u32) -> Self {
        Self(value & Self::VALID_MASK)
    }

    /// Convert to the wire representation
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// Set a modifier bit
    #[must_use]
    pub const fn with(mut self, modifier: u32) -> Self {
        debug_assert!(modifier & !Self::VALID_MASK == 0, "invalid modifier bit");
        self.0 |= modifier;
        self
    }

    /// Check if a modifier bit is set
    #[must_use]
    pub const fn has(self, modifier: u32) -> bool {
        (self.0 & modifier) != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_tag_roundtrip() {
        for raw in 0..=14 {
            let tag = MessageTag::from_i32(raw).unwrap();
            assert_eq!(tag.as_i32(), raw);
        }
        assert!(MessageTag::from_i32(15).is_none());
        assert!(MessageTag::from_i32(-1).is_none());
    }

    #[test]
    fn test_tag_direction() {
        assert!(MessageTag::UpdateFrame.is_command());
        assert!(MessageTag::DecodeImage.is_command());
        assert!(MessageTag::MouseEvent.is_response());
        assert!(MessageTag::DecodeImageResponse.is_response());
    }

    #[test]
    fn test_node_ref_spaces() {
        assert_eq!(NodeRef::from_raw(-1), NodeRef::None);
        assert_eq!(NodeRef::from_raw(7), NodeRef::Node(7));
        assert_eq!(NodeRef::from_raw(7 | ASSET_ID_FLAG), NodeRef::Asset(7));

        assert_eq!(NodeRef::Asset(42).to_raw(), 42 | ASSET_ID_FLAG);
        assert_eq!(NodeRef::from_raw(NodeRef::Node(42).to_raw()), NodeRef::Node(42));
    }

    #[test]
    fn test_update_flags() {
        let flags = UpdateFlags::new()
            .with(UpdateFlags::HAS_MATRIX)
            .with(UpdateFlags::HAS_CHILDREN);

        assert!(flags.has_matrix());
        assert!(flags.has_children());
        assert!(!flags.has_mask());
        assert!(!flags.has_misc());
    }

    #[test]
    fn test_update_flags_ignores_unknown_bits() {
        let flags = UpdateFlags::from_raw(UpdateFlags::HAS_MATRIX | 0x8000_0000);
        assert_eq!(flags.as_u32(), UpdateFlags::HAS_MATRIX);
    }

    #[test]
    fn test_blend_mode_closed_set() {
        assert_eq!(BlendMode::from_i32(3), Some(BlendMode::Multiply));
        assert_eq!(BlendMode::from_i32(0), None);
        assert_eq!(BlendMode::from_i32(15), None);
        assert_eq!(BlendMode::default(), BlendMode::Normal);
    }

    #[test]
    fn test_event_modifiers() {
        let modifiers = EventModifiers::new()
            .with(EventModifiers::CTRL)
            .with(EventModifiers::SHIFT);
        assert!(modifiers.has(EventModifiers::CTRL));
        assert!(!modifiers.has(EventModifiers::ALT));
        assert_eq!(modifiers.as_u32(), 0b101);
    }
}
