//! Geometry and effect decoding
//!
//! Matrices, rectangles, color transforms, and filter lists, using the
//! fixed-point and sparse-variant encodings of the wire format. Everything
//! here is a plain value type returned by copy; nothing borrows the reader.

use tracing::warn;

use super::{ChannelReader, ChannelWriter, ColorTransformTag, FilterTag, FIXED_POINT_SCALE, Result};

/// 2D affine transform.
///
/// The translation components travel pre-multiplied by the fixed-point
/// scale and are divided back on decode.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Matrix {
    /// Horizontal scale
    pub a: f32,
    /// Vertical shear
    pub b: f32,
    /// Horizontal shear
    pub c: f32,
    /// Vertical scale
    pub d: f32,
    /// Horizontal translation
    pub tx: f32,
    /// Vertical translation
    pub ty: f32,
}

impl Matrix {
    /// The identity transform
    pub const IDENTITY: Self = Self {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        tx: 0.0,
        ty: 0.0,
    };
}

impl Default for Matrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Axis-aligned rectangle.
///
/// All four fields travel as integers pre-multiplied by the fixed-point
/// scale, giving 1/20th sub-unit precision.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rectangle {
    /// Left edge
    pub x: f32,
    /// Top edge
    pub y: f32,
    /// Width
    pub w: f32,
    /// Height
    pub h: f32,
}

impl Rectangle {
    /// The empty rectangle at the origin
    pub const EMPTY: Self = Self {
        x: 0.0,
        y: 0.0,
        w: 0.0,
        h: 0.0,
    };

    /// Create a rectangle from its elements
    #[must_use]
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }
}

/// Packed 32-bit ARGB color.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Color(u32);

impl Color {
    /// Create from a packed ARGB value
    #[must_use]
    pub const fn from_argb(argb: u32) -> Self {
        Self(argb)
    }

    /// The packed ARGB value
    #[must_use]
    pub const fn as_argb(self) -> u32 {
        self.0
    }

    /// Alpha channel
    #[must_use]
    pub const fn alpha(self) -> u8 {
        (self.0 >> 24) as u8
    }

    /// Red channel
    #[must_use]
    pub const fn red(self) -> u8 {
        (self.0 >> 16) as u8
    }

    /// Green channel
    #[must_use]
    pub const fn green(self) -> u8 {
        (self.0 >> 8) as u8
    }

    /// Blue channel
    #[must_use]
    pub const fn blue(self) -> u8 {
        self.0 as u8
    }
}

/// Per-channel color multiplication and offset.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ColorTransform {
    /// Red multiplier
    pub red_multiplier: f32,
    /// Green multiplier
    pub green_multiplier: f32,
    /// Blue multiplier
    pub blue_multiplier: f32,
    /// Alpha multiplier
    pub alpha_multiplier: f32,
    /// Red offset
    pub red_offset: i32,
    /// Green offset
    pub green_offset: i32,
    /// Blue offset
    pub blue_offset: i32,
    /// Alpha offset
    pub alpha_offset: i32,
}

impl ColorTransform {
    /// The multiplicative-identity, zero-offset transform
    pub const IDENTITY: Self = Self {
        red_multiplier: 1.0,
        green_multiplier: 1.0,
        blue_multiplier: 1.0,
        alpha_multiplier: 1.0,
        red_offset: 0,
        green_offset: 0,
        blue_offset: 0,
        alpha_offset: 0,
    };

    /// Identity transform except for the alpha multiplier
    #[must_use]
    pub const fn with_alpha_multiplier(alpha_multiplier: f32) -> Self {
        Self {
            alpha_multiplier,
            ..Self::IDENTITY
        }
    }

    /// Check for the exact identity transform
    #[must_use]
    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// Check whether only the alpha multiplier differs from identity
    #[must_use]
    pub fn is_alpha_only(&self) -> bool {
        *self == Self::with_alpha_multiplier(self.alpha_multiplier)
    }
}

impl Default for ColorTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Gaussian blur filter record.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BlurFilter {
    /// Horizontal blur radius
    pub blur_x: f32,
    /// Vertical blur radius
    pub blur_y: f32,
    /// Number of blur passes
    pub quality: i32,
}

/// Drop-shadow filter record.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DropShadowFilter {
    /// Shadow opacity
    pub alpha: f32,
    /// Shadow angle in degrees
    pub angle: f32,
    /// Horizontal blur radius
    pub blur_x: f32,
    /// Vertical blur radius
    pub blur_y: f32,
    /// Shadow color
    pub color: Color,
    /// Offset distance from the object
    pub distance: f32,
    /// Hide the object, keep the shadow
    pub hide_object: bool,
    /// Inner shadow
    pub inner: bool,
    /// Knock the object out of the shadow
    pub knockout: bool,
    /// Number of blur passes
    pub quality: i32,
    /// Imprint strength
    pub strength: f32,
}

/// A decoded filter record.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Filter {
    /// Gaussian blur
    Blur(BlurFilter),
    /// Drop shadow
    DropShadow(DropShadowFilter),
}

impl ChannelReader {
    /// Read a fixed-point scaled integer as a float
    pub fn read_scaled(&mut self) -> Result<f32> {
        Ok(self.read_i32()? as f32 / FIXED_POINT_SCALE)
    }

    /// Read a matrix: four floats, then the two translation components
    /// divided by the fixed-point scale
    pub fn read_matrix(&mut self) -> Result<Matrix> {
        Ok(Matrix {
            a: self.read_f32()?,
            b: self.read_f32()?,
            c: self.read_f32()?,
            d: self.read_f32()?,
            tx: self.read_f32()? / FIXED_POINT_SCALE,
            ty: self.read_f32()? / FIXED_POINT_SCALE,
        })
    }

    /// Read a rectangle: four fixed-point scaled integers
    pub fn read_rectangle(&mut self) -> Result<Rectangle> {
        Ok(Rectangle {
            x: self.read_scaled()?,
            y: self.read_scaled()?,
            w: self.read_scaled()?,
            h: self.read_scaled()?,
        })
    }

    /// Read a packed ARGB color
    pub fn read_color(&mut self) -> Result<Color> {
        Ok(Color::from_argb(self.read_i32()? as u32))
    }

    /// Read a color transform in its tag-selected sparse encoding
    pub fn read_color_transform(&mut self) -> Result<ColorTransform> {
        let tag = self.read_i32()?;
        match ColorTransformTag::from_i32(tag) {
            Some(ColorTransformTag::Identity) => Ok(ColorTransform::IDENTITY),
            Some(ColorTransformTag::AlphaMultiplierOnly) => {
                Ok(ColorTransform::with_alpha_multiplier(self.read_f32()?))
            }
            Some(ColorTransformTag::All) => Ok(ColorTransform {
                red_multiplier: self.read_f32()?,
                green_multiplier: self.read_f32()?,
                blue_multiplier: self.read_f32()?,
                alpha_multiplier: self.read_f32()?,
                red_offset: self.read_i32()?,
                green_offset: self.read_i32()?,
                blue_offset: self.read_i32()?,
                alpha_offset: self.read_i32()?,
            }),
            None => Err(super::Error::InvalidValue {
                what: "color transform tag",
                value: tag,
            }),
        }
    }

    /// Read a filter list: a count followed by tagged records.
    ///
    /// A tag outside the closed set is logged and dropped without consuming
    /// further bytes; the rest of the list still decodes.
    pub fn read_filters(&mut self) -> Result<Vec<Filter>> {
        let count = self.read_i32()?;
        let mut filters = Vec::new();
        for _ in 0..count {
            let tag = self.read_i32()?;
            match FilterTag::from_i32(tag) {
                Some(FilterTag::Blur) => filters.push(Filter::Blur(BlurFilter {
                    blur_x: self.read_f32()?,
                    blur_y: self.read_f32()?,
                    quality: self.read_i32()?,
                })),
                Some(FilterTag::DropShadow) => {
                    filters.push(Filter::DropShadow(DropShadowFilter {
                        alpha: self.read_f32()?,
                        angle: self.read_f32()?,
                        blur_x: self.read_f32()?,
                        blur_y: self.read_f32()?,
                        color: self.read_color()?,
                        distance: self.read_f32()?,
                        hide_object: self.read_bool()?,
                        inner: self.read_bool()?,
                        knockout: self.read_bool()?,
                        quality: self.read_i32()?,
                        strength: self.read_f32()?,
                    }));
                }
                None => warn!(tag, "filter not implemented, dropping"),
            }
        }
        Ok(filters)
    }
}

impl ChannelWriter {
    /// Write a float as a fixed-point scaled integer, rounding to the
    /// nearest 1/20th
    pub fn write_scaled(&mut self, value: f32) {
        self.write_i32((value * FIXED_POINT_SCALE).round() as i32);
    }

    /// Write a matrix
    pub fn write_matrix(&mut self, matrix: &Matrix) {
        self.write_f32(matrix.a);
        self.write_f32(matrix.b);
        self.write_f32(matrix.c);
        self.write_f32(matrix.d);
        self.write_f32(matrix.tx * FIXED_POINT_SCALE);
        self.write_f32(matrix.ty * FIXED_POINT_SCALE);
    }

    /// Write a rectangle
    pub fn write_rectangle(&mut self, rectangle: &Rectangle) {
        self.write_scaled(rectangle.x);
        self.write_scaled(rectangle.y);
        self.write_scaled(rectangle.w);
        self.write_scaled(rectangle.h);
    }

    /// Write a packed ARGB color
    pub fn write_color(&mut self, color: Color) {
        self.write_i32(color.as_argb() as i32);
    }

    /// Write a color transform, picking the smallest sparse encoding
    pub fn write_color_transform(&mut self, transform: &ColorTransform) {
        if transform.is_identity() {
            self.write_i32(ColorTransformTag::Identity.as_i32());
        } else if transform.is_alpha_only() {
            self.write_i32(ColorTransformTag::AlphaMultiplierOnly.as_i32());
            self.write_f32(transform.alpha_multiplier);
        } else {
            self.write_i32(ColorTransformTag::All.as_i32());
            self.write_f32(transform.red_multiplier);
            self.write_f32(transform.green_multiplier);
            self.write_f32(transform.blue_multiplier);
            self.write_f32(transform.alpha_multiplier);
            self.write_i32(transform.red_offset);
            self.write_i32(transform.green_offset);
            self.write_i32(transform.blue_offset);
            self.write_i32(transform.alpha_offset);
        }
    }

    /// Write a filter list
    pub fn write_filters(&mut self, filters: &[Filter]) {
        self.write_i32(filters.len() as i32);
        for filter in filters {
            match filter {
                Filter::Blur(blur) => {
                    self.write_i32(FilterTag::Blur.as_i32());
                    self.write_f32(blur.blur_x);
                    self.write_f32(blur.blur_y);
                    self.write_i32(blur.quality);
                }
                Filter::DropShadow(shadow) => {
                    self.write_i32(FilterTag::DropShadow.as_i32());
                    self.write_f32(shadow.alpha);
                    self.write_f32(shadow.angle);
                    self.write_f32(shadow.blur_x);
                    self.write_f32(shadow.blur_y);
                    self.write_color(shadow.color);
                    self.write_f32(shadow.distance);
                    self.write_bool(shadow.hide_object);
                    self.write_bool(shadow.inner);
                    self.write_bool(shadow.knockout);
                    self.write_i32(shadow.quality);
                    self.write_f32(shadow.strength);
                }
            }
        }
    }
}
