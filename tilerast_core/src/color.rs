//! Pixel color type.

use glam::Vec4;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// A linear RGBA color with 32-bit float channels. This is the pixel type of color images and
/// textures.
///
/// The layout is four consecutive `f32`s, so a slice of colors can be handed to a presenter as raw
/// bytes (see [`Image::as_bytes`](crate::image::Image::as_bytes)).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, IntoBytes, FromBytes, Immutable, KnownLayout)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Self = Self::rgb(0.0, 0.0, 0.0);
    pub const WHITE: Self = Self::rgb(1.0, 1.0, 1.0);

    #[inline(always)]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Creates an opaque color.
    #[inline(always)]
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self::new(r, g, b, 1.0)
    }

    /// Creates a color from 8-bit channels.
    pub fn from_rgba8(rgba: [u8; 4]) -> Self {
        let [r, g, b, a] = rgba.map(|c| f32::from(c) / 255.0);
        Self::new(r, g, b, a)
    }

    /// Quantizes this color to 8-bit channels, clamping out of range values.
    pub fn to_rgba8(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a].map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8)
    }
}

impl From<Vec4> for Color {
    #[inline(always)]
    fn from(value: Vec4) -> Self {
        Self::new(value.x, value.y, value.z, value.w)
    }
}

impl From<Color> for Vec4 {
    #[inline(always)]
    fn from(value: Color) -> Self {
        Vec4::new(value.r, value.g, value.b, value.a)
    }
}
