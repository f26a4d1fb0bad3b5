//! Texture sampling.

use crate::{color::Color, image::Image};
use glam::{Vec2, Vec4};
use strum::{IntoStaticStr, VariantArray};

/// The single texture bound to a frame. Texel `(0, 0)` is at `uv = (0, 0)`.
pub type Texture = Image<Color>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, VariantArray, IntoStaticStr)]
pub enum Filter {
    #[default]
    Nearest,
    Bilinear,
}

/// How texel coordinates outside of the texture are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, VariantArray, IntoStaticStr)]
pub enum AddressMode {
    #[default]
    Repeat,
    ClampToEdge,
}

impl AddressMode {
    /// Brings texel space coordinates close enough to the texture for integer texel math.
    #[inline(always)]
    fn reduce(self, coords: Vec2, size: Vec2) -> Vec2 {
        match self {
            Self::Repeat => coords.rem_euclid(size),
            Self::ClampToEdge => coords.clamp(Vec2::splat(-1.0), size),
        }
    }

    #[inline(always)]
    fn resolve(self, coord: i32, size: u32) -> u32 {
        match self {
            Self::Repeat => coord.rem_euclid(size as i32) as u32,
            Self::ClampToEdge => coord.clamp(0, size as i32 - 1) as u32,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Sampler {
    pub filter: Filter,
    pub address: AddressMode,
}

impl Sampler {
    #[inline(always)]
    fn texel(&self, texture: &Texture, x: i32, y: i32) -> Color {
        texture.at(
            self.address.resolve(x, texture.width()),
            self.address.resolve(y, texture.height()),
        )
    }

    /// Samples `texture` at `uv`. A texture without texels samples as opaque white.
    pub fn sample(&self, texture: &Texture, uv: Vec2) -> Color {
        if texture.is_empty() {
            return Color::WHITE;
        }

        let size = Vec2::new(texture.width() as f32, texture.height() as f32);
        match self.filter {
            Filter::Nearest => {
                let texel = self.address.reduce(uv * size, size).floor();
                self.texel(texture, texel.x as i32, texel.y as i32)
            }
            Filter::Bilinear => {
                let coords = self.address.reduce(uv * size - 0.5, size);
                let base = coords.floor();
                let frac = coords - base;
                let (x, y) = (base.x as i32, base.y as i32);

                let top = Vec4::from(self.texel(texture, x, y))
                    .lerp(Vec4::from(self.texel(texture, x + 1, y)), frac.x);
                let bottom = Vec4::from(self.texel(texture, x, y + 1))
                    .lerp(Vec4::from(self.texel(texture, x + 1, y + 1)), frac.x);

                Color::from(top.lerp(bottom, frac.y))
            }
        }
    }
}

/// A `size x size` checkerboard with `cells x cells` squares.
pub fn checkerboard(size: u32, cells: u32, even: Color, odd: Color) -> Texture {
    let cell = (size / cells.max(1)).max(1);
    let pixels = (0..size)
        .flat_map(|y| (0..size).map(move |x| (x, y)))
        .map(|(x, y)| {
            if (x / cell + y / cell) % 2 == 0 {
                even
            } else {
                odd
            }
        })
        .collect();

    Image::from_pixels(size, size, pixels).unwrap_or_default()
}
