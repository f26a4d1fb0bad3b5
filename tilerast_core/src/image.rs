//! Row-major 2D images.

use zerocopy::{Immutable, IntoBytes};

/// A row-major 2D image of `T` pixels. Row 0 is the top of the image.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Image<T> {
    width: u32,
    height: u32,
    pixels: Vec<T>,
}

impl<T: Copy> Image<T> {
    /// Creates a `width x height` image filled with `value`.
    pub fn filled(width: u32, height: u32, value: T) -> Self {
        Self {
            width,
            height,
            pixels: vec![value; width as usize * height as usize],
        }
    }

    /// Creates an image from row-major pixels. Returns [`None`] if the amount of pixels does not
    /// match the dimensions.
    pub fn from_pixels(width: u32, height: u32, pixels: Vec<T>) -> Option<Self> {
        (pixels.len() == width as usize * height as usize).then_some(Self {
            width,
            height,
            pixels,
        })
    }

    #[inline(always)]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline(always)]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    #[inline(always)]
    pub fn pixels(&self) -> &[T] {
        &self.pixels
    }

    #[inline(always)]
    pub fn pixels_mut(&mut self) -> &mut [T] {
        &mut self.pixels
    }

    /// Returns the pixel at the given coordinates, if they're in bounds.
    #[inline(always)]
    pub fn get(&self, x: u32, y: u32) -> Option<T> {
        (x < self.width && y < self.height)
            .then(|| self.pixels[y as usize * self.width as usize + x as usize])
    }

    /// Returns the pixel at the given coordinates.
    ///
    /// # Panics
    /// Panics if the coordinates are out of bounds.
    #[inline(always)]
    pub fn at(&self, x: u32, y: u32) -> T {
        assert!(x < self.width && y < self.height);
        self.pixels[y as usize * self.width as usize + x as usize]
    }

    /// Sets every pixel to `value`.
    pub fn fill(&mut self, value: T) {
        self.pixels.fill(value);
    }

    /// Reallocates this image with new dimensions, filling it with `value`.
    pub fn reallocate(&mut self, width: u32, height: u32, value: T) {
        self.width = width;
        self.height = height;
        self.pixels.clear();
        self.pixels
            .resize(width as usize * height as usize, value);
    }
}

impl<T: IntoBytes + Immutable> Image<T> {
    /// The raw bytes of the pixels, in row-major order.
    pub fn as_bytes(&self) -> &[u8] {
        self.pixels.as_bytes()
    }
}
