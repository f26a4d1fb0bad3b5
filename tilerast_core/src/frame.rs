//! The double-buffered frame store.

use crate::{color::Color, image::Image};
use std::sync::Arc;

/// A completed (or in progress) generation of output images.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Frame {
    pub color: Image<Color>,
    /// Depth of the visible surface of each pixel. `+inf` where nothing was drawn.
    pub depth: Image<f32>,
    /// Number of the frame this generation holds. Frame 0 is the blank frame a store starts with.
    pub index: u64,
}

impl Frame {
    /// A blank frame filled with `clear`.
    pub fn new(width: u32, height: u32, clear: Color) -> Self {
        Self {
            color: Image::filled(width, height, clear),
            depth: Image::filled(width, height, f32::INFINITY),
            index: 0,
        }
    }

    #[inline(always)]
    pub fn width(&self) -> u32 {
        self.color.width()
    }

    #[inline(always)]
    pub fn height(&self) -> u32 {
        self.color.height()
    }

    /// Size of the images, in bytes.
    pub fn size_in_bytes(&self) -> usize {
        size_of_val(self.color.pixels()) + size_of_val(self.depth.pixels())
    }
}

/// Two generations of [`Frame`]s: the front one is the last completed frame and can be shared
/// with consumers, the back one is written by the frame being rendered.
///
/// Consumers receive the front frame as an [`Arc`], so a frame they hold on to never changes. On
/// [`FrameStore::swap`] the old front generation is reused as the new back one if nobody holds it
/// anymore, otherwise a new generation is allocated.
#[derive(Debug)]
pub struct FrameStore {
    front: Arc<Frame>,
    back: Frame,
    /// Color of blank generations.
    clear: Color,
    recycled: u64,
    allocated: u64,
}

impl FrameStore {
    pub fn new(width: u32, height: u32, clear: Color) -> Self {
        Self {
            front: Arc::new(Frame::new(width, height, clear)),
            back: Frame::new(width, height, clear),
            clear,
            recycled: 0,
            allocated: 0,
        }
    }

    #[inline(always)]
    pub fn width(&self) -> u32 {
        self.back.width()
    }

    #[inline(always)]
    pub fn height(&self) -> u32 {
        self.back.height()
    }

    /// Reallocates both generations. The front generation becomes a blank frame that keeps the
    /// current frame number.
    pub fn resize(&mut self, width: u32, height: u32) {
        let index = self.front.index;
        self.front = Arc::new(Frame {
            index,
            ..Frame::new(width, height, self.clear)
        });
        self.back = Frame::new(width, height, self.clear);
    }

    /// The generation being written.
    #[inline(always)]
    pub fn back_mut(&mut self) -> &mut Frame {
        &mut self.back
    }

    /// The last completed frame.
    #[inline(always)]
    pub fn current_frame(&self) -> Arc<Frame> {
        self.front.clone()
    }

    /// Publishes the back generation as the new front one.
    pub fn swap(&mut self) {
        let (width, height) = (self.width(), self.height());
        self.back.index = self.front.index + 1;

        let completed = Arc::new(std::mem::take(&mut self.back));
        let previous = std::mem::replace(&mut self.front, completed);

        self.back = match Arc::try_unwrap(previous) {
            Ok(frame) if frame.width() == width && frame.height() == height => {
                self.recycled += 1;
                frame
            }
            _ => {
                self.allocated += 1;
                Frame::new(width, height, self.clear)
            }
        };
    }

    /// Amount of swaps that reused the previous front generation.
    #[inline(always)]
    pub fn recycled(&self) -> u64 {
        self.recycled
    }

    /// Amount of swaps that had to allocate a new generation because a consumer was holding on to
    /// the previous one.
    #[inline(always)]
    pub fn allocated(&self) -> u64 {
        self.allocated
    }

    /// Size of both generations, in bytes.
    pub fn size_in_bytes(&self) -> usize {
        self.front.size_in_bytes() + self.back.size_in_bytes()
    }
}
