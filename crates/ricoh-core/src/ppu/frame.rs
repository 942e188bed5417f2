use core::fmt;

pub const FRAME_WIDTH: usize = 256;
pub const FRAME_HEIGHT: usize = 240;
pub const FRAME_PIXELS: usize = FRAME_WIDTH * FRAME_HEIGHT;

/// One picture as 6-bit palette indices, row-major from the top-left.
#[derive(Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    pixels: Box<[u8]>,
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FrameBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameBuffer")
            .field("width", &FRAME_WIDTH)
            .field("height", &FRAME_HEIGHT)
            .finish_non_exhaustive()
    }
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self {
            pixels: vec![0; FRAME_PIXELS].into_boxed_slice(),
        }
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixel(&self, x: usize, y: usize) -> u8 {
        self.pixels[y * FRAME_WIDTH + x]
    }

    pub fn row(&self, y: usize) -> &[u8] {
        &self.pixels[y * FRAME_WIDTH..(y + 1) * FRAME_WIDTH]
    }

    pub fn copy_from(&mut self, other: &FrameBuffer) {
        self.pixels.copy_from_slice(&other.pixels);
    }

    pub(crate) fn set(&mut self, x: usize, y: usize, index: u8) {
        self.pixels[y * FRAME_WIDTH + x] = index;
    }

    pub(crate) fn clear(&mut self) {
        self.pixels.fill(0);
    }
}
