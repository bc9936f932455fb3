mod reduce;
mod source;

pub use reduce::{quantize, reduce};
pub use source::{Fetch, FrameSource, ImageSource, VideoSource};

/// Side length of the reduced grid; also the number of audible columns.
pub const GRID_SIZE: usize = 64;
/// Luminance levels are quantized to multiples of this step.
pub const QUANT_STEP: u8 = 16;

/// A decoded full-resolution frame, interleaved RGB.
pub struct RawFrame {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

/// Fixed 64x64 grid of quantized luminance levels, row-major.
///
/// Every level is a multiple of [`QUANT_STEP`], so values range over
/// {0, 16, ..., 240} regardless of the source frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LuminanceGrid {
    levels: Vec<u8>,
}

impl LuminanceGrid {
    pub(crate) fn from_levels(levels: Vec<u8>) -> Self {
        debug_assert_eq!(levels.len(), GRID_SIZE * GRID_SIZE);
        Self { levels }
    }

    pub fn level(&self, row: usize, col: usize) -> u8 {
        self.levels[row * GRID_SIZE + col]
    }

    /// Levels down one column, top to bottom.
    pub fn column(&self, col: usize) -> impl Iterator<Item = u8> + '_ {
        (0..GRID_SIZE).map(move |row| self.level(row, col))
    }

    pub fn levels(&self) -> &[u8] {
        &self.levels
    }
}
