use crate::frame::{LuminanceGrid, GRID_SIZE, QUANT_STEP};
use crate::synth::ColumnFrequency;

/// Where the reduced frame and the per-column frequency log end up.
pub trait DisplaySink: Send + Sync {
    fn show_grid(&self, grid: &LuminanceGrid);
    fn show_frequencies(&self, frequencies: &[ColumnFrequency]);
}

// 16-level ramp, darkest to brightest; one glyph per quantization band.
const RAMP: &[u8; 16] = b" .:-=+*coahA#%8@";

pub struct ConsoleDisplay {
    show_grid: bool,
    show_frequencies: bool,
}

impl ConsoleDisplay {
    pub fn new(show_grid: bool, show_frequencies: bool) -> Self {
        Self { show_grid, show_frequencies }
    }
}

fn glyph(level: u8) -> char {
    RAMP[(level / QUANT_STEP) as usize] as char
}

impl DisplaySink for ConsoleDisplay {
    fn show_grid(&self, grid: &LuminanceGrid) {
        if !self.show_grid {
            return;
        }
        let mut out = String::with_capacity(GRID_SIZE * (GRID_SIZE + 1));
        for row in 0..GRID_SIZE {
            for col in 0..GRID_SIZE {
                out.push(glyph(grid.level(row, col)));
            }
            out.push('\n');
        }
        print!("{out}");
    }

    fn show_frequencies(&self, frequencies: &[ColumnFrequency]) {
        if !self.show_frequencies {
            return;
        }
        for cf in frequencies {
            println!("{cf}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ramp_covers_all_quantization_bands() {
        assert_eq!(glyph(0), ' ');
        assert_eq!(glyph(240), '@');
        // One distinct glyph per band.
        let glyphs: std::collections::HashSet<char> =
            (0..16u8).map(|band| glyph(band * QUANT_STEP)).collect();
        assert_eq!(glyphs.len(), 16);
    }
}
