use anyhow::{ensure, Context, Result};
use image::imageops::{self, FilterType};
use image::GrayImage;
use rayon::prelude::*;

use super::{LuminanceGrid, RawFrame, GRID_SIZE, QUANT_STEP};

// ITU-R BT.709 luma coefficients.
const R_WEIGHT: f32 = 0.2126;
const G_WEIGHT: f32 = 0.7152;
const B_WEIGHT: f32 = 0.0722;

/// Collapse a full-resolution frame to the fixed 64x64 quantized grid.
///
/// The luminance plane is computed over the whole frame, stretched to
/// 64x64 (aspect ratio is not preserved), then snapped to 16 levels.
pub fn reduce(frame: &RawFrame) -> Result<LuminanceGrid> {
    ensure!(frame.width > 0 && frame.height > 0, "frame is empty");
    let expected = frame.width as usize * frame.height as usize * 3;
    ensure!(
        frame.data.len() == expected,
        "frame buffer holds {} bytes, expected {} for {}x{} rgb",
        frame.data.len(),
        expected,
        frame.width,
        frame.height
    );

    let luminance: Vec<u8> = frame
        .data
        .par_chunks_exact(3)
        .map(|px| {
            let l = R_WEIGHT * px[0] as f32 + G_WEIGHT * px[1] as f32 + B_WEIGHT * px[2] as f32;
            l.round() as u8
        })
        .collect();

    let plane = GrayImage::from_raw(frame.width, frame.height, luminance)
        .context("luminance plane does not match frame dimensions")?;
    let reduced = imageops::resize(
        &plane,
        GRID_SIZE as u32,
        GRID_SIZE as u32,
        FilterType::Triangle,
    );

    let levels = reduced.into_raw().into_iter().map(quantize).collect();
    Ok(LuminanceGrid::from_levels(levels))
}

/// Snap a luminance level to the nearest lower multiple of 16.
pub fn quantize(level: u8) -> u8 {
    (level / QUANT_STEP) * QUANT_STEP
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid_frame(width: u32, height: u32, rgb: [u8; 3]) -> RawFrame {
        let mut data = Vec::with_capacity((width * height * 3) as usize);
        for _ in 0..width * height {
            data.extend_from_slice(&rgb);
        }
        RawFrame { width, height, data }
    }

    #[test]
    fn grid_is_always_64x64() {
        for (w, h) in [(64, 64), (1, 1), (1920, 1080), (31, 77)] {
            let grid = reduce(&solid_frame(w, h, [128, 128, 128])).unwrap();
            assert_eq!(grid.levels().len(), GRID_SIZE * GRID_SIZE);
        }
    }

    #[test]
    fn levels_are_multiples_of_16() {
        let grid = reduce(&solid_frame(100, 50, [200, 30, 90])).unwrap();
        for &level in grid.levels() {
            assert_eq!(level % QUANT_STEP, 0);
            assert!(level <= 240);
        }
    }

    #[test]
    fn quantization_is_idempotent() {
        for level in 0..=255u8 {
            assert_eq!(quantize(quantize(level)), quantize(level));
        }
    }

    #[test]
    fn white_frame_saturates_at_240() {
        let grid = reduce(&solid_frame(10, 10, [255, 255, 255])).unwrap();
        assert!(grid.levels().iter().all(|&l| l == 240));
    }

    #[test]
    fn black_frame_stays_at_zero() {
        let grid = reduce(&solid_frame(10, 10, [0, 0, 0])).unwrap();
        assert!(grid.levels().iter().all(|&l| l == 0));
    }

    #[test]
    fn luma_weights_favor_green() {
        let green = reduce(&solid_frame(8, 8, [0, 255, 0])).unwrap();
        let red = reduce(&solid_frame(8, 8, [255, 0, 0])).unwrap();
        assert!(green.level(0, 0) > red.level(0, 0));
    }

    #[test]
    fn empty_frame_is_rejected() {
        let empty = RawFrame { width: 0, height: 0, data: Vec::new() };
        assert!(reduce(&empty).is_err());

        let truncated = RawFrame { width: 4, height: 4, data: vec![0; 10] };
        assert!(reduce(&truncated).is_err());
    }
}
