use ndarray::Array2;

use crate::types::{Rgba, Value};

/// One rendered backdrop image.
///
/// Pixels are stored row-major with row `0` at the top, the layout image
/// uploads expect. Colours are quantized to 8 bits per channel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    /// `[row, col]` indexed RGBA8 pixels.
    pub pixels: Array2<[u8; 4]>,
}

impl Frame {
    /// Creates a transparent black frame.
    pub fn new_empty(width: usize, height: usize) -> Self {
        Self {
            pixels: Array2::from_elem((height, width), [0; 4]),
        }
    }

    /// Quantizes a grid of `[0, 1]` colours.
    pub fn from_colors(colors: &Array2<Rgba>) -> Self {
        Self {
            pixels: colors.map(quantize),
        }
    }

    pub fn width(&self) -> usize {
        self.pixels.ncols()
    }

    pub fn height(&self) -> usize {
        self.pixels.nrows()
    }

    /// Pixel at `row` (from the top) and `col`, if in bounds.
    pub fn pixel(&self, row: usize, col: usize) -> Option<[u8; 4]> {
        self.pixels.get((row, col)).copied()
    }

    /// Tightly packed RGBA8 bytes, top row first.
    pub fn to_rgba8(&self) -> Vec<u8> {
        self.pixels.iter().flatten().copied().collect()
    }

    /// Copies the frame into `dst` when the sizes match, returning whether it did.
    pub fn copy_into(&self, dst: &mut [u8]) -> bool {
        if dst.len() != self.width() * self.height() * 4 {
            return false;
        }
        for (chunk, pixel) in dst.chunks_exact_mut(4).zip(self.pixels.iter()) {
            chunk.copy_from_slice(pixel);
        }
        true
    }
}

#[inline]
fn quantize(color: &Rgba) -> [u8; 4] {
    let channel = |c: Value| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
    [
        channel(color.x),
        channel(color.y),
        channel(color.z),
        channel(color.w),
    ]
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn should_quantize_and_clamp_channels() {
        let colors = Array2::from_elem((1, 2), Rgba::new(1.5, 0.5, -0.2, 1.0));
        let frame = Frame::from_colors(&colors);
        assert_eq!(frame.pixel(0, 1), Some([255, 128, 0, 255]));
        assert_eq!(frame.pixel(1, 0), None);
    }

    #[test]
    fn should_pack_rows_top_first() {
        let mut frame = Frame::new_empty(2, 2);
        frame.pixels[(0, 1)] = [1, 2, 3, 4];
        frame.pixels[(1, 0)] = [5, 6, 7, 8];
        assert_eq!(
            frame.to_rgba8(),
            vec![0, 0, 0, 0, 1, 2, 3, 4, 5, 6, 7, 8, 0, 0, 0, 0]
        );
    }

    #[test]
    fn should_refuse_mismatched_copy() {
        let frame = Frame::new_empty(3, 2);
        let mut short = vec![9; 8];
        assert!(!frame.copy_into(&mut short));
        assert_eq!(short, vec![9; 8]);
        let mut exact = vec![9; 24];
        assert!(frame.copy_into(&mut exact));
        assert!(exact.iter().all(|b| *b == 0));
    }
}
