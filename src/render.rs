use ndarray::Array2;
use rayon::iter::{IntoParallelIterator, ParallelIterator};

use crate::{
    frame::Frame,
    types::{Rgba, Value, Vector2D},
    utils::pixel_center,
    variant::SceneVariant,
};

/// Evaluates `variant` at every pixel of a `width × height` frame on the CPU.
///
/// The frame resamples the variant's resolution uniform, so a frame smaller
/// than the resolution is a cheap preview of the same image. Work is
/// parallelised over rows using Rayon.
///
/// ```text
/// Per pixel:
/// 1. pixel_center         →  bottom-left origin pixel position
/// 2. × resolution / size  →  position in the variant's resolution
/// 3. SceneVariant::evaluate
/// 4. quantize             →  RGBA8
/// ```
pub fn render_frame(variant: &SceneVariant, width: usize, height: usize) -> Frame {
    if width == 0 || height == 0 {
        return Frame::new_empty(width, height);
    }

    let _span =
        tracing::info_span!("render_frame", variant = variant.name(), width, height).entered();

    let resolution = variant.uniforms().resolution;
    let scale = Vector2D::new(
        resolution.x / width as Value,
        resolution.y / height as Value,
    );

    let rows: Vec<Vec<Rgba>> = (0..height)
        .into_par_iter()
        .map(|row| {
            (0..width)
                .map(|col| variant.evaluate(pixel_center(row, col, height).component_mul(&scale)))
                .collect()
        })
        .collect();

    let colors: Vec<Rgba> = rows.into_iter().flatten().collect();
    match Array2::from_shape_vec((height, width), colors) {
        Ok(colors) => Frame::from_colors(&colors),
        Err(err) => {
            tracing::warn!(%err, "rendered pixel count does not match the frame");
            Frame::new_empty(width, height)
        }
    }
}
