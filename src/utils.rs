use crate::types::{Value, Vector2D};

/// Converts a pixel position into camera-plane coordinates.
///
/// The viewport centre maps to `(0, 0)` and the vertical extent to `[-1, 1]`;
/// the horizontal extent is stretched by the aspect ratio:
///
/// ```text
/// uv = (2·pixel - resolution) / resolution.y
///
///  (-aspect, 1) +-----------+ (aspect, 1)
///               |     0     |
/// (-aspect, -1) +-----------+ (aspect, -1)
/// ```
#[inline]
pub fn pixel_to_uv(pixel: Vector2D, resolution: Vector2D) -> Vector2D {
    (pixel * 2.0 - resolution) / resolution.y
}

/// Converts a pixel position (origin bottom-left) into normalized device
/// coordinates, `[-1, 1]` along both axes.
#[inline]
pub fn pixel_to_ndc(pixel: Vector2D, resolution: Vector2D) -> Vector2D {
    (pixel * 2.0).component_div(&resolution) - Vector2D::repeat(1.0)
}

/// Converts a client-space pointer position (origin top-left, `y` down) into
/// normalized device coordinates (`y` up), clamped to `[-1, 1]²`.
///
/// ```text
/// client (0, 0) ----------- (w, 0)          ndc (-1, 1) ----------- (1, 1)
///        |                    |      →           |                    |
///        (0, h) ----------- (w, h)               (-1, -1) --------- (1, -1)
/// ```
///
/// Returns `None` for a viewport without area.
#[inline]
pub fn client_to_ndc(client: Vector2D, viewport: Vector2D) -> Option<Vector2D> {
    if !(viewport.x > 0.0 && viewport.y > 0.0) || !client.iter().all(|c| c.is_finite()) {
        return None;
    }
    let x = client.x / viewport.x * 2.0 - 1.0;
    let y = -(client.y / viewport.y * 2.0 - 1.0);
    Some(Vector2D::new(x.clamp(-1.0, 1.0), y.clamp(-1.0, 1.0)))
}

/// Centre of the pixel in row `row` (counted from the top) and column `col`,
/// in the bottom-left-origin pixel space [`pixel_to_uv`] expects.
#[inline]
pub fn pixel_center(row: usize, col: usize, height: usize) -> Vector2D {
    Vector2D::new(col as Value + 0.5, (height - 1 - row) as Value + 0.5)
}

/// Scales a window size by `scale`, keeping at least one pixel per axis.
#[inline]
pub fn scaled_extent(width: Value, height: Value, scale: Value) -> (u32, u32) {
    let w = (width * scale).round().max(1.0) as u32;
    let h = (height * scale).round().max(1.0) as u32;
    (w, h)
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn should_centre_uv_on_viewport() {
        let res = Vector2D::new(200.0, 100.0);
        assert_abs_diff_eq!(pixel_to_uv(Vector2D::new(100.0, 50.0), res), Vector2D::zeros());
        assert_abs_diff_eq!(pixel_to_uv(Vector2D::new(200.0, 100.0), res), Vector2D::new(2.0, 1.0));
    }

    #[test]
    fn should_map_pixel_corners_to_ndc_corners() {
        let res = Vector2D::new(200.0, 100.0);
        assert_abs_diff_eq!(pixel_to_ndc(Vector2D::zeros(), res), Vector2D::new(-1.0, -1.0));
        assert_abs_diff_eq!(pixel_to_ndc(res, res), Vector2D::new(1.0, 1.0));
    }

    #[test]
    fn should_flip_client_y_into_ndc() {
        let viewport = Vector2D::new(800.0, 600.0);
        assert_abs_diff_eq!(
            client_to_ndc(Vector2D::new(400.0, 300.0), viewport).unwrap(),
            Vector2D::zeros()
        );
        assert_abs_diff_eq!(
            client_to_ndc(Vector2D::new(0.0, 0.0), viewport).unwrap(),
            Vector2D::new(-1.0, 1.0)
        );
        assert_abs_diff_eq!(
            client_to_ndc(Vector2D::new(1600.0, 600.0), viewport).unwrap(),
            Vector2D::new(1.0, -1.0)
        );
    }

    #[test]
    fn should_reject_empty_viewport() {
        assert!(client_to_ndc(Vector2D::new(1.0, 1.0), Vector2D::new(0.0, 600.0)).is_none());
    }

    #[test]
    fn should_number_rows_from_top() {
        assert_abs_diff_eq!(pixel_center(0, 0, 10), Vector2D::new(0.5, 9.5));
        assert_abs_diff_eq!(pixel_center(9, 3, 10), Vector2D::new(3.5, 0.5));
    }

    #[test]
    fn should_keep_at_least_one_pixel() {
        assert_eq!(scaled_extent(1280.0, 720.0, 0.25), (320, 180));
        assert_eq!(scaled_extent(1.0, 1.0, 0.1), (1, 1));
    }
}
