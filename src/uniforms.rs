use crate::{
    error::{BackdropError, Result},
    field::FieldContext,
    types::{Value, Vector2D},
};

/// Per-frame parameters of a scene variant.
///
/// Written only by the [`UniformController`](crate::controller::UniformController);
/// everything else gets read access.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Uniforms {
    /// Elapsed seconds of the controller's clock.
    pub time: Value,
    /// `0.5·sin(s) + 0.5 + cos(0.1 + s)` of the accumulated sine time `s`.
    pub sine_time: Value,
    /// Shape-blend factor deepening creature outlines.
    pub shape_factor: Value,
    pub explode_intensity: Value,
    /// Whether the pointer is over the view; selects the shading mode.
    pub hovered: bool,
    /// Pointer in normalized device coordinates, `[-1, 1]²`, `y` up.
    pub pointer: Vector2D,
    /// Output resolution in pixels.
    pub resolution: Vector2D,
}

impl Default for Uniforms {
    fn default() -> Self {
        Self {
            time: 0.0,
            sine_time: 0.0,
            shape_factor: 0.0,
            explode_intensity: 0.0,
            hovered: false,
            pointer: Vector2D::zeros(),
            resolution: Vector2D::new(1.0, 1.0),
        }
    }
}

impl Uniforms {
    /// Fresh uniforms for an output of `width × height` pixels.
    pub fn new(width: Value, height: Value) -> Result<Self> {
        validate_resolution(width, height)?;
        Ok(Self {
            resolution: Vector2D::new(width, height),
            ..Default::default()
        })
    }

    /// Width over height.
    pub fn aspect(&self) -> Value {
        self.resolution.x / self.resolution.y
    }

    /// The subset of uniforms the distance field reads.
    pub fn field_context(&self) -> FieldContext {
        FieldContext {
            time: self.time,
            sine_time: self.sine_time,
            shape_factor: self.shape_factor,
            explode_intensity: self.explode_intensity,
        }
    }
}

pub(crate) fn validate_resolution(width: Value, height: Value) -> Result<()> {
    if width.is_finite() && height.is_finite() && width >= 1.0 && height >= 1.0 {
        Ok(())
    } else {
        Err(BackdropError::InvalidResolution { width, height })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn should_validate_resolution() {
        assert!(Uniforms::new(640.0, 480.0).is_ok());
        assert_eq!(
            Uniforms::new(0.0, 480.0),
            Err(BackdropError::InvalidResolution {
                width: 0.0,
                height: 480.0
            })
        );
        assert!(Uniforms::new(640.0, Value::NAN).is_err());
    }

    #[test]
    fn should_copy_animated_values_into_field_context() {
        let uniforms = Uniforms {
            time: 1.0,
            sine_time: 2.0,
            shape_factor: 3.0,
            explode_intensity: 4.0,
            ..Default::default()
        };
        let ctx = uniforms.field_context();
        assert_eq!(
            (ctx.time, ctx.sine_time, ctx.shape_factor, ctx.explode_intensity),
            (1.0, 2.0, 3.0, 4.0)
        );
    }
}
