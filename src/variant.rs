use crate::{
    camera::CameraRig,
    composer::{SceneComposer, SceneDescription},
    error::{Result, ensure_finite},
    field::SceneField,
    march::{MarchConfig, MarchResult, march},
    shading::{
        NORMAL_EPSILON, ShadeContext, ShadeMode, ShadePipeline, ShadowConfig, estimate_normal,
        soft_shadow,
    },
    types::{Point, Rgba, Value, Vector2D},
    uniforms::{Uniforms, validate_resolution},
    utils::{pixel_to_ndc, pixel_to_uv},
};

/// Everything needed to build a [`SceneVariant`]: one visual "look".
#[derive(Clone, Debug)]
pub struct VariantConfig {
    /// Registry key; two variants with the same name cannot be registered together.
    pub name: String,
    pub scene: SceneDescription,
    pub camera: CameraRig,
    pub march: MarchConfig,
    /// Soft shadows towards `light`; `None` disables the secondary march.
    pub shadow: Option<ShadowConfig>,
    pub light: Point,
    pub shading: ShadePipeline,
    /// Initial output resolution in pixels.
    pub resolution: Vector2D,
}

impl VariantConfig {
    pub fn new(name: impl Into<String>, scene: SceneDescription) -> Self {
        Self {
            name: name.into(),
            scene,
            camera: CameraRig::default(),
            march: MarchConfig::default(),
            shadow: None,
            light: Point::new(2.0, 5.0, -3.0),
            shading: ShadePipeline::default(),
            resolution: Vector2D::new(320.0, 180.0),
        }
    }

    pub fn with_camera(mut self, camera: CameraRig) -> Self {
        self.camera = camera;
        self
    }

    pub fn with_march(mut self, march: MarchConfig) -> Self {
        self.march = march;
        self
    }

    pub fn with_shadow(mut self, shadow: ShadowConfig, light: Point) -> Self {
        self.shadow = Some(shadow);
        self.light = light;
        self
    }

    pub fn with_shading(mut self, shading: ShadePipeline) -> Self {
        self.shading = shading;
        self
    }

    pub fn with_resolution(mut self, width: Value, height: Value) -> Self {
        self.resolution = Vector2D::new(width, height);
        self
    }
}

/// A composed scene with its own uniforms, ready for per-pixel evaluation.
///
/// Cloning is cheap (the field graph is shared), which is how render tasks
/// take a frozen snapshot of a variant.
#[derive(Clone, Debug)]
pub struct SceneVariant {
    name: String,
    field: SceneField,
    camera: CameraRig,
    march: MarchConfig,
    shadow: Option<ShadowConfig>,
    light: Point,
    shading: ShadePipeline,
    uniforms: Uniforms,
}

/// Per-pixel intermediate values, mostly for inspection and tests.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PixelSample {
    pub result: MarchResult,
    pub shadow: Value,
    pub mode: ShadeMode,
    pub color: Rgba,
}

impl SceneVariant {
    /// Composes and validates `config`.
    ///
    /// Every malformed parameter is rejected here so [`evaluate`](Self::evaluate)
    /// never has to check anything.
    pub fn new(config: VariantConfig) -> Result<Self> {
        let field = SceneComposer::compose(&config.scene)?;
        config.camera.validate()?;
        config.march.validate()?;
        if let Some(shadow) = &config.shadow {
            shadow.validate()?;
        }
        for c in config.light.iter() {
            ensure_finite("variant.light", *c)?;
        }
        config.shading.validate()?;
        validate_resolution(config.resolution.x, config.resolution.y)?;

        if field.root().has_summed_fields() {
            tracing::debug!(
                variant = %config.name,
                "scene adds overlay fields; marched distances are approximate"
            );
        }

        Ok(Self {
            name: config.name,
            field,
            camera: config.camera,
            march: config.march,
            shadow: config.shadow,
            light: config.light,
            shading: config.shading,
            uniforms: Uniforms::new(config.resolution.x, config.resolution.y)?,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field(&self) -> &SceneField {
        &self.field
    }

    pub fn uniforms(&self) -> &Uniforms {
        &self.uniforms
    }

    pub fn march_config(&self) -> &MarchConfig {
        &self.march
    }

    /// Mutable uniforms; only the controller writes them.
    pub(crate) fn uniforms_mut(&mut self) -> &mut Uniforms {
        &mut self.uniforms
    }

    /// Colour of the pixel at `pixel` (pixel units, origin bottom-left).
    #[inline]
    pub fn evaluate(&self, pixel: Vector2D) -> Rgba {
        self.sample(pixel).color
    }

    /// Like [`evaluate`](Self::evaluate), also returning the intermediate values.
    pub fn sample(&self, pixel: Vector2D) -> PixelSample {
        let uniforms = &self.uniforms;
        let field_context = uniforms.field_context();
        let field = self.field.bind(&field_context);

        let uv = pixel_to_uv(pixel, uniforms.resolution);
        let ndc = pixel_to_ndc(pixel, uniforms.resolution);
        let ray = self.camera.ray(uv, uniforms.time);
        let result = march(&ray, &field, &self.march);

        let (normal, shadow) = if result.is_hit() {
            let normal = estimate_normal(&field, result.point, NORMAL_EPSILON);
            let shadow = match &self.shadow {
                Some(config) => soft_shadow(
                    &field,
                    result.point,
                    self.light,
                    config,
                    self.march.surface_epsilon,
                ),
                None => 1.0,
            };
            (Some(normal), shadow)
        } else {
            (None, 1.0)
        };

        let mode = ShadeMode::from_hovered(uniforms.hovered);
        let ctx = ShadeContext {
            result: &result,
            march: &self.march,
            ray: &ray,
            normal,
            shadow,
            uniforms,
            field: &self.field,
            field_context: &field_context,
            ndc,
            mode,
            focus_distance: mode.focus_distance(ndc, uniforms.pointer),
        };

        PixelSample {
            result,
            shadow,
            mode,
            color: self.shading.shade(&ctx),
        }
    }
}
