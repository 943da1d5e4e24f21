use bevy::prelude::*;

use crate::{
    error::Result,
    frame::Frame,
    presets::preset,
    registry::VariantId,
    variant::VariantConfig,
};

/// An animated scene rendered into an [`Image`] every frame.
///
/// Spawn it on a UI node; the plugin registers the scene with the
/// [`BackdropController`](crate::plugin::BackdropController), creates the image
/// and inserts an [`ImageNode`] showing it:
///
/// ```rust,ignore
/// commands.spawn((
///     Backdrop::from_preset("deep_sea")?,
///     Node { width: percent(100), height: percent(100), ..default() },
/// ));
/// ```
#[derive(Component, Debug)]
pub struct Backdrop {
    /// Look of the backdrop. Read once, when the backdrop is added.
    pub config: VariantConfig,
    /// Skip re-rendering while `false`; the last frame stays on screen.
    pub animate: bool,
    pub(crate) variant: Option<VariantId>,
    pub(crate) image: Option<Handle<Image>>,
    pub(crate) frames: u64,
}

impl Backdrop {
    pub fn new(config: VariantConfig) -> Self {
        Self {
            config,
            animate: true,
            variant: None,
            image: None,
            frames: 0,
        }
    }

    /// Backdrop showing one of the [`presets`](crate::presets).
    pub fn from_preset(name: &str) -> Result<Self> {
        preset(name).map(Self::new)
    }

    /// Renders a single frame, then holds it.
    pub fn with_animate(mut self, animate: bool) -> Self {
        self.animate = animate;
        self
    }

    /// Controller handle of the scene, once registered.
    pub fn variant(&self) -> Option<VariantId> {
        self.variant
    }

    /// Image the frames are uploaded to, once created.
    pub fn image(&self) -> Option<&Handle<Image>> {
        self.image.as_ref()
    }

    /// Number of frames uploaded so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

/// A finished CPU render waiting for upload.
///
/// Inserted by [`BackdropSet::Generate`](crate::plugin::BackdropSet::Generate)
/// and removed by [`BackdropSet::Upload`](crate::plugin::BackdropSet::Upload);
/// systems ordered between the two can post-process the pixels.
#[derive(Component, Debug)]
pub struct RenderedFrame(pub Frame);

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::BackdropError;

    #[test]
    fn should_start_unregistered() {
        let backdrop = Backdrop::from_preset("meadow").unwrap();
        assert!(backdrop.variant().is_none());
        assert!(backdrop.image().is_none());
        assert!(backdrop.animate);
        assert_eq!(backdrop.frames(), 0);
    }

    #[test]
    fn should_reject_unknown_preset() {
        assert_eq!(
            Backdrop::from_preset("nope").unwrap_err(),
            BackdropError::UnknownPreset("nope".to_owned())
        );
    }

    #[test]
    fn should_hold_still_when_not_animated() {
        let backdrop = Backdrop::from_preset("forge").unwrap().with_animate(false);
        assert!(!backdrop.animate);
    }
}
