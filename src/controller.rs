//! Drives the animated uniforms of every registered variant.
//!
//! ```text
//!            tick(dt) ─────┐
//!  on_pointer_move(x, y) ──┤      ┌──────────────────┐      variant[0].uniforms
//!     on_pointer_leave() ──┼────▶ │  AnimationState  │ ───▶ variant[1].uniforms
//!       on_resize(w, h) ───┘      └──────────────────┘      …
//!                                      ▲
//!                                  Clock::elapsed_seconds
//! ```
//!
//! The controller is the only writer of [`Uniforms`](crate::uniforms::Uniforms);
//! variants never change their own.

use crate::{
    clock::{Clock, SystemClock},
    registry::{VariantId, VariantRegistry},
    types::{Value, Vector2D},
    uniforms::validate_resolution,
    utils::client_to_ndc,
    variant::SceneVariant,
};

/// Shared animation scalars, pointer and viewport.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnimationState {
    /// Clock reading at the last tick.
    pub elapsed: Value,
    /// Sum of all tick deltas.
    pub sine_time: Value,
    /// Pointer in normalized device coordinates.
    pub pointer: Vector2D,
    pub hovered: bool,
    /// Client-space size used to normalize pointer positions.
    pub viewport: Vector2D,
    pub ticks: u64,
}

impl Default for AnimationState {
    fn default() -> Self {
        Self {
            elapsed: 0.0,
            sine_time: 0.0,
            pointer: Vector2D::zeros(),
            hovered: false,
            viewport: Vector2D::new(1.0, 1.0),
            ticks: 0,
        }
    }
}

impl AnimationState {
    /// `st · sin(0.001 + st)`
    pub fn shape_factor(&self) -> Value {
        self.sine_time * (0.001 + self.sine_time).sin()
    }

    /// `0.5·sin(st) + 0.5 + cos(0.1 + st)`, shared by the sine-time and
    /// explode-intensity uniforms on tick.
    pub fn oscillation(&self) -> Value {
        0.5 * self.sine_time.sin() + 0.5 + (0.1 + self.sine_time).cos()
    }
}

/// Owns the [`AnimationState`] and the [`VariantRegistry`] it animates.
#[derive(Debug)]
pub struct UniformController<C: Clock = SystemClock> {
    state: AnimationState,
    registry: VariantRegistry,
    clock: C,
    disposed: bool,
}

impl UniformController<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock::new())
    }
}

impl Default for UniformController<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> UniformController<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            state: AnimationState::default(),
            registry: VariantRegistry::new(),
            clock,
            disposed: false,
        }
    }

    pub fn state(&self) -> &AnimationState {
        &self.state
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn variants(&self) -> &VariantRegistry {
        &self.registry
    }

    pub fn variant(&self, id: VariantId) -> Option<&SceneVariant> {
        self.registry.get(id)
    }

    /// Adds `variant` and syncs it with the current animation state.
    ///
    /// Registering a name twice returns the first id and leaves the registry
    /// unchanged. Returns `None` after [`dispose`](Self::dispose).
    pub fn register_variant(&mut self, variant: SceneVariant) -> Option<VariantId> {
        if self.disposed {
            tracing::debug!(variant = variant.name(), "register after dispose ignored");
            return None;
        }

        let (id, added) = self.registry.register(variant);
        if !added {
            tracing::debug!(?id, "variant already registered");
            return Some(id);
        }

        let state = self.state;
        if let Some(variant) = self.registry.get_mut(id) {
            let uniforms = variant.uniforms_mut();
            uniforms.time = state.elapsed;
            uniforms.sine_time = state.oscillation();
            uniforms.shape_factor = state.shape_factor();
            uniforms.explode_intensity = state.oscillation();
            uniforms.hovered = state.hovered;
            uniforms.pointer = state.pointer;
            tracing::debug!(?id, variant = variant.name(), "registered variant");
        }
        Some(id)
    }

    /// Removes the variant behind `id`; stale or unknown ids are ignored.
    pub fn unregister_variant(&mut self, id: VariantId) -> Option<SceneVariant> {
        let removed = self.registry.unregister(id);
        match &removed {
            Some(variant) => tracing::debug!(?id, variant = variant.name(), "unregistered variant"),
            None => tracing::debug!(?id, "unregister of unknown variant ignored"),
        }
        removed
    }

    /// Advances the animation by `dt` seconds and pushes the new scalars into
    /// every variant.
    ///
    /// Non-finite deltas are ignored and negative ones count as zero, so sine
    /// time never runs backwards.
    pub fn tick(&mut self, dt: Value) {
        if self.disposed {
            tracing::trace!("tick after dispose ignored");
            return;
        }
        if !dt.is_finite() {
            tracing::warn!(dt, "ignoring non-finite tick delta");
            return;
        }

        self.state.sine_time += dt.max(0.0);
        self.state.elapsed = self.clock.elapsed_seconds();
        self.state.ticks += 1;

        let state = self.state;
        let shape_factor = state.shape_factor();
        let oscillation = state.oscillation();
        for (_, variant) in self.registry.iter_mut() {
            let uniforms = variant.uniforms_mut();
            uniforms.time = state.elapsed;
            uniforms.shape_factor = shape_factor;
            uniforms.sine_time = oscillation;
            uniforms.explode_intensity = oscillation;
        }
    }

    /// Pointer moved to client coordinates `(x, y)` (origin top-left) inside
    /// the current viewport.
    pub fn on_pointer_move(&mut self, x: Value, y: Value) {
        match client_to_ndc(Vector2D::new(x, y), self.state.viewport) {
            Some(ndc) => self.on_pointer_move_ndc(ndc),
            None => tracing::debug!(x, y, "pointer move outside a usable viewport ignored"),
        }
    }

    /// Pointer moved to `ndc`, already normalized to `[-1, 1]²` with `y` up.
    ///
    /// Every variant's explode intensity becomes `sin(explode + time)` and its
    /// shape factor grows by `time · sin(0.001 + time)`.
    pub fn on_pointer_move_ndc(&mut self, ndc: Vector2D) {
        if self.disposed {
            return;
        }
        if !ndc.iter().all(|c| c.is_finite()) {
            tracing::debug!(?ndc, "non-finite pointer position ignored");
            return;
        }

        let pointer = ndc.map(|c| c.clamp(-1.0, 1.0));
        self.state.pointer = pointer;
        self.state.hovered = true;

        for (_, variant) in self.registry.iter_mut() {
            let uniforms = variant.uniforms_mut();
            let time = uniforms.time;
            uniforms.hovered = true;
            uniforms.pointer = pointer;
            uniforms.explode_intensity = (uniforms.explode_intensity + time).sin();
            uniforms.shape_factor += time * (0.001 + time).sin();
        }
    }

    /// Pointer left the view. Repeated calls change nothing.
    pub fn on_pointer_leave(&mut self) {
        if self.disposed {
            return;
        }
        self.state.hovered = false;
        for (_, variant) in self.registry.iter_mut() {
            variant.uniforms_mut().hovered = false;
        }
    }

    /// Viewport resized to `width × height` pixels.
    ///
    /// Only the resolution uniform and the pointer viewport change; invalid
    /// sizes (zero, negative, non-finite) are ignored.
    pub fn on_resize(&mut self, width: Value, height: Value) {
        if self.disposed {
            return;
        }
        if let Err(err) = validate_resolution(width, height) {
            tracing::debug!(%err, "resize ignored");
            return;
        }

        let resolution = Vector2D::new(width, height);
        self.state.viewport = resolution;
        for (_, variant) in self.registry.iter_mut() {
            variant.uniforms_mut().resolution = resolution;
        }
    }

    /// Releases every variant. The controller ignores all later calls.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        tracing::debug!(variants = self.registry.len(), "disposing uniform controller");
        self.registry.clear();
        self.disposed = true;
    }
}
