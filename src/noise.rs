//! Deterministic cell hashes and fractal gradient noise.
//!
//! Everything here is a pure function of its input: the same point always
//! produces the same bits, which keeps field evaluation reproducible across
//! frames and threads.

use bevy::math::{Vec2, Vec3};
use noiz::prelude::*;

use crate::{
    error::{Result, ensure_finite, ensure_positive},
    interp::fract,
    types::{Value, Vector, Vector2D},
};

const HASH_SCALE: Value = 43_758.547;

/// Hashes a scalar into `[0, 1)`.
#[inline]
pub fn hash11(n: Value) -> Value {
    fract(n.sin() * HASH_SCALE)
}

/// Hashes a 2D lattice coordinate into `[0, 1)`.
#[inline]
pub fn hash21(p: Vector2D) -> Value {
    hash11(p.dot(&Vector2D::new(127.1, 311.7)))
}

/// Hashes a 3D lattice coordinate into a vector in `[0, 1)³`.
#[inline]
pub fn hash33(p: Vector) -> Vector {
    Vector::new(
        hash11(p.dot(&Vector::new(127.1, 311.7, 74.7))),
        hash11(p.dot(&Vector::new(269.5, 183.3, 246.1))),
        hash11(p.dot(&Vector::new(113.5, 271.9, 124.6))),
    )
}

/// One octave of smoothed gradient noise, normalised to `[-1, 1]`.
type OctaveNoise = Noise<
    LayeredNoise<
        Normed<f32>,
        Persistence,
        Octave<MixCellGradients<OrthoGrid, Smoothstep, QuickGradients>>,
    >,
>;

// Shifts each octave off the shared lattice so octaves don't vanish together.
const OCTAVE_SHIFT: Value = 17.31;

/// Fractal sum of gradient-noise octaves.
///
/// A plain config record: the [`noiz`] octaves are built on demand, so the
/// record stays `Copy` and comparable.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Fbm {
    /// Number of summed octaves. Zero disables the field.
    pub octaves: u32,
    /// Frequency of the first octave.
    pub frequency: Value,
    /// Amplitude of the first octave.
    pub amplitude: Value,
    /// Frequency multiplier between octaves.
    pub lacunarity: Value,
    /// Amplitude multiplier between octaves.
    pub gain: Value,
}

impl Default for Fbm {
    fn default() -> Self {
        Self {
            octaves: 4,
            frequency: 0.5,
            amplitude: 0.5,
            lacunarity: 2.0,
            gain: 0.5,
        }
    }
}

impl Fbm {
    /// A field that always returns zero.
    pub const FLAT: Fbm = Fbm {
        octaves: 0,
        frequency: 1.0,
        amplitude: 0.0,
        lacunarity: 2.0,
        gain: 0.5,
    };

    pub fn with_octaves(mut self, octaves: u32) -> Self {
        self.octaves = octaves;
        self
    }

    pub fn with_frequency(mut self, frequency: Value) -> Self {
        self.frequency = frequency;
        self
    }

    pub fn with_amplitude(mut self, amplitude: Value) -> Self {
        self.amplitude = amplitude;
        self
    }

    /// Octave `i` with its frequency set, plus its lattice shift and amplitude.
    fn octave(&self, i: u32) -> (OctaveNoise, Value, Value) {
        let mut noise = OctaveNoise::default();
        noise.set_frequency(self.frequency * self.lacunarity.powi(i as i32));
        (noise, i as Value * OCTAVE_SHIFT, self.amplitude * self.gain.powi(i as i32))
    }

    /// Samples the 2D fractal field. Output is centred on zero and bounded by
    /// `±amplitude · (1 + gain + gain² + …)`.
    pub fn sample2(&self, p: Vector2D) -> Value {
        (0..self.octaves)
            .map(|i| {
                let (noise, shift, amplitude) = self.octave(i);
                let n: f32 = noise.sample_for(Vec2::new(p.x + shift, p.y - shift));
                amplitude * n.clamp(-1.0, 1.0)
            })
            .sum()
    }

    /// Samples the 3D fractal field, centred on zero like [`sample2`](Fbm::sample2).
    pub fn sample3(&self, p: Vector) -> Value {
        (0..self.octaves)
            .map(|i| {
                let (noise, shift, amplitude) = self.octave(i);
                let n: f32 = noise.sample_for(Vec3::new(p.x + shift, p.y - shift, p.z + shift));
                amplitude * n.clamp(-1.0, 1.0)
            })
            .sum()
    }

    /// Upper bound of `|sample2|` and `|sample3|`.
    pub fn bound(&self) -> Value {
        let mut total = 0.0;
        let mut amplitude = self.amplitude.abs();
        for _ in 0..self.octaves {
            total += amplitude;
            amplitude *= self.gain.abs();
        }
        total
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.octaves == 0 {
            return Ok(());
        }
        ensure_positive("fbm.frequency", self.frequency)?;
        ensure_positive("fbm.lacunarity", self.lacunarity)?;
        ensure_finite("fbm.amplitude", self.amplitude)?;
        ensure_finite("fbm.gain", self.gain)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn should_hash_into_unit_interval() {
        for i in -50..50 {
            let h = hash21(Vector2D::new(i as Value * 0.37, i as Value * -1.3));
            assert!((0.0..1.0).contains(&h), "{h}");
            let v = hash33(Vector::new(i as Value, 2.0, -3.0));
            assert!(v.iter().all(|c| (0.0..1.0).contains(c)));
        }
    }

    #[test]
    fn should_be_bit_reproducible() {
        let fbm = Fbm::default();
        let p = Vector::new(1.25, -7.5, 3.0);
        assert_eq!(fbm.sample3(p).to_bits(), fbm.sample3(p).to_bits());
        let q = Vector2D::new(-4.2, 9.1);
        assert_eq!(fbm.sample2(q).to_bits(), fbm.sample2(q).to_bits());
    }

    #[test]
    fn should_vary_across_space() {
        let fbm = Fbm::default();
        let samples: Vec<Value> = (0..32)
            .map(|i| fbm.sample2(Vector2D::new(i as Value * 0.71, i as Value * 0.29)))
            .collect();
        assert!(samples.iter().any(|s| s.abs() > 1e-3));
        assert!(samples.windows(2).any(|w| w[0] != w[1]));
    }

    #[test]
    fn should_scale_with_amplitude() {
        let p = Vector::new(0.37, 1.9, -2.6);
        let base = Fbm::default().with_amplitude(1.0).sample3(p);
        let doubled = Fbm::default().with_amplitude(2.0).sample3(p);
        assert!((doubled - 2.0 * base).abs() <= 1e-5);
    }

    #[test]
    fn should_stay_within_fbm_bound() {
        let fbm = Fbm::default().with_amplitude(1.5);
        let bound = fbm.bound();
        for i in 0..200 {
            let x = i as Value * 0.173;
            assert!(fbm.sample2(Vector2D::new(x, -x * 0.5)).abs() <= bound + 1e-4);
            assert!(fbm.sample3(Vector::new(x, 1.0, x * 0.25)).abs() <= bound + 1e-4);
        }
    }

    #[test]
    fn should_return_zero_for_flat_fbm() {
        assert_eq!(Fbm::FLAT.sample2(Vector2D::new(1.0, 2.0)), 0.0);
        assert_eq!(Fbm::FLAT.bound(), 0.0);
        assert!(Fbm::FLAT.validate().is_ok());
    }
}
