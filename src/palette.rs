use std::f32::consts::TAU;

use crate::types::{Value, Vector};

/// Procedural gradient `a + b·cos(2π·(c·t + d))`, evaluated per channel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CosinePalette {
    pub a: [Value; 3],
    pub b: [Value; 3],
    pub c: [Value; 3],
    pub d: [Value; 3],
}

impl CosinePalette {
    pub const RAINBOW: CosinePalette = CosinePalette {
        a: [0.5, 0.5, 0.5],
        b: [0.5, 0.5, 0.5],
        c: [1.0, 1.0, 1.0],
        d: [0.0, 0.33, 0.67],
    };

    pub const SUNSET: CosinePalette = CosinePalette {
        a: [0.5, 0.5, 0.5],
        b: [0.5, 0.5, 0.5],
        c: [1.0, 1.0, 0.5],
        d: [0.8, 0.9, 0.3],
    };

    pub const DEEP_SEA: CosinePalette = CosinePalette {
        a: [0.2, 0.4, 0.5],
        b: [0.2, 0.3, 0.4],
        c: [1.0, 1.0, 1.0],
        d: [0.0, 0.1, 0.2],
    };

    pub const EMBER: CosinePalette = CosinePalette {
        a: [0.6, 0.3, 0.2],
        b: [0.4, 0.3, 0.2],
        c: [1.0, 0.7, 0.4],
        d: [0.0, 0.15, 0.2],
    };

    pub const MOSS: CosinePalette = CosinePalette {
        a: [0.4, 0.5, 0.3],
        b: [0.3, 0.3, 0.2],
        c: [1.0, 1.0, 1.0],
        d: [0.1, 0.2, 0.4],
    };

    /// Colour at `t`; the palette repeats with period `1 / c` per channel.
    #[inline]
    pub fn color(&self, t: Value) -> Vector {
        Vector::from_fn(|i, _| self.a[i] + self.b[i] * (TAU * (self.c[i] * t + self.d[i])).cos())
    }

    pub(crate) fn is_finite(&self) -> bool {
        [self.a, self.b, self.c, self.d]
            .iter()
            .flatten()
            .all(|v| v.is_finite())
    }
}
