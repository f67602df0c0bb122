use serde::{Deserialize, Serialize};

use crate::complex::Complex;
use crate::error::CoreError;

/// Parameters governing what the remote renderer computes.
///
/// Orthogonal to the [`Viewport`](crate::Viewport): panning and zooming
/// change which tiles are visible, while a change to any field here
/// changes pixel *content* and therefore invalidates every cached tile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FractalParams {
    /// The defining constant of the Julia set being explored.
    pub c: Complex,

    /// Maximum iteration count before a point is declared interior.
    pub max_iterations: u32,

    /// Index of the coloring function applied by the remote renderer.
    pub coloring: u32,

    /// The finest level of detail the client requests. Lower is finer;
    /// 1 is full detail. The scheduler derives the coarse preview tier
    /// from this.
    pub lod: u32,
}

impl FractalParams {
    pub const DEFAULT_MAX_ITERATIONS: u32 = 256;

    /// The classic dendrite-adjacent constant, a pleasant starting view.
    pub const DEFAULT_C: Complex = Complex {
        re: -0.8,
        im: 0.156,
    };

    pub fn new(c: Complex, max_iterations: u32, coloring: u32, lod: u32) -> crate::Result<Self> {
        if max_iterations < 1 {
            return Err(CoreError::InvalidMaxIterations(max_iterations));
        }
        if lod < 1 {
            return Err(CoreError::InvalidLod(lod));
        }
        Ok(Self {
            c,
            max_iterations,
            coloring,
            lod,
        })
    }

    /// Return a copy with a different `max_iterations` value.
    pub fn with_max_iterations(self, max_iterations: u32) -> Self {
        Self {
            max_iterations,
            ..self
        }
    }

    /// Return a copy with a different level of detail.
    pub fn with_lod(self, lod: u32) -> Self {
        Self { lod, ..self }
    }
}

impl Default for FractalParams {
    fn default() -> Self {
        Self {
            c: Self::DEFAULT_C,
            max_iterations: Self::DEFAULT_MAX_ITERATIONS,
            coloring: 0,
            lod: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_params() {
        let p = FractalParams::default();
        assert_eq!(p.max_iterations, 256);
        assert_eq!(p.lod, 1);
        assert_eq!(p.coloring, 0);
    }

    #[test]
    fn valid_params() {
        let p = FractalParams::new(Complex::new(0.285, 0.01), 1000, 2, 1).unwrap();
        assert_eq!(p.max_iterations, 1000);
        assert_eq!(p.coloring, 2);
    }

    #[test]
    fn invalid_max_iterations() {
        assert!(FractalParams::new(Complex::ZERO, 0, 0, 1).is_err());
    }

    #[test]
    fn invalid_lod() {
        assert!(FractalParams::new(Complex::ZERO, 256, 0, 0).is_err());
    }

    #[test]
    fn serde_round_trip() {
        let p = FractalParams::default().with_max_iterations(512);
        let json = serde_json::to_string(&p).unwrap();
        let back: FractalParams = serde_json::from_str(&json).unwrap();
        assert_eq!(p, back);
    }
}
