use std::fmt;

use crate::matrix::Matrix;

/// Approximate-equality policy for comparing two results.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Tolerance {
    /// `|a - b| < eps` regardless of magnitude.
    Absolute(f32),
    /// `|a - b| < eps * max(1, |a|, |b|)`.
    Relative(f32),
}

impl Default for Tolerance {
    fn default() -> Self {
        Tolerance::Relative(f32::EPSILON)
    }
}

impl Tolerance {
    /// Largest difference still considered equal for values of this size.
    pub fn bound(self, a: f32, b: f32) -> f32 {
        match self {
            Tolerance::Absolute(eps) => eps,
            Tolerance::Relative(eps) => eps * a.abs().max(b.abs()).max(1.0),
        }
    }
}

/// Outcome of comparing two matrices element by element.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Match,
    /// First disagreeing element in row-major order.
    Mismatch { row: usize, col: usize, expected: f32, actual: f32 },
    ShapeMismatch { expected: (usize, usize), actual: (usize, usize) },
}

impl Verdict {
    pub fn is_match(&self) -> bool {
        matches!(self, Verdict::Match)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Match => write!(f, "Results match."),
            Verdict::Mismatch { .. } | Verdict::ShapeMismatch { .. } => write!(f, "Results mismatch!"),
        }
    }
}

pub fn values_same(a: f32, b: f32, tolerance: Tolerance) -> bool {
    (a - b).abs() < tolerance.bound(a, b)
}

/// Compares `actual` against `expected` and reports the first difference.
pub fn verify_results(expected: &Matrix, actual: &Matrix, tolerance: Tolerance) -> Verdict {
    if expected.shape() != actual.shape() {
        return Verdict::ShapeMismatch { expected: expected.shape(), actual: actual.shape() };
    }
    let cols = expected.cols().max(1);
    let first = expected
        .as_slice()
        .iter()
        .zip(actual.as_slice())
        .position(|(&e, &a)| !values_same(e, a, tolerance));

    match first {
        None => Verdict::Match,
        Some(idx) => {
            let verdict = Verdict::Mismatch {
                row: idx / cols,
                col: idx % cols,
                expected: expected.as_slice()[idx],
                actual: actual.as_slice()[idx],
            };
            log::warn!("First difference: {:?}", verdict);
            verdict
        }
    }
}
