//! Exact rational constants.

use num_rational::BigRational;

use crate::error::SpigotResult;
use crate::matrix::{Matrix, Point};
use crate::source::Source;

/// The rational `n/d` as the constant map `x -> n/d`.
///
/// The bracket is `[floor(n/d), ceil(n/d)]`. The single matrix is primed
/// so that the running product is a constant map from the start; for an
/// integer-valued fraction the bracket is degenerate and would otherwise
/// never ask the source for anything, leaving base output unable to see
/// that the expansion has terminated.
#[derive(Debug, Clone)]
pub struct FracSource {
    value: BigRational,
}

impl FracSource {
    /// Create a source for the given rational.
    pub fn new(value: BigRational) -> Self {
        Self { value }
    }

    /// The rational this source produces.
    pub fn value(&self) -> &BigRational {
        &self.value
    }
}

impl Source for FracSource {
    fn name(&self) -> &'static str {
        "frac"
    }

    fn bounds(&self) -> (Point, Point) {
        (
            Point::integer(self.value.floor().to_integer()),
            Point::integer(self.value.ceil().to_integer()),
        )
    }

    fn priming_steps(&self) -> u64 {
        1
    }

    fn matrix(&mut self, _k: u64) -> SpigotResult<Matrix> {
        Ok(Matrix::new(
            0,
            self.value.numer().clone(),
            0,
            self.value.denom().clone(),
        ))
    }
}
