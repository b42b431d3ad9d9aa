//! Square roots through their periodic continued fractions.

use std::collections::HashMap;

use num_bigint::BigInt;
use num_integer::{Integer, Roots};
use num_traits::{Signed, Zero};
use tracing::debug;

use crate::error::{SpigotError, SpigotResult};
use crate::matrix::{Matrix, Point};
use crate::source::Source;

/// One `(m, d, a)` state of the square-root recurrence.
type Triple = (BigInt, BigInt, BigInt);

/// `sqrt(n)` as the continued fraction produced by the classical
/// recurrence
///
/// ```text
/// m' = d*a - m
/// d' = (n - m'^2) / d        (always exact)
/// a' = floor((isqrt(n) + m') / d')
/// ```
///
/// starting from `(0, 1, isqrt(n))`. The sequence of triples is eventually
/// periodic, so each triple is recorded once and the cycle is replayed as
/// soon as one repeats. A perfect square yields its root and then ends.
#[derive(Debug, Clone)]
pub struct RootSource {
    radicand: BigInt,
    a0: BigInt,
    perfect_square: bool,
    table: Vec<Triple>,
    seen: HashMap<Triple, usize>,
    resume: Option<usize>,
    position: usize,
}

impl RootSource {
    /// Create a source for the square root of a non-negative integer.
    pub fn new(radicand: BigInt) -> SpigotResult<Self> {
        if radicand.is_negative() {
            return Err(SpigotError::domain(
                "root",
                format!("radicand {} must be non-negative", radicand),
            ));
        }
        let a0 = radicand.sqrt();
        let perfect_square = &a0 * &a0 == radicand;
        let first: Triple = (BigInt::zero(), BigInt::from(1), a0.clone());

        let mut seen = HashMap::new();
        seen.insert(first.clone(), 0);

        Ok(Self {
            radicand,
            a0,
            perfect_square,
            table: vec![first],
            seen,
            resume: None,
            position: 0,
        })
    }

    /// Length of the repeating block, once it has been found.
    pub fn period(&self) -> Option<usize> {
        self.resume.map(|start| self.table.len() - start)
    }

    /// Whether the radicand is a perfect square.
    pub fn is_perfect_square(&self) -> bool {
        self.perfect_square
    }

    fn extend_table(&mut self) {
        let Some((m, d, a)) = self.table.last() else {
            return;
        };
        let m = d * a - m;
        let d = (&self.radicand - &m * &m) / d;
        let a = (&self.a0 + &m).div_floor(&d);
        let next = (m, d, a);

        if let Some(&start) = self.seen.get(&next) {
            debug!(
                radicand = %self.radicand,
                period = self.table.len() - start,
                "root_period_found"
            );
            self.resume = Some(start);
        } else {
            self.seen.insert(next.clone(), self.table.len());
            self.table.push(next);
        }
    }
}

impl Source for RootSource {
    fn name(&self) -> &'static str {
        "root"
    }

    fn bounds(&self) -> (Point, Point) {
        (Point::integer(0), Point::Infinity)
    }

    fn matrix(&mut self, _k: u64) -> SpigotResult<Matrix> {
        if self.perfect_square {
            if self.position == 0 {
                self.position = 1;
                return Ok(Matrix::new(self.a0.clone(), 1, 1, 0));
            }
            return Ok(Matrix::always_infinity());
        }

        if self.position >= self.table.len() && self.resume.is_none() {
            self.extend_table();
        }
        if self.position >= self.table.len() {
            if let Some(start) = self.resume {
                self.position = start;
            }
        }

        let term = self.table[self.position].2.clone();
        self.position += 1;
        Ok(Matrix::new(term, 1, 1, 0))
    }
}
