//! 2x2 integer matrices acting as Mobius transformations.
//!
//! A matrix `(p, q; r, s)` stands for the map `x -> (px + q) / (rx + s)`.
//! Composing maps is matrix multiplication, so a spigot can keep an entire
//! infinite composition as one running product.

use std::fmt;
use std::ops::Mul;

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};
use thiserror::Error;

/// A point on the extended real line: an exact rational, or infinity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Point {
    /// An exact rational value.
    Finite(BigRational),
    /// The point at infinity (sign-less).
    Infinity,
}

impl Point {
    /// A finite point at an integer.
    pub fn integer(n: impl Into<BigInt>) -> Self {
        Point::Finite(BigRational::from_integer(n.into()))
    }

    /// Floor of a finite point; `None` at infinity.
    pub fn floor(&self) -> Option<BigInt> {
        match self {
            Point::Finite(v) => Some(v.floor().to_integer()),
            Point::Infinity => None,
        }
    }

    /// Check if this is the point at infinity.
    pub fn is_infinite(&self) -> bool {
        matches!(self, Point::Infinity)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Point::Finite(v) => write!(f, "{}", v),
            Point::Infinity => write!(f, "inf"),
        }
    }
}

/// Raised when a finite input hits the pole of a transformation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MatrixError {
    /// The denominator `rx + s` is exactly zero.
    #[error("division undefined: denominator is zero")]
    DivisionUndefined,
}

/// The Mobius transformation `x -> (px + q) / (rx + s)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Matrix {
    pub p: BigInt,
    pub q: BigInt,
    pub r: BigInt,
    pub s: BigInt,
}

impl Matrix {
    /// Create a matrix from its four entries.
    pub fn new(
        p: impl Into<BigInt>,
        q: impl Into<BigInt>,
        r: impl Into<BigInt>,
        s: impl Into<BigInt>,
    ) -> Self {
        Self {
            p: p.into(),
            q: q.into(),
            r: r.into(),
            s: s.into(),
        }
    }

    /// The identity map `(1, 0; 0, 1)`.
    pub fn identity() -> Self {
        Self::new(1, 0, 0, 1)
    }

    /// The map sending every input to infinity, `(0, 1; 0, 0)`.
    ///
    /// Sources return this once their input is exhausted: folding it into
    /// a continued fraction `t + 1/x` leaves exactly `t`.
    pub fn always_infinity() -> Self {
        Self::new(0, 1, 0, 0)
    }

    /// Check whether the map sends every input to zero (`p = q = r = 0`).
    pub fn is_zero_map(&self) -> bool {
        self.p.is_zero() && self.q.is_zero() && self.r.is_zero()
    }

    /// Matrix product `self * rhs`, i.e. the map `x -> self(rhs(x))`.
    pub fn compose(&self, rhs: &Matrix) -> Matrix {
        Matrix {
            p: &self.p * &rhs.p + &self.q * &rhs.r,
            q: &self.p * &rhs.q + &self.q * &rhs.s,
            r: &self.r * &rhs.p + &self.s * &rhs.r,
            s: &self.r * &rhs.q + &self.s * &rhs.s,
        }
    }

    /// Evaluate the transformation at a point.
    ///
    /// At infinity the map tends to `p/r`; when both `p` and `r` are zero it
    /// is the constant `q/s`. Either quotient with a zero denominator
    /// (including `0/0`) is taken to be infinity. A finite input that lands
    /// on the pole is [`MatrixError::DivisionUndefined`].
    pub fn evaluate(&self, x: &Point) -> Result<Point, MatrixError> {
        match x {
            Point::Finite(v) => {
                let (u, w) = (v.numer(), v.denom());
                let num = &self.p * u + &self.q * w;
                let den = &self.r * u + &self.s * w;
                if den.is_zero() {
                    Err(MatrixError::DivisionUndefined)
                } else {
                    Ok(Point::Finite(BigRational::new(num, den)))
                }
            }
            Point::Infinity => {
                let (num, den) = if self.p.is_zero() && self.r.is_zero() {
                    (&self.q, &self.s)
                } else {
                    (&self.p, &self.r)
                };
                if den.is_zero() {
                    Ok(Point::Infinity)
                } else {
                    Ok(Point::Finite(BigRational::new(num.clone(), den.clone())))
                }
            }
        }
    }

    /// Integer part of the image of `x`, or `None` when it is undefined or
    /// infinite.
    pub fn floor_at(&self, x: &Point) -> Option<BigInt> {
        self.evaluate(x).ok().and_then(|v| v.floor())
    }

    /// Check whether the image of `x` is undefined or infinite.
    pub fn is_infinite_at(&self, x: &Point) -> bool {
        self.evaluate(x).map(|v| v.is_infinite()).unwrap_or(true)
    }

    /// Number of bits in the largest entry, for diagnostics.
    pub fn bits(&self) -> u64 {
        [&self.p, &self.q, &self.r, &self.s]
            .iter()
            .map(|v| v.abs().bits())
            .max()
            .unwrap_or(0)
    }

    /// Check if this is the identity map.
    pub fn is_identity(&self) -> bool {
        self.p.is_one() && self.q.is_zero() && self.r.is_zero() && self.s.is_one()
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Self::identity()
    }
}

impl Mul<&Matrix> for &Matrix {
    type Output = Matrix;

    fn mul(self, rhs: &Matrix) -> Matrix {
        self.compose(rhs)
    }
}

impl Mul for Matrix {
    type Output = Matrix;

    fn mul(self, rhs: Matrix) -> Matrix {
        self.compose(&rhs)
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}; {}, {})", self.p, self.q, self.r, self.s)
    }
}
