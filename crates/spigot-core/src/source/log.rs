//! Natural logarithms of positive rationals.
//!
//! `log(1 + x)` for `|x| <= 1/2` is the series
//!
//! ```text
//! log(1 + x) = x * (1 - x * (1/2 - x * (1/3 - x * (1/4 - ...))))
//! ```
//!
//! i.e. `x * f1(f2(f3(...)))` with `f_k(t) = 1/k - x*t`. Any other positive
//! rational is first scaled by a power of two into `[3/4, 3/2)` and the
//! power is added back as a multiple of `log 2` with a bilinear combinator.

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};
use tracing::debug;

use crate::error::{SpigotError, SpigotResult};
use crate::gosper::{Gosper, GosperSource};
use crate::matrix::{Matrix, Point};
use crate::source::Source;
use crate::spigot::Spigot;

/// `scale * log(1 + a/b)` for `|a/b| <= 1/2`.
///
/// With `x = a/b`, `f_k` is `(-a*k, b; 0, b*k)` and maps `[-1, 2]` into
/// itself because `|x| <= 1/2`. The first matrix also carries the leading
/// factor `scale * x`: `(-scale*a^2, scale*a*b; 0, b^2)`.
#[derive(Debug, Clone)]
pub struct LogSeriesSource {
    a: BigInt,
    b: BigInt,
    scale: BigInt,
}

impl LogSeriesSource {
    /// Series for `scale * log(1 + a/b)`. Requires `b > 0` and `2|a| <= b`.
    pub fn new(a: BigInt, b: BigInt, scale: BigInt) -> SpigotResult<Self> {
        if !b.is_positive() || BigInt::from(2) * a.abs() > b {
            return Err(SpigotError::domain(
                "log",
                format!("series argument {}/{} is outside [-1/2, 1/2]", a, b),
            ));
        }
        Ok(Self { a, b, scale })
    }

    /// `scale * log 2`, computed as `-scale * log(1 - 1/2)`.
    pub fn log2(scale: BigInt) -> Self {
        Self {
            a: BigInt::from(-1),
            b: BigInt::from(2),
            scale: -scale,
        }
    }
}

impl Source for LogSeriesSource {
    fn name(&self) -> &'static str {
        "log"
    }

    fn bounds(&self) -> (Point, Point) {
        (Point::integer(-1), Point::integer(2))
    }

    fn matrix(&mut self, k: u64) -> SpigotResult<Matrix> {
        Ok(if k == 1 {
            Matrix::new(
                -(&self.scale * &self.a * &self.a),
                &self.scale * &self.a * &self.b,
                0,
                &self.b * &self.b,
            )
        } else {
            Matrix::new(-(&self.a * k), self.b.clone(), 0, &self.b * k)
        })
    }
}

/// A spigot for `log(value)`, `value > 0`.
pub fn log_spigot(value: &BigRational) -> SpigotResult<Spigot> {
    if !value.is_positive() {
        return Err(SpigotError::domain(
            "log",
            format!("argument {} must be positive", value),
        ));
    }

    let two = BigRational::from_integer(BigInt::from(2));
    let upper = BigRational::new(BigInt::from(3), BigInt::from(2));
    let lower = BigRational::new(BigInt::from(3), BigInt::from(4));

    let mut reduced = value.clone();
    let mut exponent = 0i64;
    while reduced >= upper {
        reduced /= &two;
        exponent += 1;
    }
    while reduced < lower {
        reduced *= &two;
        exponent -= 1;
    }

    let x = reduced - BigRational::one();
    debug!(value = %value, exponent, remainder = %x, "log_reduced");

    if exponent == 0 {
        return Spigot::from_source(LogSeriesSource::new(
            x.numer().clone(),
            x.denom().clone(),
            BigInt::one(),
        )?);
    }
    if x.is_zero() {
        return Spigot::from_source(LogSeriesSource::log2(BigInt::from(exponent)));
    }

    let series = Spigot::from_source(LogSeriesSource::new(
        x.numer().clone(),
        x.denom().clone(),
        BigInt::one(),
    )?)?;
    let log2 = Spigot::from_source(LogSeriesSource::log2(BigInt::one()))?;
    // x + exponent * y
    let gosper = Gosper::bilinear([0, 1, exponent, 0, 0, 0, 0, 1], series, Some(log2));
    Spigot::from_source(GosperSource::new(gosper))
}

fn height(v: &BigRational) -> u64 {
    v.numer().bits().max(v.denom().bits())
}

/// `log(value) / log(base)` when it is rational, found exactly.
///
/// The quotient is rational only when both arguments are powers of one
/// rational `r`, and then the Euclidean algorithm on the exponents
/// (`log_b x = k + 1 / log_{x/b^k} b`) only ever meets smaller powers of
/// `r`. A remainder taller than both arguments therefore proves the
/// quotient irrational. Requires `base > 0`, `base != 1` and `value > 0`.
pub fn exact_log_ratio(base: &BigRational, value: &BigRational) -> Option<BigRational> {
    if !base.is_positive() || !value.is_positive() || base.is_one() {
        return None;
    }
    let one = BigRational::one();
    let (mut base, mut value) = (base.clone(), value.clone());
    let mut negative = false;
    if base < one {
        base = base.recip();
        negative = !negative;
    }
    if value < one {
        value = value.recip();
        negative = !negative;
    }
    let limit = height(&base).max(height(&value));

    let mut terms: Vec<BigInt> = Vec::new();
    loop {
        let mut k = BigInt::zero();
        let mut power = one.clone();
        loop {
            let next = &power * &base;
            if next > value {
                break;
            }
            power = next;
            k += 1;
        }
        terms.push(k);
        if power == value {
            break;
        }
        let rest = &value / &power;
        if height(&rest) > limit {
            return None;
        }
        value = std::mem::replace(&mut base, rest);
    }

    // every term after the first is at least 1
    let mut terms = terms.into_iter().rev();
    let last = BigRational::from_integer(terms.next()?);
    let ratio = terms.fold(last, |acc, t| BigRational::from_integer(t) + acc.recip());
    debug!(ratio = %ratio, "log_ratio_exact");
    Some(if negative { -ratio } else { ratio })
}
