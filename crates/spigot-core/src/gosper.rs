//! Gosper's bihomographic arithmetic on continued fractions.
//!
//! Two spigots `x` and `y`, read as continued fraction terms, are combined
//! into
//!
//! ```text
//!       a*x*y + b*x + c*y + d
//! z = -------------------------
//!       e*x*y + f*x + g*y + h
//! ```
//!
//! and `z` is produced as continued fraction terms in turn. Addition,
//! subtraction, multiplication and division are particular choices of the
//! eight coefficients; a missing `y` gives the homographic case (`1/x`).
//!
//! Each operand term `t` substitutes `x = t + 1/x'`. Once an operand has
//! given its first term, its remainder `x'` lies in `(1, inf]`, so `z` lies
//! between the four corner ratios `a/e`, `b/f`, `c/g`, `d/h` whenever their
//! denominators share a sign. When all corners have the same integer part,
//! that integer is the next output term.

use std::fmt;

use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{Signed, Zero};
use tracing::{debug, trace};

use crate::error::SpigotResult;
use crate::matrix::{Matrix, Point};
use crate::source::Source;
use crate::spigot::{Extraction, Pull, Spigot};

/// The four binary arithmetic operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Add,
    Sub,
    Mul,
    Div,
}

impl Operator {
    /// All operators, in registry order.
    pub const ALL: [Operator; 4] = [Operator::Add, Operator::Sub, Operator::Mul, Operator::Div];

    /// Expression keyword.
    pub fn name(&self) -> &'static str {
        match self {
            Operator::Add => "add",
            Operator::Sub => "sub",
            Operator::Mul => "mul",
            Operator::Div => "div",
        }
    }

    /// Coefficients `(a, b, c, d, e, f, g, h)` of the operator.
    pub fn coefficients(&self) -> [i64; 8] {
        match self {
            Operator::Add => [0, 1, 1, 0, 0, 0, 0, 1],
            Operator::Sub => [0, 1, -1, 0, 0, 0, 0, 1],
            Operator::Mul => [1, 0, 0, 0, 0, 0, 0, 1],
            Operator::Div => [0, 1, 0, 0, 0, 0, 1, 0],
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One input of the combinator.
struct Operand {
    spigot: Option<Spigot>,
    primed: bool,
    exhausted: bool,
}

impl Operand {
    fn live(spigot: Spigot) -> Self {
        Self {
            spigot: Some(spigot),
            primed: false,
            exhausted: false,
        }
    }

    fn absent() -> Self {
        Self {
            spigot: None,
            primed: true,
            exhausted: true,
        }
    }

    /// Next continued fraction term, or `None` once the operand has ended.
    fn pull(&mut self) -> SpigotResult<Option<BigInt>> {
        self.primed = true;
        if self.exhausted {
            return Ok(None);
        }
        let pulled = match self.spigot.as_mut() {
            Some(spigot) => spigot.pull_digit(Extraction::ContinuedFraction, false)?,
            None => Pull::Exhausted,
        };
        match pulled {
            Pull::Digit(t) => Ok(Some(t)),
            Pull::Exhausted => {
                self.exhausted = true;
                Ok(None)
            }
        }
    }
}

/// Bihomographic combinator over two continued fraction streams.
pub struct Gosper {
    a: BigInt,
    b: BigInt,
    c: BigInt,
    d: BigInt,
    e: BigInt,
    f: BigInt,
    g: BigInt,
    h: BigInt,
    x: Operand,
    y: Operand,
    terms: u64,
}

impl Gosper {
    /// General bilinear form `z(x, y)`. Without `y` only the coefficients
    /// `b, d, f, h` matter and `z = (bx + d) / (fx + h)`.
    pub fn bilinear<T: Into<BigInt>>(coefficients: [T; 8], x: Spigot, y: Option<Spigot>) -> Self {
        let [a, b, c, d, e, f, g, h]: [BigInt; 8] = coefficients.map(Into::into);
        Self {
            a,
            b,
            c,
            d,
            e,
            f,
            g,
            h,
            x: Operand::live(x),
            y: y.map(Operand::live).unwrap_or_else(Operand::absent),
            terms: 0,
        }
    }

    /// `op(x, y)` for one of the four arithmetic operators.
    pub fn binary(op: Operator, x: Spigot, y: Spigot) -> Self {
        debug!(op = op.name(), x = x.source_name(), y = y.source_name(), "gosper_created");
        Self::bilinear(op.coefficients(), x, Some(y))
    }

    pub fn add(x: Spigot, y: Spigot) -> Self {
        Self::binary(Operator::Add, x, y)
    }

    pub fn sub(x: Spigot, y: Spigot) -> Self {
        Self::binary(Operator::Sub, x, y)
    }

    pub fn mul(x: Spigot, y: Spigot) -> Self {
        Self::binary(Operator::Mul, x, y)
    }

    pub fn div(x: Spigot, y: Spigot) -> Self {
        Self::binary(Operator::Div, x, y)
    }

    /// `1/x`.
    pub fn reciprocal(x: Spigot) -> Self {
        Self::bilinear([0, 0, 0, 1, 0, 1, 0, 0], x, None)
    }

    /// Number of output terms produced so far.
    pub fn terms(&self) -> u64 {
        self.terms
    }

    /// Produce the next continued fraction term of `z`, or `None` once `z`
    /// has been fully expanded.
    pub fn step(&mut self) -> SpigotResult<Option<BigInt>> {
        loop {
            if self.e.is_zero() && self.f.is_zero() && self.g.is_zero() && self.h.is_zero() {
                debug!(terms = self.terms, "gosper_exhausted");
                return Ok(None);
            }
            if !self.x.primed {
                self.getx()?;
                continue;
            }
            if !self.y.primed {
                self.gety()?;
                continue;
            }

            if let Some(t) = self.agreed_term() {
                self.output_term(&t);
                self.terms += 1;
                trace!(term = %t, terms = self.terms, "gosper_term");
                return Ok(Some(t));
            }

            match (self.x.exhausted, self.y.exhausted) {
                (false, true) => self.getx()?,
                (true, false) => self.gety()?,
                (false, false) => {
                    let ae = corner(&self.a, &self.e);
                    let bf = corner(&self.b, &self.f);
                    let cg = corner(&self.c, &self.g);
                    let dh = corner(&self.d, &self.h);
                    let pull_x = differs(&ae, &cg) || differs(&bf, &dh);
                    let pull_y = differs(&ae, &bf) || differs(&cg, &dh);
                    if pull_x || !pull_y {
                        self.getx()?;
                    }
                    if pull_y || !pull_x {
                        self.gety()?;
                    }
                }
                // only d/h applies, and h is non-zero here
                (true, true) => return Ok(None),
            }
        }
    }

    fn getx(&mut self) -> SpigotResult<()> {
        match self.x.pull()? {
            Some(t) => self.ingest_x(&t),
            None => self.exhaust_x(),
        }
        Ok(())
    }

    fn gety(&mut self) -> SpigotResult<()> {
        match self.y.pull()? {
            Some(t) => self.ingest_y(&t),
            None => self.exhaust_y(),
        }
        Ok(())
    }

    /// Substitute `x = t + 1/x'`.
    fn ingest_x(&mut self, t: &BigInt) {
        let a = &self.a * t + &self.c;
        let b = &self.b * t + &self.d;
        let e = &self.e * t + &self.g;
        let f = &self.f * t + &self.h;
        self.c = std::mem::replace(&mut self.a, a);
        self.d = std::mem::replace(&mut self.b, b);
        self.g = std::mem::replace(&mut self.e, e);
        self.h = std::mem::replace(&mut self.f, f);
    }

    /// Substitute `y = t + 1/y'`.
    fn ingest_y(&mut self, t: &BigInt) {
        let a = &self.a * t + &self.b;
        let c = &self.c * t + &self.d;
        let e = &self.e * t + &self.f;
        let g = &self.g * t + &self.h;
        self.b = std::mem::replace(&mut self.a, a);
        self.d = std::mem::replace(&mut self.c, c);
        self.f = std::mem::replace(&mut self.e, e);
        self.h = std::mem::replace(&mut self.g, g);
    }

    /// Substitute `x = inf`: only the `x` coefficients survive.
    fn exhaust_x(&mut self) {
        if [&self.a, &self.b, &self.e, &self.f].iter().any(|v| !v.is_zero()) {
            self.c = std::mem::take(&mut self.a);
            self.d = std::mem::take(&mut self.b);
            self.g = std::mem::take(&mut self.e);
            self.h = std::mem::take(&mut self.f);
        }
        trace!("gosper_x_exhausted");
    }

    /// Substitute `y = inf`.
    fn exhaust_y(&mut self) {
        if [&self.a, &self.c, &self.e, &self.g].iter().any(|v| !v.is_zero()) {
            self.b = std::mem::take(&mut self.a);
            self.d = std::mem::take(&mut self.c);
            self.f = std::mem::take(&mut self.e);
            self.h = std::mem::take(&mut self.g);
        }
        trace!("gosper_y_exhausted");
    }

    /// Replace `z` by `1/(z - t)`.
    fn output_term(&mut self, t: &BigInt) {
        let e = &self.a - t * &self.e;
        let f = &self.b - t * &self.f;
        let g = &self.c - t * &self.g;
        let h = &self.d - t * &self.h;
        self.a = std::mem::replace(&mut self.e, e);
        self.b = std::mem::replace(&mut self.f, f);
        self.c = std::mem::replace(&mut self.g, g);
        self.d = std::mem::replace(&mut self.h, h);
    }

    /// The common floor of every applicable corner, if there is one.
    fn agreed_term(&self) -> Option<BigInt> {
        let corners: Vec<(&BigInt, &BigInt)> = match (self.x.exhausted, self.y.exhausted) {
            (false, false) => vec![
                (&self.a, &self.e),
                (&self.b, &self.f),
                (&self.c, &self.g),
                (&self.d, &self.h),
            ],
            (true, false) => vec![(&self.c, &self.g), (&self.d, &self.h)],
            (false, true) => vec![(&self.b, &self.f), (&self.d, &self.h)],
            (true, true) => vec![(&self.d, &self.h)],
        };

        let (_, first_den) = corners[0];
        if first_den.is_zero() {
            return None;
        }
        let sign = first_den.signum();
        if corners
            .iter()
            .any(|(_, den)| den.is_zero() || den.signum() != sign)
        {
            return None;
        }

        let mut floors = corners.iter().map(|(num, den)| num.div_floor(den));
        let first = floors.next()?;
        floors.all(|v| v == first).then_some(first)
    }
}

fn corner(num: &BigInt, den: &BigInt) -> Option<BigInt> {
    (!den.is_zero()).then(|| num.div_floor(den))
}

fn differs(lhs: &Option<BigInt>, rhs: &Option<BigInt>) -> bool {
    match (lhs, rhs) {
        (Some(l), Some(r)) => l != r,
        _ => true,
    }
}

impl fmt::Debug for Gosper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Gosper({}, {}, {}, {}; {}, {}, {}, {})",
            self.a, self.b, self.c, self.d, self.e, self.f, self.g, self.h
        )
    }
}

/// A combinator exposed as a source, so its output can feed a spigot (and,
/// through it, another combinator).
///
/// Each term `t` becomes `(t, 1, 1, 0)`; the end of the expansion is the
/// always-infinity matrix.
#[derive(Debug)]
pub struct GosperSource {
    gosper: Gosper,
}

impl GosperSource {
    pub fn new(gosper: Gosper) -> Self {
        Self { gosper }
    }
}

impl Source for GosperSource {
    fn name(&self) -> &'static str {
        "gosper"
    }

    fn bounds(&self) -> (Point, Point) {
        (Point::integer(0), Point::Infinity)
    }

    fn matrix(&mut self, _k: u64) -> SpigotResult<Matrix> {
        Ok(match self.gosper.step()? {
            Some(t) => Matrix::new(t, 1, 1, 0),
            None => Matrix::always_infinity(),
        })
    }
}
