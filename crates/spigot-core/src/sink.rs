//! Output sinks: drive a spigot and write its expansion.
//!
//! Every sink flushes after each digit (or line) so a consumer reading a
//! pipe sees digits as soon as they are known.

use std::io::{BufRead, Write};

use num_bigint::BigInt;
use num_traits::Signed;
use tracing::debug;

use crate::error::{SpigotError, SpigotResult};
use crate::matrix::Matrix;
use crate::spigot::{Extraction, Pull, Spigot};

/// What a sink run produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunSummary {
    /// Digits, terms or approximations written.
    pub digits: u64,
    /// Whether the run stopped because the expansion ended (as opposed to
    /// hitting the limit or running out of auxiliary input).
    pub exhausted: bool,
}

/// Something that consumes a spigot and writes output.
pub trait Sink {
    /// Run to completion or until `limit` outputs have been written.
    fn run(
        &mut self,
        spigot: &mut Spigot,
        limit: Option<u64>,
        early_terminate: bool,
    ) -> SpigotResult<RunSummary>;
}

fn reached(limit: Option<u64>, count: u64) -> bool {
    limit.is_some_and(|l| count >= l)
}

/// Positional output in radix 2..=36.
///
/// The integer part is written in full (it counts as one digit against the
/// limit), the radix point only once a fractional digit exists, and a
/// newline at the end. Negative numbers get a leading `-` and the digits of
/// their absolute value.
pub struct BaseSink<W> {
    out: W,
    radix: u32,
}

impl<W: Write> BaseSink<W> {
    pub fn new(out: W, radix: u32) -> SpigotResult<Self> {
        if !(2..=36).contains(&radix) {
            return Err(SpigotError::domain(
                "output",
                format!("base {} must be between 2 and 36", radix),
            ));
        }
        Ok(Self { out, radix })
    }

    /// Recover the writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_str(&mut self, text: &str) -> SpigotResult<()> {
        self.out.write_all(text.as_bytes())?;
        self.out.flush()?;
        Ok(())
    }

    fn finish(&mut self, digits: u64, exhausted: bool) -> SpigotResult<RunSummary> {
        self.write_str("\n")?;
        debug!(radix = self.radix, digits, exhausted, "base_sink_finished");
        Ok(RunSummary { digits, exhausted })
    }
}

impl<W: Write> Sink for BaseSink<W> {
    fn run(
        &mut self,
        spigot: &mut Spigot,
        limit: Option<u64>,
        early_terminate: bool,
    ) -> SpigotResult<RunSummary> {
        let extraction = Extraction::Base(self.radix);
        if reached(limit, 0) {
            return Ok(RunSummary::default());
        }

        match spigot.peek(None)? {
            Pull::Exhausted => return self.finish(0, true),
            Pull::Digit(first) if first.is_negative() => {
                self.write_str("-")?;
                spigot.negate();
            }
            Pull::Digit(_) => {}
        }

        // the integer part is always written, even when it is zero
        let integer = match spigot.pull_digit(extraction, false)? {
            Pull::Digit(d) => d,
            Pull::Exhausted => return self.finish(0, true),
        };
        self.write_str(&integer.to_str_radix(self.radix))?;
        let mut digits = 1;

        loop {
            if reached(limit, digits) {
                return self.finish(digits, false);
            }
            match spigot.pull_digit(extraction, early_terminate)? {
                Pull::Digit(d) => {
                    if digits == 1 {
                        self.write_str(".")?;
                    }
                    self.write_str(&d.to_str_radix(self.radix))?;
                    digits += 1;
                }
                Pull::Exhausted => return self.finish(digits, true),
            }
        }
    }
}

/// Continued fraction output, one term per line, or the convergents
/// `p/q` of the expansion so far.
pub struct ContinuedFractionSink<W> {
    out: W,
    convergents: bool,
}

impl<W: Write> ContinuedFractionSink<W> {
    pub fn new(out: W, convergents: bool) -> Self {
        Self { out, convergents }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Sink for ContinuedFractionSink<W> {
    fn run(
        &mut self,
        spigot: &mut Spigot,
        limit: Option<u64>,
        early_terminate: bool,
    ) -> SpigotResult<RunSummary> {
        let mut convergent = Matrix::identity();
        let mut terms = 0;
        loop {
            if reached(limit, terms) {
                return Ok(RunSummary {
                    digits: terms,
                    exhausted: false,
                });
            }
            let term = match spigot.pull_digit(Extraction::ContinuedFraction, early_terminate)? {
                Pull::Digit(t) => t,
                Pull::Exhausted => {
                    debug!(terms, "cfrac_sink_finished");
                    return Ok(RunSummary {
                        digits: terms,
                        exhausted: true,
                    });
                }
            };
            if self.convergents {
                convergent = convergent.compose(&Matrix::new(term, 1, 1, 0));
                writeln!(self.out, "{}/{}", convergent.p, convergent.r)?;
            } else {
                writeln!(self.out, "{}", term)?;
            }
            self.out.flush()?;
            terms += 1;
        }
    }
}

/// Rational approximations on demand.
///
/// Each line of the auxiliary input is a denominator `D`; the answer is
/// `floor(D * x)` on its own line. The spigot is only ever peeked, so
/// denominators may come in any order.
pub struct ApproximationSink<R, W> {
    input: R,
    out: W,
}

impl<R: BufRead, W: Write> ApproximationSink<R, W> {
    pub fn new(input: R, out: W) -> Self {
        Self { input, out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn next_denominator(&mut self) -> SpigotResult<Option<BigInt>> {
        let mut line = String::new();
        loop {
            line.clear();
            if self.input.read_line(&mut line)? == 0 {
                return Ok(None);
            }
            let text = line.trim();
            if text.is_empty() {
                continue;
            }
            return text
                .parse()
                .map(Some)
                .map_err(|_| SpigotError::MalformedInput {
                    line: text.to_string(),
                    reason: "expected an integer denominator".to_string(),
                });
        }
    }
}

impl<R: BufRead, W: Write> Sink for ApproximationSink<R, W> {
    fn run(
        &mut self,
        spigot: &mut Spigot,
        limit: Option<u64>,
        _early_terminate: bool,
    ) -> SpigotResult<RunSummary> {
        let mut answers = 0;
        while !reached(limit, answers) {
            let Some(denominator) = self.next_denominator()? else {
                break;
            };
            let scale = Matrix::new(denominator, 0, 0, 1);
            match spigot.peek(Some(&scale))? {
                Pull::Digit(n) => writeln!(self.out, "{}", n)?,
                Pull::Exhausted => {
                    return Ok(RunSummary {
                        digits: answers,
                        exhausted: true,
                    })
                }
            }
            self.out.flush()?;
            answers += 1;
        }
        debug!(answers, "approx_sink_finished");
        Ok(RunSummary {
            digits: answers,
            exhausted: false,
        })
    }
}
