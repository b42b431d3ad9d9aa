//! Sources fed from an external input channel.
//!
//! These are the only sources that block: each matrix request may wait for
//! another line or character. Both return a constant matrix once the input
//! ends, which collapses the spigot's interval to a point.

use std::io::BufRead;

use num_bigint::BigInt;
use num_traits::Zero;
use tracing::trace;

use crate::error::{SpigotError, SpigotResult};
use crate::matrix::{Matrix, Point};
use crate::source::{InputReader, Source};

/// Continued fraction terms read one integer per line.
///
/// Each term `t` is the map `x -> t + 1/x`, which sends `[0, inf]` into
/// `[t, inf]`; every term after the first is at least 1, so the bracket
/// holds from the second term on. End of input is the always-infinity
/// matrix. Blank lines are skipped.
pub struct TermStreamSource {
    input: InputReader,
    line: String,
    terms: u64,
}

impl TermStreamSource {
    /// Create a source reading terms from `input`.
    pub fn new(input: InputReader) -> Self {
        Self {
            input,
            line: String::new(),
            terms: 0,
        }
    }

    /// Number of terms read so far.
    pub fn terms_read(&self) -> u64 {
        self.terms
    }
}

impl Source for TermStreamSource {
    fn name(&self) -> &'static str {
        "cfrac"
    }

    fn bounds(&self) -> (Point, Point) {
        (Point::integer(0), Point::Infinity)
    }

    fn matrix(&mut self, _k: u64) -> SpigotResult<Matrix> {
        loop {
            self.line.clear();
            if self.input.read_line(&mut self.line)? == 0 {
                trace!(terms = self.terms, "cfrac_input_ended");
                return Ok(Matrix::always_infinity());
            }
            let text = self.line.trim();
            if text.is_empty() {
                continue;
            }
            let term: BigInt = text.parse().map_err(|_| SpigotError::MalformedInput {
                line: text.to_string(),
                reason: "expected an integer continued fraction term".to_string(),
            })?;
            self.terms += 1;
            return Ok(Matrix::new(term, 1, 1, 0));
        }
    }
}

/// A positional number in base `radix` read character by character.
///
/// The first request consumes the whole integer part (up to `.` or end of
/// input); later requests consume one fractional digit each. Characters
/// that are not digits of the radix are ignored. Each digit `i` is the map
/// `x -> (x + i*radix) / radix`, sending `[0, radix]` into `[i, i+1]`. End
/// of input is the constant map to zero.
pub struct DigitStreamSource {
    input: InputReader,
    radix: u32,
    started: bool,
}

impl DigitStreamSource {
    /// Create a source reading a base-`radix` number from `input`.
    pub fn new(input: InputReader, radix: u32) -> SpigotResult<Self> {
        if !(2..=36).contains(&radix) {
            return Err(SpigotError::domain(
                "base",
                format!("input base {} must be between 2 and 36", radix),
            ));
        }
        Ok(Self {
            input,
            radix,
            started: false,
        })
    }

    /// The input radix.
    pub fn radix(&self) -> u32 {
        self.radix
    }

    fn next_byte(&mut self) -> SpigotResult<Option<u8>> {
        let buf = self.input.fill_buf()?;
        let Some(&byte) = buf.first() else {
            return Ok(None);
        };
        self.input.consume(1);
        Ok(Some(byte))
    }

    fn digit_value(&self, byte: u8) -> Option<u32> {
        char::from(byte).to_digit(self.radix)
    }

    fn digit_matrix(&self, digit: BigInt) -> Matrix {
        Matrix::new(1, digit * self.radix, 0, self.radix)
    }
}

impl Source for DigitStreamSource {
    fn name(&self) -> &'static str {
        "base"
    }

    fn bounds(&self) -> (Point, Point) {
        (Point::integer(0), Point::integer(self.radix))
    }

    fn matrix(&mut self, _k: u64) -> SpigotResult<Matrix> {
        if !self.started {
            self.started = true;
            let mut integer_part = BigInt::zero();
            while let Some(byte) = self.next_byte()? {
                if byte == b'.' {
                    break;
                }
                if let Some(v) = self.digit_value(byte) {
                    integer_part = integer_part * self.radix + v;
                }
            }
            trace!(integer_part = %integer_part, "base_integer_part");
            return Ok(self.digit_matrix(integer_part));
        }

        while let Some(byte) = self.next_byte()? {
            if let Some(v) = self.digit_value(byte) {
                return Ok(self.digit_matrix(BigInt::from(v)));
            }
        }
        Ok(Matrix::new(0, 0, 0, 1))
    }
}
