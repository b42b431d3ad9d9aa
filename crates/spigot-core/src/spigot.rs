//! The spigot engine: turns a source's matrix product into a digit stream.
//!
//! The engine keeps one running matrix `M`. The number is known to lie in
//! `M([bot, top])`; when both ends of that interval share an integer part,
//! that integer is the next digit and is consumed by left-multiplying an
//! extraction matrix. Otherwise the next source matrix is folded in on the
//! right, which narrows the interval.
//!
//! The fold loop has no upper bound. It ends because every source's nested
//! intervals shrink to zero width; a source that breaks that contract, or an
//! exact integer produced from irrational operands (`mul root 2 root 2`),
//! never resolves a digit.

use num_bigint::BigInt;
use tracing::{debug, trace};

use crate::error::SpigotResult;
use crate::matrix::{Matrix, Point};
use crate::source::Source;

/// How a resolved digit is removed from the running matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extraction {
    /// Positional digits in the given radix: `x -> B*(x - d)`.
    Base(u32),
    /// Continued fraction terms: `x -> 1/(x - d)`.
    ContinuedFraction,
}

impl Extraction {
    /// The matrix that removes digit `d` from the front of the number.
    pub fn consume_matrix(&self, digit: &BigInt) -> Matrix {
        match self {
            Extraction::Base(radix) => Matrix::new(*radix, -(digit * *radix), 0, 1),
            Extraction::ContinuedFraction => Matrix::new(0, 1, 1, -digit),
        }
    }
}

/// Outcome of asking the engine for a digit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pull {
    /// The next digit (or continued fraction term).
    Digit(BigInt),
    /// The expansion has ended.
    Exhausted,
}

/// Lifecycle of a spigot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpigotState {
    /// No digit has been committed yet.
    #[default]
    AwaitingDigit,
    /// At least one digit has been committed.
    Emitted,
    /// The expansion has ended; further pulls return [`Pull::Exhausted`].
    Exhausted,
}

/// A lazily evaluated real number.
pub struct Spigot {
    source: Box<dyn Source>,
    matrix: Matrix,
    step: u64,
    bot: Point,
    top: Point,
    state: SpigotState,
}

impl Spigot {
    /// Wrap a source, folding in its priming matrices.
    pub fn new(source: Box<dyn Source>) -> SpigotResult<Self> {
        let (bot, top) = source.bounds();
        let mut spigot = Self {
            source,
            matrix: Matrix::identity(),
            step: 1,
            bot,
            top,
            state: SpigotState::AwaitingDigit,
        };
        for _ in 0..spigot.source.priming_steps() {
            spigot.fold()?;
        }
        debug!(
            source = spigot.source.name(),
            bot = %spigot.bot,
            top = %spigot.top,
            primed = spigot.step - 1,
            "spigot_created"
        );
        Ok(spigot)
    }

    /// Convenience constructor boxing a concrete source.
    pub fn from_source<S: Source + 'static>(source: S) -> SpigotResult<Self> {
        Self::new(Box::new(source))
    }

    /// Resolve the next digit of `extra * x` without committing it.
    ///
    /// Folds source matrices until both ends of the bracket agree. Folding
    /// is permanent (it only refines the representation), but no digit is
    /// consumed, so repeated peeks are stable.
    pub fn peek(&mut self, extra: Option<&Matrix>) -> SpigotResult<Pull> {
        if self.state == SpigotState::Exhausted {
            return Ok(Pull::Exhausted);
        }
        loop {
            let current = match extra {
                Some(m) => m.compose(&self.matrix),
                None => self.matrix.clone(),
            };
            if current.is_infinite_at(&self.bot) && current.is_infinite_at(&self.top) {
                return Ok(Pull::Exhausted);
            }
            if let (Some(lo), Some(hi)) = (current.floor_at(&self.bot), current.floor_at(&self.top))
            {
                if lo == hi {
                    return Ok(Pull::Digit(lo));
                }
            }
            self.fold()?;
        }
    }

    /// Resolve and commit the next digit.
    ///
    /// With `early_terminate`, base extraction reports the end of the
    /// expansion as soon as the running matrix maps everything to zero,
    /// i.e. every remaining digit would be 0. Callers that must always see
    /// an integer part pass `false` for the first pull.
    pub fn pull_digit(
        &mut self,
        extraction: Extraction,
        early_terminate: bool,
    ) -> SpigotResult<Pull> {
        let digit = match self.peek(None)? {
            Pull::Digit(d) => d,
            Pull::Exhausted => {
                self.finish();
                return Ok(Pull::Exhausted);
            }
        };
        if early_terminate
            && matches!(extraction, Extraction::Base(_))
            && self.matrix.is_zero_map()
        {
            self.finish();
            return Ok(Pull::Exhausted);
        }
        self.absorb(&extraction.consume_matrix(&digit));
        self.state = SpigotState::Emitted;
        trace!(digit = %digit, step = self.step, "spigot_digit");
        Ok(Pull::Digit(digit))
    }

    /// Left-multiply an arbitrary transformation into the running matrix.
    pub fn absorb(&mut self, matrix: &Matrix) {
        self.matrix = matrix.compose(&self.matrix);
    }

    /// Replace the number `x` by `-x`.
    pub fn negate(&mut self) {
        self.absorb(&Matrix::new(-1, 0, 0, 1));
    }

    /// The running matrix.
    pub fn matrix(&self) -> &Matrix {
        &self.matrix
    }

    /// Index of the next source matrix to fold.
    pub fn step(&self) -> u64 {
        self.step
    }

    pub fn state(&self) -> SpigotState {
        self.state
    }

    pub fn source_name(&self) -> &'static str {
        self.source.name()
    }

    fn fold(&mut self) -> SpigotResult<()> {
        let next = self.source.matrix(self.step)?;
        self.matrix = self.matrix.compose(&next);
        trace!(
            source = self.source.name(),
            step = self.step,
            bits = self.matrix.bits(),
            "spigot_fold"
        );
        self.step += 1;
        Ok(())
    }

    fn finish(&mut self) {
        if self.state != SpigotState::Exhausted {
            debug!(
                source = self.source.name(),
                steps = self.step - 1,
                "spigot_exhausted"
            );
            self.state = SpigotState::Exhausted;
        }
    }
}

impl std::fmt::Debug for Spigot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Spigot")
            .field("source", &self.source.name())
            .field("matrix", &self.matrix)
            .field("step", &self.step)
            .field("state", &self.state)
            .finish()
    }
}
