//! Source generators: families of Mobius matrices indexed by step.
//!
//! A source describes a real number as an infinite composition
//! `M(1) o M(2) o M(3) o ...` together with a starting bracket
//! `[bot, top]`. Whoever adds a source owes a proof that every matrix maps
//! the bracket into a subinterval of itself (after the priming steps); the
//! engine relies on it and cannot check it.

mod constants;
mod log;
mod rational;
mod root;
mod stream;

use std::io::BufRead;

use crate::error::SpigotResult;
use crate::matrix::{Matrix, Point};

pub use constants::{ESource, PhiSource, PiSource};
pub use log::{exact_log_ratio, log_spigot, LogSeriesSource};
pub use rational::FracSource;
pub use root::RootSource;
pub use stream::{DigitStreamSource, TermStreamSource};

/// External input channel consumed by stream-reading sources.
pub type InputReader = Box<dyn BufRead>;

/// A generator of the matrices whose infinite product is the target number.
pub trait Source {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// The starting bracket `(bot, top)`.
    fn bounds(&self) -> (Point, Point);

    /// Number of matrices the engine folds in before the first digit test.
    fn priming_steps(&self) -> u64 {
        0
    }

    /// The matrix for step `k` (starting at 1).
    ///
    /// Stream sources block on their input here and return a constant
    /// matrix once it runs dry.
    fn matrix(&mut self, k: u64) -> SpigotResult<Matrix>;
}

