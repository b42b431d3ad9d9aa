//! Exact, streaming digit generation for real numbers.
//!
//! A real number is represented lazily as an infinite composition of Mobius
//! transformations `x -> (px + q) / (rx + s)` applied to a bracketing
//! interval. Digits are emitted only once they are certain, so every digit
//! printed is correct no matter how many follow.
//!
//! ## Core Concepts
//!
//! - **Matrix**: a 2x2 integer matrix standing for one Mobius map
//! - **Source**: a generator of the matrices `M(1), M(2), ...` for one
//!   number, plus its starting bracket
//! - **Spigot**: the engine folding source matrices into a running product
//!   and extracting digits from the left
//! - **Gosper**: arithmetic on two spigots' continued fraction streams,
//!   itself usable as a source
//! - **Sink**: drives a spigot and writes digits, continued fraction terms or
//!   rational approximations
//!
//! ## Expressions
//!
//! ```text
//! pi | e | phi | root <n> | log <x> | logbase <b> <x> | frac <n> [<d>]
//! ieee <hex> | cfrac | base <n> | <number>
//! add|sub|mul|div <expr> <expr> | reciprocal <expr>
//! ```
//!
//! [`SourceRegistry`] parses an expression into a [`SourceSpec`], which
//! [`SourceSpec::build`] turns into a [`Spigot`].
//!
//! ## Termination
//!
//! Nothing bounds the work needed for one digit. Every source narrows its
//! interval to a point, so each digit of an irrational number arrives
//! eventually, but an exact integer computed from irrational operands (for
//! example `mul root 2 root 2`) sits on a digit boundary forever and never
//! produces its first digit. Quotients of logarithms (`logbase`, and
//! `div log x log b`) are the exception: rational ones are detected exactly
//! and built as fractions.

mod error;
mod gosper;
mod literal;
mod matrix;
mod registry;
mod sink;
pub mod source;
mod spigot;

pub use error::{SpigotError, SpigotResult};
pub use gosper::{Gosper, GosperSource, Operator};
pub use literal::{parse_ieee_bits, parse_integer, parse_rational};
pub use matrix::{Matrix, MatrixError, Point};
pub use registry::{InputSlot, ParseFn, SourceEntry, SourceRegistry, SourceSpec, Tokens};
pub use sink::{ApproximationSink, BaseSink, ContinuedFractionSink, RunSummary, Sink};
pub use source::{InputReader, Source};
pub use spigot::{Extraction, Pull, Spigot, SpigotState};

// Arbitrary precision types used throughout the public API
pub use num_bigint::BigInt;
pub use num_rational::BigRational;
