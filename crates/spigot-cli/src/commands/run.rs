//! Evaluate an expression and stream its expansion to stdout.

use std::io;

use anyhow::{Context, Result};
use spigot_core::{
    ApproximationSink, BaseSink, ContinuedFractionSink, InputReader, InputSlot, RunSummary, Sink,
    SourceRegistry,
};
use tracing::{debug, info_span};

/// What to print.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Positional digits in the given base.
    Base(u32),
    /// Continued fraction terms.
    ContinuedFraction,
    /// Continued fraction convergents `p/q`.
    Convergents,
    /// `floor(D * x)` for each denominator `D` read from stdin.
    Approximation,
}

/// Resolved options for one run.
#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    pub mode: OutputMode,
    pub limit: Option<u64>,
    pub early_terminate: bool,
}

pub fn execute(expression: &[String], options: &RunOptions) -> Result<RunSummary> {
    let _span = info_span!("run", expression = %expression.join(" ")).entered();

    let registry = SourceRegistry::standard();
    let spec = registry
        .parse(expression)
        .with_context(|| format!("Invalid expression '{}'", expression.join(" ")))?;

    let stdin: InputReader = Box::new(io::stdin().lock());
    let mut input = InputSlot::new(stdin);

    // Approximation mode reads denominators from stdin, so it claims the
    // channel before any source can.
    let denominators = match options.mode {
        OutputMode::Approximation => Some(input.claim("approx")?),
        _ => None,
    };
    let mut spigot = spec
        .build(&mut input)
        .with_context(|| format!("Cannot evaluate '{}'", expression.join(" ")))?;

    let stdout = io::stdout().lock();
    let (limit, early_terminate) = (options.limit, options.early_terminate);
    let summary = match options.mode {
        OutputMode::Base(radix) => {
            BaseSink::new(stdout, radix)?.run(&mut spigot, limit, early_terminate)?
        }
        OutputMode::ContinuedFraction => ContinuedFractionSink::new(stdout, false).run(
            &mut spigot,
            limit,
            early_terminate,
        )?,
        OutputMode::Convergents => ContinuedFractionSink::new(stdout, true).run(
            &mut spigot,
            limit,
            early_terminate,
        )?,
        OutputMode::Approximation => {
            let reader = denominators.context("stdin is not available for denominators")?;
            ApproximationSink::new(reader, stdout).run(&mut spigot, limit, early_terminate)?
        }
    };

    debug!(
        digits = summary.digits,
        exhausted = summary.exhausted,
        steps = spigot.step() - 1,
        "run_finished"
    );
    Ok(summary)
}
