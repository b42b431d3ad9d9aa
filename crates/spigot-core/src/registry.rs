//! Expression parsing and spigot construction.
//!
//! Expressions are prefix token sequences such as `add root 2 frac 1 3`.
//! Each source keyword is registered with a parse function that consumes
//! its arguments, so adding a source means adding one [`SourceEntry`] and
//! one [`SourceSpec`] variant.

use std::collections::HashMap;
use std::fmt;

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};
use tracing::debug;

use crate::error::{SpigotError, SpigotResult};
use crate::gosper::{Gosper, GosperSource, Operator};
use crate::literal::{parse_ieee_bits, parse_integer, parse_rational};
use crate::source::{
    exact_log_ratio, log_spigot, DigitStreamSource, ESource, FracSource, InputReader, PhiSource, PiSource,
    RootSource, TermStreamSource,
};
use crate::spigot::Spigot;

/// A parsed expression, ready to be built into a [`Spigot`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceSpec {
    Pi,
    E,
    Phi,
    /// Square root of a non-negative integer.
    Root(BigInt),
    /// Natural logarithm of a positive rational.
    Log(BigRational),
    /// `log(value) / log(base)`.
    LogBase {
        base: BigRational,
        value: BigRational,
    },
    /// An exact rational constant.
    Frac(BigRational),
    /// Continued fraction terms read from the input channel.
    ContinuedFraction,
    /// A base-`radix` number read from the input channel.
    Digits { radix: u32 },
    Binary {
        op: Operator,
        lhs: Box<SourceSpec>,
        rhs: Box<SourceSpec>,
    },
    Reciprocal(Box<SourceSpec>),
}

impl SourceSpec {
    /// Construct the spigot this expression describes.
    ///
    /// Sources that read the input channel claim it from `input`; a second
    /// claim in the same expression fails.
    pub fn build(self, input: &mut InputSlot) -> SpigotResult<Spigot> {
        match self {
            SourceSpec::Pi => Spigot::from_source(PiSource),
            SourceSpec::E => Spigot::from_source(ESource),
            SourceSpec::Phi => Spigot::from_source(PhiSource),
            SourceSpec::Root(n) => Spigot::from_source(RootSource::new(n)?),
            SourceSpec::Log(value) => log_spigot(&value),
            SourceSpec::LogBase { base, value } => {
                if !base.is_positive() || base.is_one() {
                    return Err(SpigotError::domain(
                        "logbase",
                        format!("base {} must be positive and not 1", base),
                    ));
                }
                log_quotient(&value, &base)
            }
            SourceSpec::Frac(value) => Spigot::from_source(FracSource::new(value)),
            SourceSpec::ContinuedFraction => {
                Spigot::from_source(TermStreamSource::new(input.claim("cfrac")?))
            }
            SourceSpec::Digits { radix } => {
                Spigot::from_source(DigitStreamSource::new(input.claim("base")?, radix)?)
            }
            SourceSpec::Binary { op, lhs, rhs } => match (op, *lhs, *rhs) {
                // `div log x log b` is a change of base
                (Operator::Div, SourceSpec::Log(value), SourceSpec::Log(base))
                    if !base.is_one() =>
                {
                    log_quotient(&value, &base)
                }
                (op, lhs, rhs) => {
                    let x = lhs.build(input)?;
                    let y = rhs.build(input)?;
                    Spigot::from_source(GosperSource::new(Gosper::binary(op, x, y)))
                }
            },
            SourceSpec::Reciprocal(inner) => {
                let x = inner.build(input)?;
                Spigot::from_source(GosperSource::new(Gosper::reciprocal(x)))
            }
        }
    }
}

/// `log(value) / log(base)`, as an exact fraction whenever it is rational.
///
/// The combinator cannot settle on an exact rational computed from two
/// irrational logarithms, so those quotients never reach it.
fn log_quotient(value: &BigRational, base: &BigRational) -> SpigotResult<Spigot> {
    if let Some(exact) = exact_log_ratio(base, value) {
        return Spigot::from_source(FracSource::new(exact));
    }
    let numerator = log_spigot(value)?;
    let denominator = log_spigot(base)?;
    Spigot::from_source(GosperSource::new(Gosper::div(numerator, denominator)))
}

impl fmt::Display for SourceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceSpec::Pi => write!(f, "pi"),
            SourceSpec::E => write!(f, "e"),
            SourceSpec::Phi => write!(f, "phi"),
            SourceSpec::Root(n) => write!(f, "root {}", n),
            SourceSpec::Log(value) => write!(f, "log {}", value),
            SourceSpec::LogBase { base, value } => write!(f, "logbase {} {}", base, value),
            SourceSpec::Frac(value) => write!(f, "frac {}", value),
            SourceSpec::ContinuedFraction => write!(f, "cfrac"),
            SourceSpec::Digits { radix } => write!(f, "base {}", radix),
            SourceSpec::Binary { op, lhs, rhs } => write!(f, "{} {} {}", op, lhs, rhs),
            SourceSpec::Reciprocal(inner) => write!(f, "reciprocal {}", inner),
        }
    }
}

/// The single external input channel, handed to at most one consumer.
pub struct InputSlot {
    reader: Option<InputReader>,
    claimed_by: Option<String>,
}

impl InputSlot {
    pub fn new(reader: InputReader) -> Self {
        Self {
            reader: Some(reader),
            claimed_by: None,
        }
    }

    /// Take the reader. Fails if someone already has it.
    pub fn claim(&mut self, consumer: &str) -> SpigotResult<InputReader> {
        let reader = self
            .reader
            .take()
            .ok_or_else(|| SpigotError::InputAlreadyClaimed {
                source_name: consumer.to_string(),
            })?;
        debug!(consumer, "input_claimed");
        self.claimed_by = Some(consumer.to_string());
        Ok(reader)
    }

    pub fn is_available(&self) -> bool {
        self.reader.is_some()
    }

    /// Name of the consumer holding the reader.
    pub fn claimed_by(&self) -> Option<&str> {
        self.claimed_by.as_deref()
    }
}

impl fmt::Debug for InputSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputSlot")
            .field("available", &self.is_available())
            .field("claimed_by", &self.claimed_by)
            .finish()
    }
}

/// Cursor over expression tokens.
#[derive(Debug, Clone)]
pub struct Tokens<'a> {
    items: Vec<&'a str>,
    position: usize,
}

impl<'a> Tokens<'a> {
    pub fn new<S: AsRef<str>>(items: &'a [S]) -> Self {
        Self {
            items: items.iter().map(|s| s.as_ref()).collect(),
            position: 0,
        }
    }

    /// Look at the next token without consuming it.
    pub fn peek(&self) -> Option<&'a str> {
        self.items.get(self.position).copied()
    }

    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Option<&'a str> {
        let token = self.peek()?;
        self.position += 1;
        Some(token)
    }

    /// The next token, or a [`SpigotError::MissingArgument`] naming what
    /// `source_name` expected there.
    pub fn require(&mut self, source_name: &str, expected: &str) -> SpigotResult<&'a str> {
        self.next()
            .ok_or_else(|| SpigotError::missing(source_name, expected))
    }

    pub fn is_empty(&self) -> bool {
        self.position >= self.items.len()
    }
}

/// Parses the arguments following a source keyword.
pub type ParseFn = fn(&SourceRegistry, &mut Tokens<'_>) -> SpigotResult<SourceSpec>;

/// A registered source keyword.
#[derive(Clone, Copy)]
pub struct SourceEntry {
    pub name: &'static str,
    pub usage: &'static str,
    pub summary: &'static str,
    parse: ParseFn,
}

impl SourceEntry {
    pub const fn new(
        name: &'static str,
        usage: &'static str,
        summary: &'static str,
        parse: ParseFn,
    ) -> Self {
        Self {
            name,
            usage,
            summary,
            parse,
        }
    }
}

impl fmt::Debug for SourceEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceEntry")
            .field("name", &self.name)
            .field("usage", &self.usage)
            .finish()
    }
}

/// Keyword table for expressions.
pub struct SourceRegistry {
    entries: Vec<SourceEntry>,
    index: HashMap<&'static str, usize>,
}

impl SourceRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// The registry with every built-in source and operator.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        for entry in STANDARD_ENTRIES {
            registry.register(*entry);
        }
        registry.alias("recip", "reciprocal");
        registry
    }

    /// Register a keyword, replacing any previous entry of the same name.
    pub fn register(&mut self, entry: SourceEntry) {
        if let Some(&i) = self.index.get(entry.name) {
            self.entries[i] = entry;
        } else {
            self.index.insert(entry.name, self.entries.len());
            self.entries.push(entry);
        }
    }

    /// Register a keyword (builder pattern).
    pub fn with_entry(mut self, entry: SourceEntry) -> Self {
        self.register(entry);
        self
    }

    /// Make `alias` parse like `target`. Does nothing if `target` is unknown.
    pub fn alias(&mut self, alias: &'static str, target: &str) {
        if let Some(&i) = self.index.get(target) {
            self.index.insert(alias, i);
        }
    }

    pub fn get(&self, name: &str) -> Option<&SourceEntry> {
        self.index.get(name).map(|&i| &self.entries[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Registered entries in registration order (aliases excluded).
    pub fn entries(&self) -> &[SourceEntry] {
        &self.entries
    }

    /// Parse a complete expression; every token must be used.
    pub fn parse<S: AsRef<str>>(&self, tokens: &[S]) -> SpigotResult<SourceSpec> {
        let mut tokens = Tokens::new(tokens);
        let spec = self.parse_expression(&mut tokens)?;
        if let Some(extra) = tokens.peek() {
            return Err(SpigotError::UnexpectedArgument {
                text: extra.to_string(),
            });
        }
        debug!(expression = %spec, "expression_parsed");
        Ok(spec)
    }

    /// Parse one expression from the front of `tokens`.
    pub fn parse_expression(&self, tokens: &mut Tokens<'_>) -> SpigotResult<SourceSpec> {
        let token = tokens.require("expression", "a source name or number")?;
        if let Some(entry) = self.get(token) {
            return (entry.parse)(self, tokens);
        }
        match parse_rational(token) {
            Ok(value) => Ok(SourceSpec::Frac(value)),
            Err(_) if token.starts_with(|c: char| c.is_ascii_alphabetic()) => {
                Err(SpigotError::UnknownSource {
                    name: token.to_string(),
                })
            }
            Err(e) => Err(e),
        }
    }
}

impl Default for SourceRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl fmt::Debug for SourceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceRegistry")
            .field("entry_count", &self.entries.len())
            .field("names", &self.index.keys().collect::<Vec<_>>())
            .finish()
    }
}

const STANDARD_ENTRIES: &[SourceEntry] = &[
    SourceEntry::new("pi", "pi", "the circle constant", parse_pi),
    SourceEntry::new("e", "e", "base of the natural logarithm", parse_e),
    SourceEntry::new("phi", "phi", "the golden ratio", parse_phi),
    SourceEntry::new("root", "root <n>", "square root of an integer", parse_root),
    SourceEntry::new("log", "log <x>", "natural logarithm of a rational", parse_log),
    SourceEntry::new(
        "logbase",
        "logbase <b> <x>",
        "logarithm of x to base b",
        parse_logbase,
    ),
    SourceEntry::new("frac", "frac <n> [<d>]", "the rational n/d", parse_frac),
    SourceEntry::new(
        "ieee",
        "ieee <hex>",
        "exact value of an IEEE 754 bit pattern (8 or 16 hex digits)",
        parse_ieee,
    ),
    SourceEntry::new(
        "cfrac",
        "cfrac",
        "continued fraction terms from stdin, one per line",
        parse_cfrac,
    ),
    SourceEntry::new("base", "base <n>", "a base-n number from stdin", parse_base),
    SourceEntry::new("add", "add <x> <y>", "x + y", parse_add),
    SourceEntry::new("sub", "sub <x> <y>", "x - y", parse_sub),
    SourceEntry::new("mul", "mul <x> <y>", "x * y", parse_mul),
    SourceEntry::new("div", "div <x> <y>", "x / y", parse_div),
    SourceEntry::new(
        "reciprocal",
        "reciprocal <x>",
        "1 / x (alias: recip)",
        parse_reciprocal,
    ),
];

fn parse_pi(_: &SourceRegistry, _: &mut Tokens<'_>) -> SpigotResult<SourceSpec> {
    Ok(SourceSpec::Pi)
}

fn parse_e(_: &SourceRegistry, _: &mut Tokens<'_>) -> SpigotResult<SourceSpec> {
    Ok(SourceSpec::E)
}

fn parse_phi(_: &SourceRegistry, _: &mut Tokens<'_>) -> SpigotResult<SourceSpec> {
    Ok(SourceSpec::Phi)
}

fn parse_cfrac(_: &SourceRegistry, _: &mut Tokens<'_>) -> SpigotResult<SourceSpec> {
    Ok(SourceSpec::ContinuedFraction)
}

fn parse_root(_: &SourceRegistry, tokens: &mut Tokens<'_>) -> SpigotResult<SourceSpec> {
    let n = parse_integer(tokens.require("root", "a radicand")?)?;
    Ok(SourceSpec::Root(n))
}

fn parse_log(_: &SourceRegistry, tokens: &mut Tokens<'_>) -> SpigotResult<SourceSpec> {
    let value = parse_rational(tokens.require("log", "an argument")?)?;
    Ok(SourceSpec::Log(value))
}

fn parse_logbase(_: &SourceRegistry, tokens: &mut Tokens<'_>) -> SpigotResult<SourceSpec> {
    let base = parse_rational(tokens.require("logbase", "a base")?)?;
    let value = parse_rational(tokens.require("logbase", "an argument")?)?;
    Ok(SourceSpec::LogBase { base, value })
}

/// `frac <n> [<d>]`: the denominator is taken whenever the next token is
/// an integer.
fn parse_frac(_: &SourceRegistry, tokens: &mut Tokens<'_>) -> SpigotResult<SourceSpec> {
    let mut value = parse_rational(tokens.require("frac", "a numerator")?)?;
    if let Some(denom) = tokens.peek().and_then(|t| parse_integer(t).ok()) {
        tokens.next();
        if denom.is_zero() {
            return Err(SpigotError::domain("frac", "denominator must be non-zero"));
        }
        value /= BigRational::from_integer(denom);
    }
    Ok(SourceSpec::Frac(value))
}

fn parse_ieee(_: &SourceRegistry, tokens: &mut Tokens<'_>) -> SpigotResult<SourceSpec> {
    let value = parse_ieee_bits(tokens.require("ieee", "a hex bit pattern")?)?;
    Ok(SourceSpec::Frac(value))
}

fn parse_base(_: &SourceRegistry, tokens: &mut Tokens<'_>) -> SpigotResult<SourceSpec> {
    let text = tokens.require("base", "an input base")?;
    let radix = parse_integer(text)?;
    match u32::try_from(&radix) {
        Ok(radix) if (2..=36).contains(&radix) => Ok(SourceSpec::Digits { radix }),
        _ => Err(SpigotError::domain(
            "base",
            format!("input base {} must be between 2 and 36", radix),
        )),
    }
}

fn parse_add(registry: &SourceRegistry, tokens: &mut Tokens<'_>) -> SpigotResult<SourceSpec> {
    parse_binary(registry, tokens, Operator::Add)
}

fn parse_sub(registry: &SourceRegistry, tokens: &mut Tokens<'_>) -> SpigotResult<SourceSpec> {
    parse_binary(registry, tokens, Operator::Sub)
}

fn parse_mul(registry: &SourceRegistry, tokens: &mut Tokens<'_>) -> SpigotResult<SourceSpec> {
    parse_binary(registry, tokens, Operator::Mul)
}

fn parse_div(registry: &SourceRegistry, tokens: &mut Tokens<'_>) -> SpigotResult<SourceSpec> {
    parse_binary(registry, tokens, Operator::Div)
}

fn parse_binary(
    registry: &SourceRegistry,
    tokens: &mut Tokens<'_>,
    op: Operator,
) -> SpigotResult<SourceSpec> {
    if tokens.is_empty() {
        return Err(SpigotError::missing(op.name(), "two operands"));
    }
    let lhs = registry.parse_expression(tokens)?;
    if tokens.is_empty() {
        return Err(SpigotError::missing(op.name(), "a second operand"));
    }
    let rhs = registry.parse_expression(tokens)?;
    Ok(SourceSpec::Binary {
        op,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    })
}

fn parse_reciprocal(registry: &SourceRegistry, tokens: &mut Tokens<'_>) -> SpigotResult<SourceSpec> {
    if tokens.is_empty() {
        return Err(SpigotError::missing("reciprocal", "an operand"));
    }
    let inner = registry.parse_expression(tokens)?;
    Ok(SourceSpec::Reciprocal(Box::new(inner)))
}
