//! Mathematical constants with closed-form matrix families.

use crate::error::SpigotResult;
use crate::matrix::{Matrix, Point};
use crate::source::Source;

/// pi from the series `2 + 1/3 (2 + 2/5 (2 + 3/7 (2 + ...)))`.
///
/// Step `k` is `x -> (kx + 4k + 2) / (2k + 1)`, which maps `[3, 4]` into
/// itself for every `k`.
#[derive(Debug, Default, Clone)]
pub struct PiSource;

impl Source for PiSource {
    fn name(&self) -> &'static str {
        "pi"
    }

    fn bounds(&self) -> (Point, Point) {
        (Point::integer(3), Point::integer(4))
    }

    fn matrix(&mut self, k: u64) -> SpigotResult<Matrix> {
        Ok(Matrix::new(k, 4 * k + 2, 0, 2 * k + 1))
    }
}

/// e from the Taylor series of `exp(1)`: `1 + 1/1 (1 + 1/2 (1 + 1/3 (...)))`.
///
/// Step `k` is `x -> 1 + x/k`. Only steps `k >= 2` map `[0, 2]` into
/// itself, so the first two matrices are primed before any digit test;
/// after them the bracket image is `[2, 3]`, which already contains e.
#[derive(Debug, Default, Clone)]
pub struct ESource;

impl Source for ESource {
    fn name(&self) -> &'static str {
        "e"
    }

    fn bounds(&self) -> (Point, Point) {
        (Point::integer(0), Point::integer(2))
    }

    fn priming_steps(&self) -> u64 {
        2
    }

    fn matrix(&mut self, k: u64) -> SpigotResult<Matrix> {
        Ok(Matrix::new(1, k, 0, k))
    }
}

/// The golden ratio, continued fraction `[1; 1, 1, 1, ...]`.
#[derive(Debug, Default, Clone)]
pub struct PhiSource;

impl Source for PhiSource {
    fn name(&self) -> &'static str {
        "phi"
    }

    fn bounds(&self) -> (Point, Point) {
        (Point::integer(1), Point::integer(2))
    }

    fn matrix(&mut self, _k: u64) -> SpigotResult<Matrix> {
        Ok(Matrix::new(1, 1, 1, 0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::BigInt;

    /// Check that step `k` maps both bracket ends back inside the bracket.
    fn assert_self_mapping(source: &mut dyn Source, steps: std::ops::RangeInclusive<u64>) {
        let (bot, top) = source.bounds();
        let lo = bot.floor().unwrap();
        let hi = top.floor().unwrap();
        for k in steps {
            let m = source.matrix(k).unwrap();
            for end in [&bot, &top] {
                let image = m.evaluate(end).unwrap();
                let v = image.floor().unwrap();
                assert!(v >= lo && v <= hi, "step {} maps {} outside", k, end);
            }
        }
    }

    #[test]
    fn test_pi_matrices() {
        let mut pi = PiSource;
        assert_eq!(pi.matrix(1).unwrap(), Matrix::new(1, 6, 0, 3));
        assert_eq!(pi.matrix(3).unwrap(), Matrix::new(3, 14, 0, 7));
        assert_self_mapping(&mut pi, 1..=50);
    }

    #[test]
    fn test_e_priming_reaches_safe_bracket() {
        let mut e = ESource;
        assert_eq!(e.priming_steps(), 2);
        let primed = e.matrix(1).unwrap().compose(&e.matrix(2).unwrap());
        let (bot, top) = e.bounds();
        assert_eq!(primed.floor_at(&bot), Some(BigInt::from(2)));
        assert_eq!(primed.floor_at(&top), Some(BigInt::from(3)));
        assert_self_mapping(&mut e, 2..=50);
    }

    #[test]
    fn test_phi_is_constant() {
        let mut phi = PhiSource;
        assert_eq!(phi.matrix(1).unwrap(), phi.matrix(99).unwrap());
        assert_self_mapping(&mut phi, 1..=3);
    }
}
