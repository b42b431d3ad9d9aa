//! Integration tests for spigot-core: reference expansions, round trips and
//! exact arithmetic, driven through expressions with in-memory input.

use std::io::Cursor;

use anyhow::Result;
use spigot_core::{
    ApproximationSink, BaseSink, BigInt, BigRational, ContinuedFractionSink, InputSlot, Matrix,
    Operator, RunSummary, Sink, SourceRegistry,
};

// ============================================================================
// Helpers
// ============================================================================

#[derive(Clone, Copy)]
enum Mode {
    Base(u32),
    Cfrac,
    Convergents,
}

fn input(text: &str) -> InputSlot {
    InputSlot::new(Box::new(Cursor::new(text.as_bytes().to_vec())))
}

fn run_with_summary(
    expr: &str,
    mode: Mode,
    limit: Option<u64>,
    stdin: &str,
) -> Result<(String, RunSummary)> {
    let tokens: Vec<&str> = expr.split_whitespace().collect();
    let spec = SourceRegistry::standard().parse(&tokens)?;
    let mut slot = input(stdin);
    let mut spigot = spec.build(&mut slot)?;

    let (bytes, summary) = match mode {
        Mode::Base(radix) => {
            let mut sink = BaseSink::new(Vec::new(), radix)?;
            let summary = sink.run(&mut spigot, limit, true)?;
            (sink.into_inner(), summary)
        }
        Mode::Cfrac | Mode::Convergents => {
            let mut sink =
                ContinuedFractionSink::new(Vec::new(), matches!(mode, Mode::Convergents));
            let summary = sink.run(&mut spigot, limit, true)?;
            (sink.into_inner(), summary)
        }
    };
    Ok((String::from_utf8(bytes)?, summary))
}

fn run(expr: &str, mode: Mode, limit: Option<u64>) -> Result<String> {
    Ok(run_with_summary(expr, mode, limit, "")?.0)
}

fn decimal(expr: &str, limit: u64) -> Result<String> {
    Ok(run(expr, Mode::Base(10), Some(limit))?.trim_end().to_string())
}

fn cfrac_terms(expr: &str, limit: Option<u64>) -> Result<Vec<i64>> {
    let text = run(expr, Mode::Cfrac, limit)?;
    Ok(text
        .lines()
        .map(|l| l.parse())
        .collect::<std::result::Result<_, _>>()?)
}

/// The rational denoted by a finite continued fraction.
fn rebuild(terms: &[i64]) -> BigRational {
    let m = terms.iter().fold(Matrix::identity(), |m, &t| {
        m.compose(&Matrix::new(t, 1, 1, 0))
    });
    BigRational::new(m.p, m.r)
}

fn ratio(n: i64, d: i64) -> BigRational {
    BigRational::new(BigInt::from(n), BigInt::from(d))
}

const PI_300: &str = "3.141592653589793238462643383279502884197169399375105820974944592307816406286208998628034825342117067982148086513282306647093844609550582231725359408128481117450284102701938521105559644622948954930381964428810975665933446128475648233786783165271201909145648566923460348610454326648213393607260249141273";
const E_300: &str = "2.718281828459045235360287471352662497757247093699959574966967627724076630353547594571382178525166427427466391932003059921817413596629043572900334295260595630738132328627943490763233829880753195251019011573834187930702154089149934884167509244761460668082264800168477411853742345442437107539077744992069";
const PHI_300: &str = "1.618033988749894848204586834365638117720309179805762862135448622705260462818902449707207204189391137484754088075386891752126633862223536931793180060766726354433389086595939582905638322661319928290267880675208766892501711696207032221043216269548626296313614438149758701220340805887954454749246185695364";

// ============================================================================
// Reference Expansions
// ============================================================================

#[test]
fn test_pi_three_hundred_decimals() -> Result<()> {
    assert_eq!(decimal("pi", 301)?, PI_300);
    Ok(())
}

#[test]
fn test_e_three_hundred_decimals() -> Result<()> {
    assert_eq!(decimal("e", 301)?, E_300);
    Ok(())
}

#[test]
fn test_phi_three_hundred_decimals() -> Result<()> {
    assert_eq!(decimal("phi", 301)?, PHI_300);
    Ok(())
}

#[test]
fn test_square_root_of_two() -> Result<()> {
    assert_eq!(
        decimal("root 2", 101)?,
        "1.4142135623730950488016887242096980785696718753769480731766797379907324784621070388503875343276415727"
    );
    Ok(())
}

#[test]
fn test_logarithms() -> Result<()> {
    assert_eq!(
        decimal("log 2", 61)?,
        "0.693147180559945309417232121458176568075500134360255254120680"
    );
    assert_eq!(
        decimal("log 10", 61)?,
        "2.302585092994045684017991454684364207601101488628772976033327"
    );
    assert_eq!(
        decimal("log 1/3", 40)?,
        "-1.098612288668109691395245236922525704647"
    );
    assert_eq!(decimal("log 3", 20)?, "1.0986122886681096913");
    assert_eq!(decimal("log 1.5", 20)?, "0.4054651081081643819");
    assert_eq!(decimal("log 0.5", 20)?, "-0.6931471805599453094");
    assert_eq!(decimal("log 1", 20)?, "0");
    Ok(())
}

#[test]
fn test_rational_change_of_base_terminates() -> Result<()> {
    assert_eq!(decimal("logbase 2 8", 5)?, "3");
    assert_eq!(decimal("logbase 10 100", 5)?, "2");
    assert_eq!(decimal("logbase 10 1/100", 5)?, "-2");
    assert_eq!(decimal("logbase 2 1/4", 5)?, "-2");
    assert_eq!(decimal("logbase 4 8", 5)?, "1.5");
    assert_eq!(decimal("logbase 8 4", 5)?, "0.6666");
    assert_eq!(decimal("div log 1000 log 10", 5)?, "3");
    assert_eq!(cfrac_terms("logbase 9 27", None)?, vec![1, 2]);
    // irrational quotients still stream
    assert_eq!(decimal("logbase 2 3", 10)?, "1.584962500");
    Ok(())
}

#[test]
fn test_other_output_bases() -> Result<()> {
    assert_eq!(run("pi", Mode::Base(16), Some(20))?, "3.243f6a8885a308d3131\n");
    assert_eq!(
        run("pi", Mode::Base(2), Some(30))?,
        "11.00100100001111110110101010001\n"
    );
    assert_eq!(run("e", Mode::Base(3), Some(10))?, "2.201101121\n");
    Ok(())
}

// ============================================================================
// Gosper Arithmetic
// ============================================================================

#[test]
fn test_irrational_arithmetic() -> Result<()> {
    assert_eq!(decimal("mul root 2 root 3", 20)?, "2.4494897427831780981");
    assert_eq!(decimal("add pi e", 20)?, "5.8598744820488384738");
    assert_eq!(
        decimal("reciprocal pi", 30)?,
        "0.31830988618379067153776752674"
    );
    assert_eq!(decimal("logbase 7 1000", 20)?, "3.5498839873648149804");
    Ok(())
}

#[test]
fn test_rational_arithmetic_in_decimal() -> Result<()> {
    assert_eq!(run("add frac 1 3 frac 1 6", Mode::Base(10), None)?, "0.5\n");
    assert_eq!(
        run("sub frac 1 6 frac 1 3", Mode::Base(10), Some(10))?,
        "-0.166666666\n"
    );
    assert_eq!(run("div 3 frac 1 4", Mode::Base(10), None)?, "12\n");
    Ok(())
}

#[test]
fn test_operator_grid_is_exact() -> Result<()> {
    let values = [(-9, 4), (-2, 3), (0, 1), (1, 7), (3, 2), (8, 1)];
    for &(xn, xd) in &values {
        for &(yn, yd) in &values {
            for op in Operator::ALL {
                if op == Operator::Div && yn == 0 {
                    continue;
                }
                let x = ratio(xn, xd);
                let y = ratio(yn, yd);
                let expected = match op {
                    Operator::Add => &x + &y,
                    Operator::Sub => &x - &y,
                    Operator::Mul => &x * &y,
                    Operator::Div => &x / &y,
                };
                let expr = format!("{} frac {} {} frac {} {}", op, xn, xd, yn, yd);
                let terms = cfrac_terms(&expr, Some(100))?;
                assert_eq!(rebuild(&terms), expected, "{}", expr);
            }
        }
    }
    Ok(())
}

#[test]
fn test_nested_operators() -> Result<()> {
    // (1/2 + 1/3) * 6 = 5
    assert_eq!(
        run("mul add frac 1 2 frac 1 3 frac 6", Mode::Base(10), None)?,
        "5\n"
    );
    Ok(())
}

// ============================================================================
// Continued Fractions
// ============================================================================

#[test]
fn test_constant_continued_fractions() -> Result<()> {
    assert_eq!(
        cfrac_terms("pi", Some(15))?,
        vec![3, 7, 15, 1, 292, 1, 1, 1, 2, 1, 3, 1, 14, 2, 1]
    );
    assert_eq!(
        cfrac_terms("e", Some(12))?,
        vec![2, 1, 2, 1, 1, 4, 1, 1, 6, 1, 1, 8]
    );
    assert_eq!(cfrac_terms("phi", Some(5))?, vec![1, 1, 1, 1, 1]);
    Ok(())
}

#[test]
fn test_square_root_periodicity() -> Result<()> {
    assert_eq!(cfrac_terms("root 2", Some(8))?, vec![1, 2, 2, 2, 2, 2, 2, 2]);
    assert_eq!(
        cfrac_terms("root 7", Some(9))?,
        vec![2, 1, 1, 1, 4, 1, 1, 1, 4]
    );
    let (text, summary) = run_with_summary("root 4", Mode::Cfrac, Some(10), "")?;
    assert_eq!(text, "2\n");
    assert!(summary.exhausted);
    assert_eq!(cfrac_terms("root 0", None)?, vec![0]);
    assert_eq!(cfrac_terms("root 1", None)?, vec![1]);
    Ok(())
}

#[test]
fn test_convergents_of_pi() -> Result<()> {
    assert_eq!(
        run("pi", Mode::Convergents, Some(5))?,
        "3/1\n22/7\n333/106\n355/113\n103993/33102\n"
    );
    Ok(())
}

#[test]
fn test_cfrac_round_trip() -> Result<()> {
    for (expr, expected) in [("frac 1234 625", "1.9744\n"), ("frac -45 16", "-2.8125\n")] {
        let decimal = run(expr, Mode::Base(10), None)?;
        assert_eq!(decimal, expected);

        let terms = run(expr, Mode::Cfrac, None)?;
        let (rebuilt, summary) = run_with_summary("cfrac", Mode::Base(10), None, &terms)?;
        assert_eq!(rebuilt, decimal, "terms {:?}", terms);
        assert!(summary.exhausted);
    }
    Ok(())
}

// ============================================================================
// Base Input
// ============================================================================

#[test]
fn test_base_idempotence() -> Result<()> {
    for (radix, digits) in [(16u32, "a.c8"), (2, "101.0011"), (8, "7.04"), (10, "0.3125")] {
        let decimal = run_with_summary(&format!("base {}", radix), Mode::Base(10), None, digits)?.0;
        let back = run_with_summary("base 10", Mode::Base(radix), None, &decimal)?.0;
        assert_eq!(back.trim_end(), digits, "via {}", decimal.trim_end());
    }
    Ok(())
}

#[test]
fn test_base_seven_to_decimal() -> Result<()> {
    let (text, _) = run_with_summary("base 7", Mode::Base(10), Some(30), "3.0663651\n")?;
    assert_eq!(text, "3.14159187801972696021944209349\n");
    Ok(())
}

// ============================================================================
// Termination and Signs
// ============================================================================

#[test]
fn test_terminating_expansions_stop() -> Result<()> {
    let cases = [
        ("frac 1 8", 10, "0.125"),
        ("frac 1 8", 2, "0.001"),
        ("frac 3 40", 10, "0.075"),
        ("frac 6 3", 10, "2"),
        ("0x1.8p1", 10, "3"),
        ("ieee 3fb8000000000000", 10, "0.09375"),
    ];
    for (expr, radix, expected) in cases {
        let (text, summary) = run_with_summary(expr, Mode::Base(radix), None, "")?;
        assert_eq!(text.trim_end(), expected, "{}", expr);
        assert!(summary.exhausted);
    }
    Ok(())
}

#[test]
fn test_negative_numbers() -> Result<()> {
    assert_eq!(run("frac -7 2", Mode::Base(10), None)?, "-3.5\n");
    assert_eq!(run("frac -8", Mode::Base(10), None)?, "-8\n");
    assert_eq!(run("frac -1 3", Mode::Base(10), Some(6))?, "-0.33333\n");
    assert_eq!(run("sub 0 pi", Mode::Base(10), Some(6))?, "-3.14159\n");
    Ok(())
}

// ============================================================================
// Approximations
// ============================================================================

#[test]
fn test_approximations_of_phi() -> Result<()> {
    let spec = SourceRegistry::standard().parse(&["phi"])?;
    let mut slot = input("");
    let mut spigot = spec.build(&mut slot)?;

    let denominators = Cursor::new(b"1\n10\n1000\n89\n".to_vec());
    let mut sink = ApproximationSink::new(denominators, Vec::new());
    let summary = sink.run(&mut spigot, None, true)?;
    assert_eq!(summary.digits, 4);
    assert_eq!(String::from_utf8(sink.into_inner())?, "1\n16\n1618\n144\n");
    Ok(())
}
