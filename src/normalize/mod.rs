//! Algebraic expression normalization via e-graphs (egg).
//!
//! An expression string is parsed into [`ExprLang`], simplified by equality
//! saturation over [`simplification_rules`], and the best extracted term is
//! flattened into a reduced fraction of polynomials ([`quotient`]) and
//! rendered back to text. Equivalent inputs such as `2x+2` and `2*(x+1)`,
//! or `1/(1-x)` and `-1/(x-1)`, render to the same string.
//!
//! [`normalize`] is total: any failure falls back to the trimmed input.

pub mod parser;
pub mod poly;
pub mod quotient;
pub mod rational;

use egg::{AstSize, EGraph, Extractor, Id, RecExpr, Rewrite, Runner, Subst, Var, define_language, rewrite};
use miette::Diagnostic;
use thiserror::Error;

use crate::config::NormalizerConfig;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Reasons an expression could not be normalized.
///
/// These never escape [`normalize`] or [`Normalizer::normalize`]; they are
/// available through [`Normalizer::try_normalize`] for diagnostics.
#[derive(Debug, Clone, PartialEq, Error, Diagnostic)]
pub enum NormalizeError {
    #[error("expression is empty")]
    #[diagnostic(code(concord::normalize::empty))]
    Empty,

    #[error("unexpected character '{ch}' at offset {offset}")]
    #[diagnostic(
        code(concord::normalize::unexpected_char),
        help("Only identifiers, integers, decimals, parentheses and + - * / ^ are understood.")
    )]
    UnexpectedChar { ch: char, offset: usize },

    #[error("unexpected token \"{token}\" at offset {offset}")]
    #[diagnostic(
        code(concord::normalize::unexpected_token),
        help("Adjacent identifiers need an explicit operator between them.")
    )]
    UnexpectedToken { token: String, offset: usize },

    #[error("expression ended unexpectedly")]
    #[diagnostic(
        code(concord::normalize::unexpected_end),
        help("Check for a dangling operator or an unclosed parenthesis.")
    )]
    UnexpectedEnd,

    #[error("invalid numeric literal \"{literal}\"")]
    #[diagnostic(
        code(concord::normalize::invalid_literal),
        help("Integer literals must fit in 64 bits; decimals take at most 18 fractional digits.")
    )]
    InvalidLiteral { literal: String },

    #[error("division by zero")]
    #[diagnostic(code(concord::normalize::division_by_zero))]
    DivisionByZero,

    #[error("arithmetic overflow while simplifying")]
    #[diagnostic(code(concord::normalize::overflow))]
    Overflow,

    #[error("expansion exceeded {limit} terms")]
    #[diagnostic(
        code(concord::normalize::too_many_terms),
        help("Raise `normalizer.max_terms` to expand larger polynomials.")
    )]
    TooManyTerms { limit: usize },

    #[error("polynomial division left a remainder")]
    #[diagnostic(code(concord::normalize::inexact_division))]
    InexactDivision,

    #[error("exponent {exponent} is too large to expand")]
    #[diagnostic(code(concord::normalize::exponent_too_large))]
    ExponentTooLarge { exponent: i64 },
}

pub type NormalizeResult<T> = std::result::Result<T, NormalizeError>;

// ---------------------------------------------------------------------------
// Language and rules
// ---------------------------------------------------------------------------

define_language! {
    /// Arithmetic expressions over named variables.
    ///
    /// - `Num(n)`: an integer literal (decimals are parsed as `(/ m 10^k)`)
    /// - `+ - * / ^`: binary arithmetic
    /// - `neg`: unary minus
    /// - `call`: function application `f(x)`, kept opaque
    pub enum ExprLang {
        Num(i64),

        "+" = Add([egg::Id; 2]),
        "-" = Sub([egg::Id; 2]),
        "*" = Mul([egg::Id; 2]),
        "/" = Div([egg::Id; 2]),
        "^" = Pow([egg::Id; 2]),
        "neg" = Neg([egg::Id; 1]),
        "call" = Call([egg::Id; 2]),

        Symbol(egg::Symbol),
    }
}

/// Rule guard: the e-class bound to `var` does not contain the literal `0`.
fn is_not_zero(var: &str) -> impl Fn(&mut EGraph<ExprLang, ()>, Id, &Subst) -> bool {
    let var: Var = var.parse().unwrap();
    let zero = ExprLang::Num(0);
    move |egraph, _, subst| !egraph[subst[var]].nodes.contains(&zero)
}

/// Rewrite rules used for simplification before canonical flattening.
///
/// Commutativity and associativity let the identities below fire regardless
/// of operand order. Cancellation of common factors is left to the
/// polynomial gcd in [`quotient`].
pub fn simplification_rules() -> Vec<Rewrite<ExprLang, ()>> {
    vec![
        rewrite!("add-commute"; "(+ ?a ?b)" => "(+ ?b ?a)"),
        rewrite!("mul-commute"; "(* ?a ?b)" => "(* ?b ?a)"),
        rewrite!("add-assoc"; "(+ ?a (+ ?b ?c))" => "(+ (+ ?a ?b) ?c)"),
        rewrite!("mul-assoc"; "(* ?a (* ?b ?c))" => "(* (* ?a ?b) ?c)"),
        rewrite!("add-zero"; "(+ ?a 0)" => "?a"),
        rewrite!("mul-zero"; "(* ?a 0)" => "0"),
        rewrite!("mul-one"; "(* ?a 1)" => "?a"),
        rewrite!("sub-zero"; "(- ?a 0)" => "?a"),
        rewrite!("sub-self"; "(- ?a ?a)" => "0"),
        rewrite!("sub-neg"; "(- ?a (neg ?b))" => "(+ ?a ?b)"),
        rewrite!("neg-neg"; "(neg (neg ?a))" => "?a"),
        rewrite!("div-one"; "(/ ?a 1)" => "?a"),
        rewrite!("div-self"; "(/ ?a ?a)" => "1" if is_not_zero("?a")),
        rewrite!("div-cancel"; "(/ (* ?a ?b) ?b)" => "?a" if is_not_zero("?b")),
        rewrite!("pow-zero"; "(^ ?a 0)" => "1"),
        rewrite!("pow-one"; "(^ ?a 1)" => "?a"),
    ]
}

// ---------------------------------------------------------------------------
// Normalizer
// ---------------------------------------------------------------------------

/// Expression normalizer with explicit work limits.
pub struct Normalizer {
    config: NormalizerConfig,
    rules: Vec<Rewrite<ExprLang, ()>>,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(NormalizerConfig::default())
    }
}

impl Normalizer {
    pub fn new(config: NormalizerConfig) -> Self {
        Self {
            config,
            rules: simplification_rules(),
        }
    }

    pub fn config(&self) -> &NormalizerConfig {
        &self.config
    }

    /// Normalize, or fall back to the trimmed input on any failure.
    pub fn normalize(&self, input: &str) -> String {
        match self.try_normalize(input) {
            Ok(canonical) => canonical,
            Err(e) => {
                tracing::trace!(input, error = %e, "expression kept as text");
                input.trim().to_string()
            }
        }
    }

    /// Normalize, reporting why an expression was not understood.
    pub fn try_normalize(&self, input: &str) -> NormalizeResult<String> {
        let parsed = parser::parse(input)?;
        let simplified = self.simplify(&parsed);
        let canonical = quotient::from_expr(&simplified, self.config.max_terms)?;
        Ok(canonical.render())
    }

    /// Equality saturation followed by smallest-term extraction.
    fn simplify(&self, expr: &RecExpr<ExprLang>) -> RecExpr<ExprLang> {
        let runner = Runner::default()
            .with_iter_limit(self.config.iter_limit)
            .with_node_limit(self.config.node_limit)
            .with_expr(expr)
            .run(&self.rules);
        let extractor = Extractor::new(&runner.egraph, AstSize);
        let (_, best) = extractor.find_best(runner.roots[0]);
        best
    }
}

/// Normalize with default limits. Never fails.
pub fn normalize(expr: &str) -> String {
    Normalizer::default().normalize(expr)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commuted_sums_agree() {
        assert_eq!(normalize("x+1"), normalize("1+x"));
        assert_eq!(normalize("x + 1"), "x + 1");
    }

    #[test]
    fn implicit_and_explicit_products_agree() {
        assert_eq!(normalize("2x+2"), normalize("2*(x+1)"));
        assert_eq!(normalize("2*(x+1)"), "2*x + 2");
    }

    #[test]
    fn square_expansion_agrees() {
        assert_eq!(normalize("(x+1)^2"), normalize("x^2 + 2x + 1"));
    }

    #[test]
    fn grouped_self_division_cancels() {
        assert_eq!(normalize("(x + 1)/(x + 1)"), "1");
        assert_eq!(normalize("(x + 1)*y/(x + 1)"), "y");
    }

    #[test]
    fn equivalent_fractions_agree() {
        assert_eq!(normalize("1/(1-x)"), normalize("-1/(x-1)"));
        assert_eq!(normalize("1/(1-x)"), "-1/(x - 1)");
        assert_eq!(normalize("x/(x+1) + 1/(x+1)"), "1");
        assert_eq!(normalize("(x^2-1)/(x-1)"), "x + 1");
        assert_eq!(normalize("1/(x-1) + 1/(1-x)"), "0");
        assert_eq!(normalize("2/(2x+2)"), "1/(x + 1)");
    }

    #[test]
    fn repeated_symbolic_powers_agree() {
        assert_eq!(normalize("x^y * x^y"), normalize("x^(2*y)"));
        assert_eq!(normalize("x^y*x^y"), "x^(2*y)");
    }

    #[test]
    fn constants_fold() {
        assert_eq!(normalize("2 + 3*4"), "14");
        assert_eq!(normalize(" 2 "), "2");
        assert_eq!(normalize("0.5 + 0.5"), "1");
    }

    #[test]
    fn prose_falls_back_to_trimmed_text() {
        assert_eq!(normalize("  The answer x "), "The answer x");
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   "), "");
    }

    #[test]
    fn zero_division_falls_back() {
        assert_eq!(normalize(" 1/0 "), "1/0");
        assert_eq!(normalize("0/0"), "0/0");
    }

    #[test]
    fn try_normalize_reports_reason() {
        let normalizer = Normalizer::default();
        assert!(matches!(
            normalizer.try_normalize("a b"),
            Err(NormalizeError::UnexpectedToken { .. })
        ));
        assert_eq!(normalizer.try_normalize("x - x").unwrap(), "0");
    }

    #[test]
    fn tight_term_budget_falls_back() {
        let normalizer = Normalizer::new(NormalizerConfig {
            max_terms: 2,
            ..Default::default()
        });
        assert_eq!(normalizer.normalize("(a + b + c)^2"), "(a + b + c)^2");
    }

    #[test]
    fn rules_load() {
        assert!(!simplification_rules().is_empty());
    }
}
