//! Sparse multivariate polynomials with exact rational coefficients.
//!
//! Atoms behave as independent variables: identifiers, symbolic powers
//! such as `x^(y)` and opaque calls such as `f(x + 1)`. Ring operations
//! keep every exponent non-negative; negative exponents only appear when a
//! quotient with a monomial denominator is folded for rendering.

use std::cmp::{Ordering, Reverse};
use std::collections::{BTreeMap, BTreeSet};

use super::quotient::Quotient;
use super::rational::{self, Rational};
use super::{NormalizeError, NormalizeResult};

/// Largest exponent expanded for a multi-term base.
const MAX_EXPANDED_POWER: i64 = 32;

/// An indivisible factor of a monomial.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Atom {
    /// A plain identifier.
    Var(String),
    /// `base^(exponent)` where the exponent is not a literal integer.
    Power { base: Quotient, exponent: Quotient },
    /// A function call rendered verbatim, e.g. `f(x + 1)`.
    Opaque(String),
}

impl Atom {
    fn render(&self, count: i64) -> String {
        let base = match self {
            Atom::Var(name) | Atom::Opaque(name) => name.clone(),
            Atom::Power { base, exponent } => {
                let power = format!("{}^({})", base.render_as_base(), exponent.render());
                if count == 1 {
                    return power;
                }
                format!("({power})")
            }
        };
        if count == 1 {
            base
        } else {
            format!("{base}^{count}")
        }
    }
}

pub type Monomial = BTreeMap<Atom, i64>;

fn degree(monomial: &Monomial) -> i128 {
    monomial.values().map(|&e| i128::from(e)).sum()
}

/// Graded lexicographic order: total degree first, then the exponent of
/// the first atom where the two monomials differ.
fn grlex(a: &Monomial, b: &Monomial) -> Ordering {
    degree(a).cmp(&degree(b)).then_with(|| {
        let atoms: BTreeSet<&Atom> = a.keys().chain(b.keys()).collect();
        for atom in atoms {
            let ea = a.get(atom).copied().unwrap_or(0);
            let eb = b.get(atom).copied().unwrap_or(0);
            if ea != eb {
                return ea.cmp(&eb);
            }
        }
        Ordering::Equal
    })
}

fn mul_monomials(a: &Monomial, b: &Monomial) -> NormalizeResult<Monomial> {
    let mut out = a.clone();
    for (atom, exp) in b {
        let entry = out.entry(atom.clone()).or_insert(0);
        *entry = entry.checked_add(*exp).ok_or(NormalizeError::Overflow)?;
        if *entry == 0 {
            out.remove(atom);
        }
    }
    Ok(out)
}

/// `a / b` when every exponent of `b` fits inside `a`.
fn monomial_quotient(a: &Monomial, b: &Monomial) -> Option<Monomial> {
    let mut out = a.clone();
    for (atom, exp) in b {
        let have = out.get(atom).copied().unwrap_or(0);
        if have < *exp {
            return None;
        }
        if have == *exp {
            out.remove(atom);
        } else {
            out.insert(atom.clone(), have - exp);
        }
    }
    Some(out)
}

/// A sum of monomials with non-zero rational coefficients.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Poly {
    terms: BTreeMap<Monomial, Rational>,
}

impl Poly {
    pub fn zero() -> Self {
        Self {
            terms: BTreeMap::new(),
        }
    }

    pub fn one() -> Self {
        Self::constant(Rational::ONE)
    }

    pub fn constant(value: Rational) -> Self {
        let mut poly = Self::zero();
        if !value.is_zero() {
            poly.terms.insert(Monomial::new(), value);
        }
        poly
    }

    pub fn atom(atom: Atom) -> Self {
        let mut monomial = Monomial::new();
        monomial.insert(atom, 1);
        Self::monomial(monomial)
    }

    pub fn monomial(monomial: Monomial) -> Self {
        let mut poly = Self::zero();
        poly.terms.insert(monomial, Rational::ONE);
        poly
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_zero(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn is_one(&self) -> bool {
        self.as_constant().is_some_and(|c| c.is_one())
    }

    pub fn terms(&self) -> impl Iterator<Item = (&Monomial, &Rational)> {
        self.terms.iter()
    }

    /// The value of a constant polynomial.
    pub fn as_constant(&self) -> Option<Rational> {
        match self.terms.len() {
            0 => Some(Rational::ZERO),
            1 => self.terms.get(&Monomial::new()).copied(),
            _ => None,
        }
    }

    pub fn single_term(&self) -> Option<(&Monomial, &Rational)> {
        if self.terms.len() == 1 {
            self.terms.iter().next()
        } else {
            None
        }
    }

    /// Every atom that occurs in some term.
    pub fn atoms(&self) -> BTreeSet<&Atom> {
        self.terms.keys().flat_map(|m| m.keys()).collect()
    }

    pub fn has_powers(&self) -> bool {
        self.atoms()
            .into_iter()
            .any(|a| matches!(a, Atom::Power { .. }))
    }

    /// The term that is largest in graded lexicographic order.
    pub fn leading(&self) -> Option<(&Monomial, &Rational)> {
        self.terms.iter().max_by(|(a, _), (b, _)| grlex(a, b))
    }

    pub fn degree_in(&self, atom: &Atom) -> i64 {
        self.terms
            .keys()
            .map(|m| m.get(atom).copied().unwrap_or(0))
            .max()
            .unwrap_or(0)
    }

    /// The coefficient of `atom^k`, as a polynomial in the other atoms.
    pub fn coefficient_of(&self, atom: &Atom, k: i64) -> Self {
        let mut out = Self::zero();
        for (monomial, coeff) in &self.terms {
            if monomial.get(atom).copied().unwrap_or(0) == k {
                let mut rest = monomial.clone();
                rest.remove(atom);
                out.terms.insert(rest, *coeff);
            }
        }
        out
    }

    /// All non-zero coefficients of `atom^k`.
    pub fn coefficients_in(&self, atom: &Atom) -> Vec<Self> {
        let mut by_power: BTreeMap<i64, Self> = BTreeMap::new();
        for (monomial, coeff) in &self.terms {
            let mut rest = monomial.clone();
            let k = rest.remove(atom).unwrap_or(0);
            by_power.entry(k).or_insert_with(Self::zero).terms.insert(rest, *coeff);
        }
        by_power.into_values().collect()
    }

    /// Atoms present in every term, with their smallest exponent.
    pub fn common_factor(&self) -> Monomial {
        let mut terms = self.terms.keys();
        let Some(first) = terms.next() else {
            return Monomial::new();
        };
        let mut common = first.clone();
        for monomial in terms {
            common.retain(|atom, exp| match monomial.get(atom) {
                Some(other) => {
                    *exp = (*exp).min(*other);
                    true
                }
                None => false,
            });
        }
        common
    }

    /// Positive rational content: gcd of numerators over lcm of denominators.
    pub fn content(&self) -> NormalizeResult<Rational> {
        let mut num = 0_i128;
        let mut den = 1_i128;
        for coeff in self.terms.values() {
            num = rational::gcd(num, coeff.numer());
            den = rational::lcm(den, coeff.denom()).ok_or(NormalizeError::Overflow)?;
        }
        if num == 0 {
            return Ok(Rational::ONE);
        }
        Rational::new(num, den).ok_or(NormalizeError::Overflow)
    }

    /// The content signed like the leading coefficient, so that dividing by
    /// it leaves coprime integer coefficients and a positive leading term.
    pub fn unit(&self) -> NormalizeResult<Rational> {
        let content = self.content()?;
        match self.leading() {
            Some((_, lead)) if lead.is_negative() => {
                content.checked_neg().ok_or(NormalizeError::Overflow)
            }
            _ => Ok(content),
        }
    }

    pub fn scale(&self, factor: &Rational) -> NormalizeResult<Self> {
        if factor.is_zero() {
            return Ok(Self::zero());
        }
        let mut out = Self::zero();
        for (monomial, coeff) in &self.terms {
            let scaled = coeff.checked_mul(factor).ok_or(NormalizeError::Overflow)?;
            out.terms.insert(monomial.clone(), scaled);
        }
        Ok(out)
    }

    /// Scale by the inverse of the rational content.
    pub fn primitive(&self) -> NormalizeResult<Self> {
        let inverse = self.content()?.recip().ok_or(NormalizeError::DivisionByZero)?;
        self.scale(&inverse)
    }

    pub fn add_term(&mut self, monomial: Monomial, coeff: Rational) -> NormalizeResult<()> {
        let sum = match self.terms.get(&monomial) {
            Some(existing) => existing.checked_add(&coeff).ok_or(NormalizeError::Overflow)?,
            None => coeff,
        };
        if sum.is_zero() {
            self.terms.remove(&monomial);
        } else {
            self.terms.insert(monomial, sum);
        }
        Ok(())
    }

    pub fn check_budget(self, max_terms: usize) -> NormalizeResult<Self> {
        if self.terms.len() > max_terms {
            return Err(NormalizeError::TooManyTerms { limit: max_terms });
        }
        Ok(self)
    }

    pub fn add(&self, other: &Self, max_terms: usize) -> NormalizeResult<Self> {
        let mut out = self.clone();
        for (monomial, coeff) in &other.terms {
            out.add_term(monomial.clone(), *coeff)?;
        }
        out.check_budget(max_terms)
    }

    pub fn neg(&self) -> NormalizeResult<Self> {
        self.scale(&Rational::integer(-1))
    }

    pub fn sub(&self, other: &Self, max_terms: usize) -> NormalizeResult<Self> {
        self.add(&other.neg()?, max_terms)
    }

    pub fn mul(&self, other: &Self, max_terms: usize) -> NormalizeResult<Self> {
        let mut out = Self::zero();
        for (ma, ca) in &self.terms {
            for (mb, cb) in &other.terms {
                let monomial = mul_monomials(ma, mb)?;
                let coeff = ca.checked_mul(cb).ok_or(NormalizeError::Overflow)?;
                out.add_term(monomial, coeff)?;
            }
            if out.terms.len() > max_terms {
                return Err(NormalizeError::TooManyTerms { limit: max_terms });
            }
        }
        out.check_budget(max_terms)
    }

    /// Raise to a non-negative integer power.
    pub fn pow(&self, exponent: i64, max_terms: usize) -> NormalizeResult<Self> {
        if exponent == 0 {
            return Ok(Self::one());
        }
        if let Some((monomial, coeff)) = self.single_term() {
            let mut raised = Monomial::new();
            for (atom, exp) in monomial {
                let e = exp.checked_mul(exponent).ok_or(NormalizeError::Overflow)?;
                raised.insert(atom.clone(), e);
            }
            let coeff = coeff
                .checked_pow(exponent)
                .ok_or(NormalizeError::Overflow)?;
            let mut out = Self::zero();
            out.terms.insert(raised, coeff);
            return Ok(out);
        }
        if self.is_zero() {
            return Ok(Self::zero());
        }
        if exponent > MAX_EXPANDED_POWER {
            return Err(NormalizeError::ExponentTooLarge { exponent });
        }

        let mut out = Self::one();
        for _ in 0..exponent {
            out = out.mul(self, max_terms)?;
        }
        Ok(out)
    }

    /// Exact division. `Ok(None)` when `divisor` leaves a remainder.
    pub fn div_exact(&self, divisor: &Self, max_terms: usize) -> NormalizeResult<Option<Self>> {
        let Some((lead_m, lead_c)) = divisor.leading() else {
            return Err(NormalizeError::DivisionByZero);
        };
        let mut quotient = Self::zero();
        let mut rest = self.clone();
        while let Some((m, c)) = rest.leading().map(|(m, c)| (m.clone(), *c)) {
            let Some(shift) = monomial_quotient(&m, lead_m) else {
                return Ok(None);
            };
            let coeff = c.checked_div(lead_c).ok_or(NormalizeError::Overflow)?;
            let mut step = Self::zero();
            step.terms.insert(shift.clone(), coeff);
            rest = rest.sub(&step.mul(divisor, max_terms)?, max_terms)?;
            quotient.add_term(shift, coeff)?;
            quotient = quotient.check_budget(max_terms)?;
        }
        Ok(Some(quotient))
    }

    /// Divide every term by a monomial that each of them contains.
    pub fn div_monomial(&self, divisor: &Monomial) -> NormalizeResult<Self> {
        let mut out = Self::zero();
        for (monomial, coeff) in &self.terms {
            let reduced =
                monomial_quotient(monomial, divisor).ok_or(NormalizeError::InexactDivision)?;
            out.terms.insert(reduced, *coeff);
        }
        Ok(out)
    }

    /// Move a monomial into negative exponents of every term.
    pub fn fold_denominator(&self, divisor: &Monomial, coeff: &Rational) -> NormalizeResult<Self> {
        let mut inverse = Monomial::new();
        for (atom, exp) in divisor {
            inverse.insert(atom.clone(), exp.checked_neg().ok_or(NormalizeError::Overflow)?);
        }
        let factor = coeff.recip().ok_or(NormalizeError::DivisionByZero)?;
        let mut out = Self::zero();
        for (monomial, c) in &self.terms {
            let scaled = c.checked_mul(&factor).ok_or(NormalizeError::Overflow)?;
            out.add_term(mul_monomials(monomial, &inverse)?, scaled)?;
        }
        Ok(out)
    }

    pub fn has_fractional_coefficients(&self) -> bool {
        self.terms.values().any(|c| c.denom() != 1)
    }

    /// Deterministic infix rendering.
    ///
    /// Terms are ordered by descending total degree, then by their atoms.
    /// Unit coefficients are omitted and negative exponents render as
    /// division, e.g. `x^2 + 2*x + 1` or `3*x/2 - 1/y`.
    pub fn render(&self) -> String {
        if self.terms.is_empty() {
            return "0".to_string();
        }

        let mut ordered: Vec<(&Monomial, &Rational)> = self.terms.iter().collect();
        ordered.sort_by(|(a, _), (b, _)| {
            Reverse(degree(a))
                .cmp(&Reverse(degree(b)))
                .then_with(|| a.cmp(b))
        });

        let mut out = String::new();
        for (i, (monomial, coeff)) in ordered.into_iter().enumerate() {
            let body = render_term(monomial, &coeff.abs());
            match (i, coeff.is_negative()) {
                (0, false) => out.push_str(&body),
                (0, true) => {
                    out.push('-');
                    out.push_str(&body);
                }
                (_, false) => {
                    out.push_str(" + ");
                    out.push_str(&body);
                }
                (_, true) => {
                    out.push_str(" - ");
                    out.push_str(&body);
                }
            }
        }
        out
    }
}

fn render_term(monomial: &Monomial, coeff: &Rational) -> String {
    let mut numerator: Vec<String> = Vec::new();
    let mut denominator: Vec<String> = Vec::new();

    let positive: Vec<String> = monomial
        .iter()
        .filter(|(_, e)| **e > 0)
        .map(|(atom, e)| atom.render(*e))
        .collect();
    let negative: Vec<String> = monomial
        .iter()
        .filter(|(_, e)| **e < 0)
        .map(|(atom, e)| atom.render(-*e))
        .collect();

    if coeff.numer() != 1 || positive.is_empty() {
        numerator.push(coeff.numer().to_string());
    }
    numerator.extend(positive);

    if coeff.denom() != 1 {
        denominator.push(coeff.denom().to_string());
    }
    denominator.extend(negative);

    let numerator = numerator.join("*");
    match denominator.len() {
        0 => numerator,
        1 => format!("{numerator}/{}", denominator[0]),
        _ => format!("{numerator}/({})", denominator.join("*")),
    }
}
