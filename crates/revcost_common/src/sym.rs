//! Symbolic integers for bitwidths and gate counts.
//!
//! A [`SymInt`] is a polynomial over named symbols with exact rational
//! coefficients, kept in a canonical expanded form. Two `SymInt`s compare
//! equal exactly when they denote the same polynomial, so counts produced by
//! different decomposition paths merge without a simplifier. Concrete values
//! are the constant polynomials.

use num_traits::{One, Zero};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub};
use std::str::FromStr;

/// Symbol bindings used when evaluating a [`SymInt`].
pub type Bindings = HashMap<String, i64>;

/// Errors raised when parsing or evaluating symbolic integers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SymError {
    /// A symbol had no binding during evaluation.
    #[error("unbound symbol `{0}`")]
    Unbound(String),

    /// Evaluation produced a fractional value.
    #[error("expression `{0}` does not evaluate to an integer")]
    NonInteger(String),

    /// Evaluation overflowed 64-bit arithmetic.
    #[error("expression `{0}` overflows 64-bit arithmetic")]
    Overflow(String),

    /// The text is neither an integer literal nor an identifier.
    #[error("cannot parse `{0}` as an integer or symbol")]
    Parse(String),
}

/// An exact rational number in lowest terms with a positive denominator.
///
/// The derived ordering is structural (numerator, then denominator) and only
/// serves to give [`SymInt`] a total order.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Rational {
    num: i128,
    den: i128,
}

impl Rational {
    /// Creates `num / den` reduced to lowest terms.
    ///
    /// # Panics
    ///
    /// Panics if `den` is zero.
    pub fn new(num: i128, den: i128) -> Self {
        assert!(den != 0, "zero denominator");
        let sign = if den < 0 { -1 } else { 1 };
        let g = gcd(num, den).max(1);
        Self {
            num: sign * num / g,
            den: sign * den / g,
        }
    }

    /// Creates an integral rational.
    pub fn integer(value: i128) -> Self {
        Self { num: value, den: 1 }
    }

    /// Returns the numerator.
    pub fn numer(&self) -> i128 {
        self.num
    }

    /// Returns the (positive) denominator.
    pub fn denom(&self) -> i128 {
        self.den
    }

    /// Returns `true` if the denominator is one.
    pub fn is_integer(&self) -> bool {
        self.den == 1
    }

    /// Returns `true` if the value is strictly negative.
    pub fn is_negative(&self) -> bool {
        self.num < 0
    }

    /// Returns the absolute value.
    pub fn abs(self) -> Self {
        Self {
            num: self.num.abs(),
            den: self.den,
        }
    }

    fn checked_add(self, rhs: Self) -> Option<Self> {
        let num = self
            .num
            .checked_mul(rhs.den)?
            .checked_add(rhs.num.checked_mul(self.den)?)?;
        let den = self.den.checked_mul(rhs.den)?;
        Some(Self::new(num, den))
    }

    fn checked_mul(self, rhs: Self) -> Option<Self> {
        let num = self.num.checked_mul(rhs.num)?;
        let den = self.den.checked_mul(rhs.den)?;
        Some(Self::new(num, den))
    }
}

fn gcd(a: i128, b: i128) -> i128 {
    let (mut a, mut b) = (a.abs(), b.abs());
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

impl Add for Rational {
    type Output = Rational;

    fn add(self, rhs: Rational) -> Rational {
        Rational::new(self.num * rhs.den + rhs.num * self.den, self.den * rhs.den)
    }
}

impl Mul for Rational {
    type Output = Rational;

    fn mul(self, rhs: Rational) -> Rational {
        Rational::new(self.num * rhs.num, self.den * rhs.den)
    }
}

impl Neg for Rational {
    type Output = Rational;

    fn neg(self) -> Rational {
        Rational {
            num: -self.num,
            den: self.den,
        }
    }
}

impl Zero for Rational {
    fn zero() -> Self {
        Self::integer(0)
    }

    fn is_zero(&self) -> bool {
        self.num == 0
    }
}

impl One for Rational {
    fn one() -> Self {
        Self::integer(1)
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.den == 1 {
            write!(f, "{}", self.num)
        } else {
            write!(f, "{}/{}", self.num, self.den)
        }
    }
}

impl fmt::Debug for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

/// A product of symbols raised to positive powers, sorted by symbol name.
#[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
struct Monomial(Vec<(String, u32)>);

impl Monomial {
    fn symbol(name: String) -> Self {
        Self(vec![(name, 1)])
    }

    fn is_unit(&self) -> bool {
        self.0.is_empty()
    }

    fn degree(&self) -> u32 {
        self.0.iter().map(|(_, e)| e).sum()
    }

    fn times(&self, other: &Monomial) -> Monomial {
        let mut powers: BTreeMap<String, u32> = self.0.iter().cloned().collect();
        for (name, exp) in &other.0 {
            *powers.entry(name.clone()).or_insert(0) += exp;
        }
        Monomial(powers.into_iter().collect())
    }
}

impl fmt::Display for Monomial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (name, exp)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("*")?;
            }
            if *exp == 1 {
                write!(f, "{name}")?;
            } else {
                write!(f, "{name}**{exp}")?;
            }
        }
        Ok(())
    }
}

/// A symbolic integer: a polynomial in named symbols with rational coefficients.
///
/// Stored as a list of `(monomial, coefficient)` terms sorted by monomial with
/// no zero coefficients, which makes derived equality, ordering and hashing
/// structural on the canonical form.
#[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SymInt {
    terms: Vec<(Monomial, Rational)>,
}

impl SymInt {
    /// Creates a concrete integer.
    pub fn lit(value: i64) -> Self {
        Self::from_rational(Rational::integer(value as i128))
    }

    /// Creates a free symbol such as `n`.
    pub fn symbol(name: impl Into<String>) -> Self {
        Self {
            terms: vec![(Monomial::symbol(name.into()), Rational::one())],
        }
    }

    fn from_rational(value: Rational) -> Self {
        if value.is_zero() {
            Self::default()
        } else {
            Self {
                terms: vec![(Monomial::default(), value)],
            }
        }
    }

    fn from_map(map: BTreeMap<Monomial, Rational>) -> Self {
        Self {
            terms: map.into_iter().filter(|(_, c)| !c.is_zero()).collect(),
        }
    }

    fn to_map(&self) -> BTreeMap<Monomial, Rational> {
        self.terms.iter().cloned().collect()
    }

    /// Returns `true` if no symbol occurs in the expression.
    pub fn is_concrete(&self) -> bool {
        self.terms.iter().all(|(m, _)| m.is_unit())
    }

    /// Returns the value as an `i64` if it is a concrete integer that fits.
    pub fn as_i64(&self) -> Option<i64> {
        match self.terms.as_slice() {
            [] => Some(0),
            [(m, c)] if m.is_unit() && c.is_integer() => i64::try_from(c.numer()).ok(),
            _ => None,
        }
    }

    /// Returns the value as a `u32` if it is a concrete non-negative integer that fits.
    pub fn as_u32(&self) -> Option<u32> {
        self.as_i64().and_then(|v| u32::try_from(v).ok())
    }

    /// Returns `true` if the expression is a concrete value `<= 0`.
    pub fn is_known_non_positive(&self) -> bool {
        match self.terms.as_slice() {
            [] => true,
            [(m, c)] if m.is_unit() => c.is_negative(),
            _ => false,
        }
    }

    /// Returns the names of all symbols occurring in the expression.
    pub fn free_symbols(&self) -> BTreeSet<&str> {
        self.terms
            .iter()
            .flat_map(|(m, _)| m.0.iter().map(|(name, _)| name.as_str()))
            .collect()
    }

    /// Raises the expression to a non-negative integer power.
    pub fn pow(&self, exp: u32) -> Self {
        let mut result = Self::one();
        for _ in 0..exp {
            result = &result * self;
        }
        result
    }

    /// Divides the expression by two.
    pub fn half(&self) -> Self {
        let half = Rational::new(1, 2);
        Self::from_map(self.terms.iter().map(|(m, c)| (m.clone(), *c * half)).collect())
    }

    /// Substitutes the bound symbols, leaving unbound ones symbolic.
    pub fn subs(&self, bindings: &Bindings) -> Self {
        let mut total = Self::zero();
        for (mono, coeff) in &self.terms {
            let mut term = Self::from_rational(*coeff);
            for (name, exp) in &mono.0 {
                let factor = match bindings.get(name) {
                    Some(value) => Self::lit(*value),
                    None => Self::symbol(name.clone()),
                };
                term = &term * &factor.pow(*exp);
            }
            total += term;
        }
        total
    }

    /// Evaluates the expression to an integer with every symbol bound.
    pub fn eval(&self, bindings: &Bindings) -> Result<i64, SymError> {
        let overflow = || SymError::Overflow(self.to_string());
        let mut total = Rational::zero();
        for (mono, coeff) in &self.terms {
            let mut term = *coeff;
            for (name, exp) in &mono.0 {
                let value = bindings
                    .get(name)
                    .ok_or_else(|| SymError::Unbound(name.clone()))?;
                let power = (*value as i128).checked_pow(*exp).ok_or_else(overflow)?;
                term = term
                    .checked_mul(Rational::integer(power))
                    .ok_or_else(overflow)?;
            }
            total = total.checked_add(term).ok_or_else(overflow)?;
        }
        if !total.is_integer() {
            return Err(SymError::NonInteger(self.to_string()));
        }
        i64::try_from(total.numer()).map_err(|_| overflow())
    }
}

impl FromStr for SymInt {
    type Err = SymError;

    /// Parses an integer literal (`64`, `-3`) or an identifier (`n`, `k_bits`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(value) = s.parse::<i64>() {
            return Ok(Self::lit(value));
        }
        let mut chars = s.chars();
        let valid = chars
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
        if valid {
            Ok(Self::symbol(s))
        } else {
            Err(SymError::Parse(s.to_string()))
        }
    }
}

impl From<i64> for SymInt {
    fn from(value: i64) -> Self {
        Self::lit(value)
    }
}

impl From<u32> for SymInt {
    fn from(value: u32) -> Self {
        Self::lit(value as i64)
    }
}

impl From<usize> for SymInt {
    fn from(value: usize) -> Self {
        Self::from_rational(Rational::integer(value as i128))
    }
}

impl From<u64> for SymInt {
    fn from(value: u64) -> Self {
        Self::from_rational(Rational::integer(value as i128))
    }
}

impl Add<&SymInt> for &SymInt {
    type Output = SymInt;

    fn add(self, rhs: &SymInt) -> SymInt {
        let mut map = self.to_map();
        for (mono, coeff) in &rhs.terms {
            let entry = map.entry(mono.clone()).or_insert_with(Rational::zero);
            *entry = *entry + *coeff;
        }
        SymInt::from_map(map)
    }
}

impl Add for SymInt {
    type Output = SymInt;

    fn add(self, rhs: SymInt) -> SymInt {
        &self + &rhs
    }
}

impl AddAssign for SymInt {
    fn add_assign(&mut self, rhs: SymInt) {
        *self = &*self + &rhs;
    }
}

impl AddAssign<&SymInt> for SymInt {
    fn add_assign(&mut self, rhs: &SymInt) {
        *self = &*self + rhs;
    }
}

impl Neg for &SymInt {
    type Output = SymInt;

    fn neg(self) -> SymInt {
        SymInt {
            terms: self.terms.iter().map(|(m, c)| (m.clone(), -*c)).collect(),
        }
    }
}

impl Neg for SymInt {
    type Output = SymInt;

    fn neg(self) -> SymInt {
        -&self
    }
}

impl Sub<&SymInt> for &SymInt {
    type Output = SymInt;

    fn sub(self, rhs: &SymInt) -> SymInt {
        self + &(-rhs)
    }
}

impl Sub for SymInt {
    type Output = SymInt;

    fn sub(self, rhs: SymInt) -> SymInt {
        &self - &rhs
    }
}

impl Mul<&SymInt> for &SymInt {
    type Output = SymInt;

    fn mul(self, rhs: &SymInt) -> SymInt {
        let mut map: BTreeMap<Monomial, Rational> = BTreeMap::new();
        for (ma, ca) in &self.terms {
            for (mb, cb) in &rhs.terms {
                let entry = map.entry(ma.times(mb)).or_insert_with(Rational::zero);
                *entry = *entry + *ca * *cb;
            }
        }
        SymInt::from_map(map)
    }
}

impl Mul for SymInt {
    type Output = SymInt;

    fn mul(self, rhs: SymInt) -> SymInt {
        &self * &rhs
    }
}

impl Mul<i64> for &SymInt {
    type Output = SymInt;

    fn mul(self, rhs: i64) -> SymInt {
        self * &SymInt::lit(rhs)
    }
}

impl Mul<i64> for SymInt {
    type Output = SymInt;

    fn mul(self, rhs: i64) -> SymInt {
        &self * &SymInt::lit(rhs)
    }
}

impl Sum for SymInt {
    fn sum<I: Iterator<Item = SymInt>>(iter: I) -> Self {
        iter.fold(SymInt::zero(), |acc, x| acc + x)
    }
}

impl<'a> Sum<&'a SymInt> for SymInt {
    fn sum<I: Iterator<Item = &'a SymInt>>(iter: I) -> Self {
        iter.fold(SymInt::zero(), |acc, x| &acc + x)
    }
}

impl Zero for SymInt {
    fn zero() -> Self {
        Self::default()
    }

    fn is_zero(&self) -> bool {
        self.terms.is_empty()
    }
}

impl One for SymInt {
    fn one() -> Self {
        Self::lit(1)
    }
}

impl fmt::Display for SymInt {
    /// Highest total degree first, constant last: `4*n - 4`, `m**2/2 - m/2`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.terms.is_empty() {
            return f.write_str("0");
        }
        let mut ordered: Vec<&(Monomial, Rational)> = self.terms.iter().collect();
        ordered.sort_by(|(ma, _), (mb, _)| mb.degree().cmp(&ma.degree()).then_with(|| ma.cmp(mb)));
        for (i, (mono, coeff)) in ordered.into_iter().enumerate() {
            match (i, coeff.is_negative()) {
                (0, true) => f.write_str("-")?,
                (0, false) => {}
                (_, true) => f.write_str(" - ")?,
                (_, false) => f.write_str(" + ")?,
            }
            let abs = coeff.abs();
            if mono.is_unit() {
                write!(f, "{abs}")?;
                continue;
            }
            if abs.numer() != 1 {
                write!(f, "{}*", abs.numer())?;
            }
            write!(f, "{mono}")?;
            if abs.denom() != 1 {
                write!(f, "/{}", abs.denom())?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for SymInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SymInt({self})")
    }
}
