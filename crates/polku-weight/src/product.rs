// Pair semiring: componentwise operations over two component semirings.

use std::fmt;
use std::io;
use std::str::FromStr;

use crate::textio::{CompositeWeightReader, CompositeWeightWriter, WeightTextConfig};
use crate::{Semiring, WeightError};

/// Product of two semirings, the composite-weight exemplar.
///
/// `plus` and `times` apply componentwise, which preserves the semiring
/// laws of the components. Text I/O goes through the composite
/// reader/writer: components joined by the configured separator, the whole
/// wrapped in the configured parentheses. `Display`/`FromStr` use the
/// default configuration; use [`ProductWeight::to_text`] and
/// [`ProductWeight::parse_with`] for a custom one.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductWeight<A: Semiring, B: Semiring> {
    w1: A,
    w2: B,
}

impl<A: Semiring, B: Semiring> ProductWeight<A, B> {
    pub fn new(w1: A, w2: B) -> Self {
        Self { w1, w2 }
    }

    pub fn value1(&self) -> &A {
        &self.w1
    }

    pub fn value2(&self) -> &B {
        &self.w2
    }

    /// Render with an explicit text configuration.
    pub fn to_text(&self, config: WeightTextConfig) -> String {
        let mut out = String::new();
        let mut w = CompositeWeightWriter::new(&mut out, config);
        // writing into a String cannot fail
        let _ = self.write_text(&mut w);
        out
    }

    /// Parse with an explicit text configuration.
    pub fn parse_with(input: &str, config: WeightTextConfig) -> Result<Self, WeightError> {
        let mut r = CompositeWeightReader::new(input, config);
        let weight = Self::read_text(&mut r)?;
        r.finish()?;
        Ok(weight)
    }
}

impl<A: Semiring, B: Semiring> Semiring for ProductWeight<A, B> {
    fn zero() -> Self {
        Self::new(A::zero(), B::zero())
    }

    fn one() -> Self {
        Self::new(A::one(), B::one())
    }

    fn plus(&self, rhs: &Self) -> Self {
        Self::new(self.w1.plus(&rhs.w1), self.w2.plus(&rhs.w2))
    }

    fn times(&self, rhs: &Self) -> Self {
        Self::new(self.w1.times(&rhs.w1), self.w2.times(&rhs.w2))
    }

    fn is_member(&self) -> bool {
        self.w1.is_member() && self.w2.is_member()
    }

    fn quantize(&self, delta: f32) -> Self {
        Self::new(self.w1.quantize(delta), self.w2.quantize(delta))
    }

    fn approx_eq(&self, rhs: &Self, delta: f32) -> bool {
        self.w1.approx_eq(&rhs.w1, delta) && self.w2.approx_eq(&rhs.w2, delta)
    }

    fn type_name() -> String {
        format!("{}_X_{}", A::type_name(), B::type_name())
    }

    fn write_bytes<Wr: io::Write + ?Sized>(&self, w: &mut Wr) -> io::Result<()> {
        self.w1.write_bytes(w)?;
        self.w2.write_bytes(w)
    }

    fn read_bytes<R: io::Read + ?Sized>(r: &mut R) -> io::Result<Self> {
        let w1 = A::read_bytes(r)?;
        let w2 = B::read_bytes(r)?;
        Ok(Self::new(w1, w2))
    }

    fn write_text<S: fmt::Write>(&self, w: &mut CompositeWeightWriter<S>) -> fmt::Result {
        w.write_begin()?;
        self.w1.write_text(w)?;
        self.w2.write_text(w)?;
        w.write_end()
    }

    fn read_text(r: &mut CompositeWeightReader) -> Result<Self, WeightError> {
        r.read_begin()?;
        let w1 = A::read_text(r)?;
        let w2 = B::read_text(r)?;
        r.read_end()?;
        Ok(Self::new(w1, w2))
    }
}

impl<A: Semiring, B: Semiring> fmt::Display for ProductWeight<A, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut w = CompositeWeightWriter::new(f, WeightTextConfig::default());
        self.write_text(&mut w)
    }
}

impl<A: Semiring, B: Semiring> FromStr for ProductWeight<A, B> {
    type Err = WeightError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_with(s, WeightTextConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tropical::TropicalWeight;
    use crate::DELTA;

    type TT = ProductWeight<TropicalWeight, TropicalWeight>;
    type Nested = ProductWeight<TT, TropicalWeight>;

    fn tt(a: f32, b: f32) -> TT {
        TT::new(TropicalWeight::new(a), TropicalWeight::new(b))
    }

    #[test]
    fn componentwise_algebra() {
        let a = tt(1.0, 4.0);
        let b = tt(3.0, 2.0);
        assert_eq!(a.plus(&b), tt(1.0, 2.0));
        assert_eq!(a.times(&b), tt(4.0, 6.0));
        assert_eq!(a.plus(&TT::zero()), a);
        assert_eq!(a.times(&TT::one()), a);
    }

    #[test]
    fn member_requires_both_components() {
        assert!(tt(1.0, 2.0).is_member());
        assert!(!TT::new(TropicalWeight::no_weight(), TropicalWeight::new(1.0)).is_member());
    }

    #[test]
    fn display_joins_with_default_separator() {
        assert_eq!(tt(1.5, 2.0).to_string(), "1.5,2");
    }

    #[test]
    fn text_round_trip_default_config() {
        let orig = tt(0.5, -2.25);
        let back: TT = orig.to_string().parse().unwrap();
        assert!(back.approx_eq(&orig, DELTA));
    }

    #[test]
    fn text_round_trip_with_parens() {
        let cfg = WeightTextConfig::with_parens(',', '(', ')');
        let orig = Nested::new(tt(1.0, 2.0), TropicalWeight::new(3.0));
        let text = orig.to_text(cfg);
        assert_eq!(text, "((1,2),3)");
        let back = Nested::parse_with(&text, cfg).unwrap();
        assert!(back.approx_eq(&orig, DELTA));
    }

    #[test]
    fn nested_parse_without_parens() {
        // recursion shares one reader, so the left-nested components are
        // consumed positionally even without parentheses
        let back: Nested = "1,2,3".parse().unwrap();
        assert!(back.approx_eq(
            &Nested::new(tt(1.0, 2.0), TropicalWeight::new(3.0)),
            DELTA
        ));
    }

    #[test]
    fn parse_rejects_missing_close_paren() {
        let cfg = WeightTextConfig::with_parens(',', '(', ')');
        assert_eq!(
            TT::parse_with("(1,2", cfg),
            Err(WeightError::MissingCloseParen)
        );
    }

    #[test]
    fn parse_rejects_trailing_garbage() {
        assert!(matches!(
            "1,2,3".parse::<TT>(),
            Err(WeightError::TrailingGarbage(','))
        ));
    }

    #[test]
    fn binary_round_trip() {
        let orig = tt(7.0, -1.5);
        let mut buf = Vec::new();
        orig.write_bytes(&mut buf).unwrap();
        assert_eq!(TT::read_bytes(&mut buf.as_slice()).unwrap(), orig);
    }

    #[test]
    fn type_name_composes() {
        assert_eq!(TT::type_name(), "tropical_X_tropical");
    }
}
