// Tropical semiring: plus = min, times = float addition.

use std::fmt;
use std::io;
use std::str::FromStr;

use crate::float;
use crate::{Semiring, WeightError};

/// Weight in the tropical semiring over f32.
///
/// `plus` takes the minimum and `times` adds, so shortest-path style
/// algorithms compute the minimum-cost path. Zero is positive infinity
/// (an unreachable/non-final marker) and one is 0.0.
///
/// NaN and negative infinity are reserved as non-member bit patterns;
/// operations involving a non-member yield the NaN marker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TropicalWeight(f32);

impl TropicalWeight {
    pub const fn new(value: f32) -> Self {
        Self(value)
    }

    pub const fn value(self) -> f32 {
        self.0
    }

    /// The canonical non-member value, produced when an operation is fed
    /// an invalid operand.
    pub const fn no_weight() -> Self {
        Self(f32::NAN)
    }
}

impl Semiring for TropicalWeight {
    fn zero() -> Self {
        Self(f32::INFINITY)
    }

    fn one() -> Self {
        Self(0.0)
    }

    fn plus(&self, rhs: &Self) -> Self {
        if !self.is_member() || !rhs.is_member() {
            Self::no_weight()
        } else {
            Self(self.0.min(rhs.0))
        }
    }

    fn times(&self, rhs: &Self) -> Self {
        if !self.is_member() || !rhs.is_member() {
            Self::no_weight()
        } else {
            Self(self.0 + rhs.0)
        }
    }

    fn is_member(&self) -> bool {
        !self.0.is_nan() && self.0 != f32::NEG_INFINITY
    }

    fn quantize(&self, delta: f32) -> Self {
        Self(float::quantize(self.0, delta))
    }

    fn approx_eq(&self, rhs: &Self, delta: f32) -> bool {
        float::approx_eq(self.0, rhs.0, delta)
    }

    fn type_name() -> String {
        "tropical".to_string()
    }

    fn write_bytes<Wr: io::Write + ?Sized>(&self, w: &mut Wr) -> io::Result<()> {
        w.write_all(&self.0.to_le_bytes())
    }

    fn read_bytes<R: io::Read + ?Sized>(r: &mut R) -> io::Result<Self> {
        let mut buf = [0u8; 4];
        r.read_exact(&mut buf)?;
        Ok(Self(f32::from_le_bytes(buf)))
    }
}

impl fmt::Display for TropicalWeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TropicalWeight {
    type Err = WeightError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<f32>()
            .map(Self)
            .map_err(|_| WeightError::Parse(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DELTA;

    fn w(v: f32) -> TropicalWeight {
        TropicalWeight::new(v)
    }

    #[test]
    fn identities() {
        let a = w(2.5);
        assert_eq!(a.plus(&TropicalWeight::zero()), a);
        assert_eq!(TropicalWeight::zero().plus(&a), a);
        assert_eq!(a.times(&TropicalWeight::one()), a);
        assert_eq!(TropicalWeight::one().times(&a), a);
    }

    #[test]
    fn plus_is_min() {
        assert_eq!(w(3.0).plus(&w(1.0)), w(1.0));
        assert_eq!(w(-2.0).plus(&w(5.0)), w(-2.0));
    }

    #[test]
    fn times_is_addition() {
        assert_eq!(w(3.0).times(&w(1.5)), w(4.5));
        // zero is absorbing
        assert_eq!(w(3.0).times(&TropicalWeight::zero()), TropicalWeight::zero());
    }

    #[test]
    fn associativity_and_distributivity() {
        let (a, b, c) = (w(1.0), w(4.0), w(2.0));
        assert_eq!(a.plus(&b.plus(&c)), a.plus(&b).plus(&c));
        assert_eq!(a.times(&b.times(&c)), a.times(&b).times(&c));
        assert_eq!(
            a.times(&b.plus(&c)),
            a.times(&b).plus(&a.times(&c))
        );
    }

    #[test]
    fn member_rejects_reserved_patterns() {
        assert!(w(0.0).is_member());
        assert!(TropicalWeight::zero().is_member());
        assert!(!TropicalWeight::no_weight().is_member());
        assert!(!w(f32::NEG_INFINITY).is_member());
    }

    #[test]
    fn non_member_propagates() {
        assert!(!w(1.0).plus(&TropicalWeight::no_weight()).is_member());
        assert!(!TropicalWeight::no_weight().times(&w(1.0)).is_member());
    }

    #[test]
    fn text_round_trip() {
        for v in [0.0, 1.5, -3.25, f32::INFINITY] {
            let orig = w(v);
            let parsed: TropicalWeight = orig.to_string().parse().unwrap();
            assert!(parsed.approx_eq(&orig, DELTA));
        }
    }

    #[test]
    fn binary_round_trip() {
        let orig = w(-7.125);
        let mut buf = Vec::new();
        orig.write_bytes(&mut buf).unwrap();
        let back = TropicalWeight::read_bytes(&mut buf.as_slice()).unwrap();
        assert_eq!(back, orig);
    }

    #[test]
    fn quantize_to_default_delta() {
        let a = w(1.0 + DELTA / 4.0);
        assert_eq!(a.quantize(DELTA), w(1.0));
    }
}
