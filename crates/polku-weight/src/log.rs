// Log semiring: plus = negated log-sum-exp, times = float addition.

use std::fmt;
use std::io;
use std::str::FromStr;

use crate::float;
use crate::{Semiring, WeightError};

/// Weight in the log semiring over f32, storing negated natural-log
/// probabilities. `plus` sums probabilities in log space, `times` chains
/// them, so forward-style algorithms accumulate exact path sums.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogWeight(f32);

impl LogWeight {
    pub const fn new(value: f32) -> Self {
        Self(value)
    }

    pub const fn value(self) -> f32 {
        self.0
    }

    pub const fn no_weight() -> Self {
        Self(f32::NAN)
    }
}

impl Semiring for LogWeight {
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
            Self(float::log_add(self.0, rhs.0))
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
        "log".to_string()
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

impl fmt::Display for LogWeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for LogWeight {
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

    fn w(v: f32) -> LogWeight {
        LogWeight::new(v)
    }

    #[test]
    fn identities() {
        let a = w(1.25);
        assert_eq!(a.plus(&LogWeight::zero()), a);
        assert_eq!(a.times(&LogWeight::one()), a);
        assert_eq!(LogWeight::one().times(&a), a);
    }

    #[test]
    fn plus_sums_probabilities() {
        // e^0 + e^0 = 2, so 0 (+) 0 = -ln 2
        let v = w(0.0).plus(&w(0.0));
        assert!(v.approx_eq(&w(-std::f32::consts::LN_2), 1e-6));
    }

    #[test]
    fn plus_approximately_associative() {
        let (a, b, c) = (w(0.5), w(2.0), w(1.0));
        let l = a.plus(&b.plus(&c));
        let r = a.plus(&b).plus(&c);
        assert!(l.approx_eq(&r, DELTA));
    }

    #[test]
    fn member_rejects_reserved_patterns() {
        assert!(w(3.0).is_member());
        assert!(!LogWeight::no_weight().is_member());
        assert!(!w(f32::NEG_INFINITY).is_member());
    }

    #[test]
    fn binary_round_trip() {
        let orig = w(2.75);
        let mut buf = Vec::new();
        orig.write_bytes(&mut buf).unwrap();
        assert_eq!(LogWeight::read_bytes(&mut buf.as_slice()).unwrap(), orig);
    }
}
