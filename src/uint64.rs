//! Unsigned 64-bit arithmetic on a pair of 32-bit halves.
//!
//! Counter64 values are carried as [`Uint64`]. Every operation here works on
//! the `hi`/`lo` words directly, with explicit carries and borrows, so the
//! codec never depends on a wider host integer for correctness. Conversions
//! to and from `u64` are provided for callers.

use std::cmp::Ordering;
use std::fmt;

use smallvec::SmallVec;

use crate::error::{Error, RangeErrorKind, Result};

/// A 64-bit unsigned integer stored as two 32-bit words.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Uint64 {
    /// High 32 bits.
    pub hi: u32,
    /// Low 32 bits.
    pub lo: u32,
}

/// Largest value representable in decimal parsing before a `* 10` overflows.
const DEC_LIMIT: Uint64 = Uint64::new(0x1999_9999, 0x9999_9999);

impl Uint64 {
    pub const ZERO: Uint64 = Uint64::new(0, 0);
    pub const MAX: Uint64 = Uint64::new(u32::MAX, u32::MAX);

    /// Build from high and low words.
    pub const fn new(hi: u32, lo: u32) -> Self {
        Self { hi, lo }
    }

    /// Build from a 32-bit value.
    pub const fn from_u32(lo: u32) -> Self {
        Self { hi: 0, lo }
    }

    /// Wrapping addition.
    pub fn addq(self, other: Uint64) -> Uint64 {
        let (lo, carry) = self.lo.overflowing_add(other.lo);
        let hi = self.hi.wrapping_add(other.hi).wrapping_add(carry as u32);
        Uint64 { hi, lo }
    }

    /// Wrapping subtraction. Underflow wraps silently.
    pub fn subq(self, other: Uint64) -> Uint64 {
        let (lo, borrow) = self.lo.overflowing_sub(other.lo);
        let hi = self.hi.wrapping_sub(other.hi).wrapping_sub(borrow as u32);
        Uint64 { hi, lo }
    }

    /// Wrapping multiplication, truncated to 64 bits.
    ///
    /// Splits both operands into 16-bit limbs so every partial product fits
    /// a 32-bit word.
    pub fn mulq(self, other: Uint64) -> Uint64 {
        let a = self.limbs();
        let b = other.limbs();
        let mut acc = Uint64::ZERO;
        for (i, &ai) in a.iter().enumerate() {
            for (j, &bj) in b.iter().enumerate().take(4 - i) {
                let partial = Uint64::from_u32(ai * bj);
                acc = acc.addq(partial.shlq(16 * (i + j) as u32));
            }
        }
        acc
    }

    /// Logical shift left. Counts of 64 or more yield zero.
    pub fn shlq(self, n: u32) -> Uint64 {
        match n {
            0 => self,
            1..=31 => Uint64 {
                hi: (self.hi << n) | (self.lo >> (32 - n)),
                lo: self.lo << n,
            },
            32..=63 => Uint64 {
                hi: self.lo << (n - 32),
                lo: 0,
            },
            _ => Uint64::ZERO,
        }
    }

    /// Logical shift right. Counts of 64 or more yield zero.
    pub fn shrlq(self, n: u32) -> Uint64 {
        match n {
            0 => self,
            1..=31 => Uint64 {
                hi: self.hi >> n,
                lo: (self.lo >> n) | (self.hi << (32 - n)),
            },
            32..=63 => Uint64 {
                hi: 0,
                lo: self.hi >> (n - 32),
            },
            _ => Uint64::ZERO,
        }
    }

    /// Three-way comparison.
    pub fn cmpq(self, other: Uint64) -> Ordering {
        self.hi.cmp(&other.hi).then(self.lo.cmp(&other.lo))
    }

    /// Whether the value is nonzero.
    pub fn tstq(self) -> bool {
        self.hi != 0 || self.lo != 0
    }

    fn limbs(self) -> [u32; 4] {
        [
            self.lo & 0xFFFF,
            self.lo >> 16,
            self.hi & 0xFFFF,
            self.hi >> 16,
        ]
    }

    /// Divide by ten, returning quotient and remainder.
    ///
    /// Reciprocal approximation (Hacker's Delight, divu10): the estimate is
    /// off by at most one, fixed up from the remainder.
    pub fn divrem10(self) -> (Uint64, u32) {
        let n = self;
        let mut q = n.shrlq(1).addq(n.shrlq(2));
        q = q.addq(q.shrlq(4));
        q = q.addq(q.shrlq(8));
        q = q.addq(q.shrlq(16));
        q = q.addq(q.shrlq(32));
        q = q.shrlq(3);
        let mut r = n.subq(q.shlq(3).addq(q.shlq(1)));
        let fix = (r.lo + 6) >> 4;
        q = q.addq(Uint64::from_u32(fix));
        r.lo -= fix * 10;
        (q, r.lo)
    }

    /// Parse a decimal, `0x` hexadecimal, or leading-`0` octal string.
    ///
    /// # Examples
    ///
    /// ```
    /// use async_snmp_agent::uint64::Uint64;
    ///
    /// assert_eq!(Uint64::parse("18446744073709551615").unwrap(), Uint64::MAX);
    /// assert_eq!(Uint64::parse("0x10").unwrap(), Uint64::from(16u64));
    /// assert_eq!(Uint64::parse("042").unwrap(), Uint64::from(34u64));
    /// assert!(Uint64::parse("0x123456789abcdef01").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Uint64> {
        let invalid = || Error::invalid_value("unsigned 64-bit integer", s);

        if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            if hex.is_empty() {
                return Err(invalid());
            }
            if hex.len() > 16 {
                return Err(Error::range(RangeErrorKind::HexTooLarge));
            }
            return hex.chars().try_fold(Uint64::ZERO, |acc, c| {
                let d = c.to_digit(16).ok_or_else(invalid)?;
                Ok(acc.shlq(4).addq(Uint64::from_u32(d)))
            });
        }

        if let Some(oct) = s.strip_prefix('0') {
            return oct.chars().try_fold(Uint64::ZERO, |acc, c| {
                let d = c.to_digit(8).ok_or_else(invalid)?;
                if acc.hi >= 0x2000_0000 {
                    return Err(Error::range(RangeErrorKind::Uint64Overflow));
                }
                Ok(acc.shlq(3).addq(Uint64::from_u32(d)))
            });
        }

        if s.is_empty() {
            return Err(invalid());
        }
        let ten = Uint64::from_u32(10);
        s.chars().try_fold(Uint64::ZERO, |acc, c| {
            let d = c.to_digit(10).ok_or_else(invalid)?;
            match acc.cmpq(DEC_LIMIT) {
                Ordering::Greater => return Err(Error::range(RangeErrorKind::Uint64Overflow)),
                Ordering::Equal if d > 5 => {
                    return Err(Error::range(RangeErrorKind::Uint64Overflow));
                }
                _ => {}
            }
            Ok(acc.mulq(ten).addq(Uint64::from_u32(d)))
        })
    }

    /// Minimal big-endian bytes; zero renders as `[0]`.
    pub fn to_octets(self) -> SmallVec<[u8; 8]> {
        let mut bytes: SmallVec<[u8; 8]> = SmallVec::new();
        bytes.extend_from_slice(&self.hi.to_be_bytes());
        bytes.extend_from_slice(&self.lo.to_be_bytes());
        let skip = bytes.iter().take(7).take_while(|&&b| b == 0).count();
        bytes.drain(..skip);
        bytes
    }

    /// Build from up to 8 big-endian bytes.
    ///
    /// Returns `None` when more than 8 bytes are given.
    pub fn from_be_slice(bytes: &[u8]) -> Option<Uint64> {
        if bytes.len() > 8 {
            return None;
        }
        Some(
            bytes
                .iter()
                .fold(Uint64::ZERO, |acc, &b| acc.shlq(8).addq(Uint64::from_u32(b as u32))),
        )
    }
}

impl PartialOrd for Uint64 {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Uint64 {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cmpq(*other)
    }
}

impl fmt::Display for Uint64 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut digits = [0u8; 20];
        let mut pos = digits.len();
        let mut n = *self;
        loop {
            let (q, r) = n.divrem10();
            pos -= 1;
            digits[pos] = b'0' + r as u8;
            n = q;
            if !n.tstq() {
                break;
            }
        }
        // ASCII digits only
        let text = std::str::from_utf8(&digits[pos..]).map_err(|_| fmt::Error)?;
        f.pad(text)
    }
}

impl fmt::Debug for Uint64 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Uint64(0x{:08x}_{:08x})", self.hi, self.lo)
    }
}

impl std::str::FromStr for Uint64 {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl From<u64> for Uint64 {
    fn from(v: u64) -> Self {
        Self {
            hi: (v >> 32) as u32,
            lo: v as u32,
        }
    }
}

impl From<u32> for Uint64 {
    fn from(v: u32) -> Self {
        Self::from_u32(v)
    }
}

impl From<Uint64> for u64 {
    fn from(v: Uint64) -> u64 {
        ((v.hi as u64) << 32) | v.lo as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn u(v: u64) -> Uint64 {
        Uint64::from(v)
    }

    #[test]
    fn test_add_wraps() {
        assert_eq!(Uint64::MAX.addq(u(1)), Uint64::ZERO);
        assert_eq!(u(0xFFFF_FFFF).addq(u(1)), Uint64::new(1, 0));
        assert_eq!(u(40).addq(u(2)), u(42));
    }

    #[test]
    fn test_sub_wraps() {
        assert_eq!(Uint64::ZERO.subq(u(1)), Uint64::MAX);
        assert_eq!(Uint64::new(1, 0).subq(u(1)), u(0xFFFF_FFFF));
    }

    #[test]
    fn test_mul_truncates() {
        assert_eq!(u(6).mulq(u(7)), u(42));
        assert_eq!(
            u(0x1_0000_0001).mulq(u(0x1_0000_0001)),
            u(0x1_0000_0001u64.wrapping_mul(0x1_0000_0001))
        );
        assert_eq!(Uint64::MAX.mulq(Uint64::MAX), u(1));
        assert_eq!(
            u(0xDEAD_BEEF_CAFE_BABE).mulq(u(10)),
            u(0xDEAD_BEEF_CAFE_BABEu64.wrapping_mul(10))
        );
    }

    #[test]
    fn test_shifts() {
        assert_eq!(u(1).shlq(63), u(1 << 63));
        assert_eq!(u(1).shlq(64), Uint64::ZERO);
        assert_eq!(u(1).shlq(200), Uint64::ZERO);
        assert_eq!(u(0x8000_0000).shlq(1), Uint64::new(1, 0));
        assert_eq!(Uint64::MAX.shrlq(64), Uint64::ZERO);
        assert_eq!(Uint64::MAX.shrlq(60), u(0xF));
        assert_eq!(Uint64::new(1, 0).shrlq(1), u(0x8000_0000));
        assert_eq!(u(5).shrlq(0), u(5));
    }

    #[test]
    fn test_compare() {
        assert_eq!(u(1).cmpq(u(2)), Ordering::Less);
        assert_eq!(Uint64::new(1, 0).cmpq(u(0xFFFF_FFFF)), Ordering::Greater);
        assert_eq!(u(9).cmpq(u(9)), Ordering::Equal);
        assert!(!Uint64::ZERO.tstq());
        assert!(Uint64::new(1, 0).tstq());
    }

    #[test]
    fn test_display() {
        assert_eq!(Uint64::MAX.to_string(), "18446744073709551615");
        assert_eq!(Uint64::ZERO.to_string(), "0");
        assert_eq!(u(10).to_string(), "10");
        assert_eq!(u(1_000_000_000_000).to_string(), "1000000000000");
        assert_eq!(format!("{:>4}", u(7)), "   7");
    }

    #[test]
    fn test_divrem10_matches_native() {
        for v in [
            0u64,
            9,
            10,
            99,
            12345678901234567890,
            u64::MAX,
            u64::MAX - 5,
            0x8000_0000_0000_0000,
        ] {
            let (q, r) = u(v).divrem10();
            assert_eq!(u64::from(q), v / 10, "quotient of {}", v);
            assert_eq!(r as u64, v % 10, "remainder of {}", v);
        }
    }

    #[test]
    fn test_parse() {
        assert_eq!(Uint64::parse("0").unwrap(), Uint64::ZERO);
        assert_eq!(Uint64::parse("42").unwrap(), u(42));
        assert_eq!(Uint64::parse("042").unwrap(), u(0o42));
        assert_eq!(Uint64::parse("0xffffffffffffffff").unwrap(), Uint64::MAX);
        assert_eq!(Uint64::parse("0X1F").unwrap(), u(31));
        assert_eq!(Uint64::parse("01777777777777777777777").unwrap(), Uint64::MAX);
        assert_eq!(Uint64::parse("18446744073709551615").unwrap(), Uint64::MAX);
    }

    #[test]
    fn test_parse_rejects() {
        assert!(matches!(
            Uint64::parse("0x123456789abcdef01"),
            Err(Error::Range {
                kind: RangeErrorKind::HexTooLarge
            })
        ));
        assert!(matches!(
            Uint64::parse("18446744073709551616"),
            Err(Error::Range {
                kind: RangeErrorKind::Uint64Overflow
            })
        ));
        assert!(matches!(
            Uint64::parse("02000000000000000000000"),
            Err(Error::Range {
                kind: RangeErrorKind::Uint64Overflow
            })
        ));
        assert!(Uint64::parse("").is_err());
        assert!(Uint64::parse("0x").is_err());
        assert!(Uint64::parse("08").is_err());
        assert!(Uint64::parse("12a").is_err());
        assert!(Uint64::parse("-1").is_err());
    }

    #[test]
    fn test_octets() {
        assert_eq!(Uint64::ZERO.to_octets().as_slice(), &[0]);
        assert_eq!(u(0x80).to_octets().as_slice(), &[0x80]);
        assert_eq!(u(0x0102).to_octets().as_slice(), &[1, 2]);
        assert_eq!(Uint64::MAX.to_octets().as_slice(), &[0xFF; 8]);
        assert_eq!(Uint64::from_be_slice(&[1, 2]), Some(u(0x0102)));
        assert_eq!(Uint64::from_be_slice(&[0xFF; 8]), Some(Uint64::MAX));
        assert_eq!(Uint64::from_be_slice(&[0; 9]), None);
    }

    #[test]
    fn test_native_conversion() {
        let v = 0x0123_4567_89AB_CDEFu64;
        assert_eq!(u64::from(Uint64::from(v)), v);
        assert_eq!(Uint64::from(v).hi, 0x0123_4567);
        assert_eq!(Uint64::from(7u32), u(7));
    }
}
