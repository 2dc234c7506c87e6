//! Object Identifier (OID) type.
//!
//! OIDs are stored as `SmallVec<[u32; 16]>` to avoid heap allocation for common OIDs.
//!
//! Every OID that enters the stack from the outside (a registration, a parsed
//! varbind name, an ObjectIdentifier value) goes through
//! [`Oid::canonicalize`], [`Oid::from_arcs`] or [`Oid::validate_canonical`].
//! OIDs built internally with [`Oid::from_slice`] or the [`oid!`](crate::oid!)
//! macro are not checked; the MIB tree uses them for its own short prefixes.

use crate::error::{DecodeErrorKind, Error, OidErrorKind, Result};
use smallvec::SmallVec;
use std::fmt;

/// Maximum number of arcs (subidentifiers) allowed in an OID.
///
/// Per RFC 2578 Section 3.5: "there are at most 128 sub-identifiers in a value".
pub const MAX_OID_LEN: usize = 128;

/// Largest value a single arc may take.
pub const MAX_ARC: u32 = i32::MAX as u32;

/// Object Identifier.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Oid {
    arcs: SmallVec<[u32; 16]>,
}

impl Oid {
    /// Create an empty OID.
    pub fn empty() -> Self {
        Self {
            arcs: SmallVec::new(),
        }
    }

    /// Create an OID from arc values without validation.
    pub fn new(arcs: impl IntoIterator<Item = u32>) -> Self {
        Self {
            arcs: arcs.into_iter().collect(),
        }
    }

    /// Create an OID from a slice of arcs without validation.
    ///
    /// # Examples
    ///
    /// ```
    /// use async_snmp_agent::oid::Oid;
    ///
    /// let oid = Oid::from_slice(&[1, 3, 6, 1, 2, 1, 1, 1, 0]);
    /// assert_eq!(oid.to_string(), "1.3.6.1.2.1.1.1.0");
    /// ```
    pub fn from_slice(arcs: &[u32]) -> Self {
        Self {
            arcs: SmallVec::from_slice(arcs),
        }
    }

    /// Parse and canonicalize a dotted OID string.
    ///
    /// Empty components are skipped, so leading, trailing and doubled dots
    /// are tolerated. Every remaining component must be a non-negative decimal
    /// integer no larger than `i32::MAX`, and the result must satisfy
    /// [`validate_canonical`](Self::validate_canonical).
    ///
    /// # Examples
    ///
    /// ```
    /// use async_snmp_agent::oid::Oid;
    ///
    /// let oid = Oid::canonicalize(".1.3.6..1.").unwrap();
    /// assert_eq!(oid.arcs(), &[1, 3, 6, 1]);
    ///
    /// assert!(Oid::canonicalize("1.3").is_err());
    /// assert!(Oid::canonicalize("3.1.1").is_err());
    /// assert!(Oid::canonicalize("1.40.1").is_err());
    /// assert!(Oid::canonicalize("1.3.-6").is_err());
    /// ```
    pub fn canonicalize(s: &str) -> Result<Self> {
        let mut arcs = SmallVec::new();

        for part in s.split('.').filter(|p| !p.is_empty()) {
            if !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(Error::malformed_oid_with_input(OidErrorKind::InvalidArc, s));
            }
            let arc: u64 = part.parse().map_err(|_| {
                Error::malformed_oid_with_input(OidErrorKind::ArcTooLarge(u32::MAX), s)
            })?;
            if arc > MAX_ARC as u64 {
                let shown = u32::try_from(arc).unwrap_or(u32::MAX);
                return Err(Error::malformed_oid_with_input(
                    OidErrorKind::ArcTooLarge(shown),
                    s,
                ));
            }
            arcs.push(arc as u32);
        }

        if arcs.is_empty() {
            return Err(Error::malformed_oid_with_input(OidErrorKind::Empty, s));
        }

        let oid = Self { arcs };
        oid.validate_canonical().map_err(|e| match e {
            Error::MalformedOid { kind, .. } => Error::malformed_oid_with_input(kind, s),
            other => other,
        })?;
        Ok(oid)
    }

    /// Canonicalize an integer sequence.
    ///
    /// Negative components and components above `i32::MAX` are rejected.
    pub fn from_arcs(arcs: impl IntoIterator<Item = i64>) -> Result<Self> {
        let mut out = SmallVec::new();
        for arc in arcs {
            if arc < 0 {
                return Err(Error::malformed_oid(OidErrorKind::InvalidArc));
            }
            if arc > MAX_ARC as i64 {
                let shown = u32::try_from(arc).unwrap_or(u32::MAX);
                return Err(Error::malformed_oid(OidErrorKind::ArcTooLarge(shown)));
            }
            out.push(arc as u32);
        }
        let oid = Self { arcs: out };
        oid.validate_canonical()?;
        Ok(oid)
    }

    /// Check the canonical-form rules.
    ///
    /// At least 3 arcs, at most [`MAX_OID_LEN`], first arc 0-2, second arc
    /// at most 39, no arc above [`MAX_ARC`].
    pub fn validate_canonical(&self) -> Result<()> {
        let count = self.arcs.len();
        if count == 0 {
            return Err(Error::malformed_oid(OidErrorKind::Empty));
        }
        if count < 3 {
            return Err(Error::malformed_oid(OidErrorKind::TooShort { count }));
        }
        if count > MAX_OID_LEN {
            return Err(Error::malformed_oid(OidErrorKind::TooManyArcs {
                count,
                max: MAX_OID_LEN,
            }));
        }
        let (first, second) = (self.arcs[0], self.arcs[1]);
        if first > 2 {
            return Err(Error::malformed_oid(OidErrorKind::InvalidFirstArc(first)));
        }
        if second > 39 {
            return Err(Error::malformed_oid(OidErrorKind::InvalidSecondArc {
                first,
                second,
            }));
        }
        if let Some(&big) = self.arcs.iter().find(|&&a| a > MAX_ARC) {
            return Err(Error::malformed_oid(OidErrorKind::ArcTooLarge(big)));
        }
        Ok(())
    }

    /// Get the arc values.
    pub fn arcs(&self) -> &[u32] {
        &self.arcs
    }

    /// Get the number of arcs.
    pub fn len(&self) -> usize {
        self.arcs.len()
    }

    /// Check if the OID is empty.
    pub fn is_empty(&self) -> bool {
        self.arcs.is_empty()
    }

    /// Check if this OID starts with another OID.
    ///
    /// An OID always starts with itself, and any OID starts with an empty OID.
    pub fn starts_with(&self, other: &Oid) -> bool {
        self.arcs.starts_with(&other.arcs)
    }

    /// Whether this OID lies strictly below `ancestor`.
    pub fn is_descendant_of(&self, ancestor: &Oid) -> bool {
        self.arcs.len() > ancestor.arcs.len() && self.starts_with(ancestor)
    }

    /// Arcs trailing `prefix`, if this OID starts with it.
    pub fn suffix_after(&self, prefix: &Oid) -> Option<&[u32]> {
        if self.starts_with(prefix) {
            Some(&self.arcs[prefix.arcs.len()..])
        } else {
            None
        }
    }

    /// Get the parent OID (all arcs except the last).
    ///
    /// Returns `None` if the OID is empty.
    pub fn parent(&self) -> Option<Oid> {
        let (_, head) = self.arcs.split_last()?;
        Some(Oid::from_slice(head))
    }

    /// Create a child OID by appending an arc.
    pub fn child(&self, arc: u32) -> Oid {
        let mut arcs = self.arcs.clone();
        arcs.push(arc);
        Oid { arcs }
    }

    /// Create a descendant OID by appending several arcs.
    pub fn join(&self, suffix: &[u32]) -> Oid {
        let mut arcs = self.arcs.clone();
        arcs.extend_from_slice(suffix);
        Oid { arcs }
    }

    /// Encode to BER content bytes.
    ///
    /// OID encoding (X.690 Section 8.19):
    /// - First two arcs encoded as (arc1 * 40) + arc2 using base-128
    /// - Remaining arcs encoded as base-128 variable length
    pub fn to_ber_smallvec(&self) -> SmallVec<[u8; 64]> {
        let mut bytes = SmallVec::new();

        match self.arcs.as_slice() {
            [] => {}
            [first] => encode_subidentifier(&mut bytes, first.saturating_mul(40)),
            [first, second, rest @ ..] => {
                let packed = first.saturating_mul(40).saturating_add(*second);
                encode_subidentifier(&mut bytes, packed);
                for &arc in rest {
                    encode_subidentifier(&mut bytes, arc);
                }
            }
        }

        bytes
    }

    /// Encode to BER content bytes.
    pub fn to_ber(&self) -> Vec<u8> {
        self.to_ber_smallvec().to_vec()
    }

    /// Decode from BER content bytes.
    ///
    /// Only the wire structure is checked here; callers that need a canonical
    /// OID follow up with [`validate_canonical`](Self::validate_canonical).
    pub fn from_ber(data: &[u8]) -> Result<Self> {
        if data.is_empty() {
            return Ok(Self::empty());
        }

        let mut arcs = SmallVec::new();

        let (packed, mut i) = decode_subidentifier(data, 0)?;
        let first = (packed / 40).min(2);
        arcs.push(first);
        arcs.push(packed - first * 40);

        while i < data.len() {
            let (arc, consumed) = decode_subidentifier(&data[i..], i)?;
            arcs.push(arc);
            i += consumed;

            if arcs.len() > MAX_OID_LEN {
                return Err(Error::decode(i, DecodeErrorKind::InvalidOidEncoding));
            }
        }

        Ok(Self { arcs })
    }
}

#[inline]
fn encode_subidentifier(bytes: &mut SmallVec<[u8; 64]>, value: u32) {
    let groups = (32 - value.leading_zeros()).div_ceil(7).max(1);
    for i in (0..groups).rev() {
        let mut byte = ((value >> (i * 7)) & 0x7F) as u8;
        if i > 0 {
            byte |= 0x80;
        }
        bytes.push(byte);
    }
}

/// Decode a subidentifier, returning (value, bytes_consumed).
fn decode_subidentifier(data: &[u8], base: usize) -> Result<(u32, usize)> {
    let mut value: u32 = 0;

    for (i, &byte) in data.iter().enumerate() {
        if value > (u32::MAX >> 7) {
            return Err(Error::decode(base + i, DecodeErrorKind::IntegerOverflow));
        }
        value = (value << 7) | (byte & 0x7F) as u32;
        if byte & 0x80 == 0 {
            return Ok((value, i + 1));
        }
    }

    Err(Error::decode(base + data.len(), DecodeErrorKind::TruncatedData))
}

impl fmt::Debug for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Oid({})", self)
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut arcs = self.arcs.iter();
        if let Some(first) = arcs.next() {
            write!(f, "{}", first)?;
            for arc in arcs {
                write!(f, ".{}", arc)?;
            }
        }
        Ok(())
    }
}

impl std::str::FromStr for Oid {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::canonicalize(s)
    }
}

impl From<&[u32]> for Oid {
    fn from(arcs: &[u32]) -> Self {
        Self::from_slice(arcs)
    }
}

impl<const N: usize> From<[u32; N]> for Oid {
    fn from(arcs: [u32; N]) -> Self {
        Self::new(arcs)
    }
}

impl PartialOrd for Oid {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Component-wise numeric order; a prefix sorts before its descendants.
impl Ord for Oid {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.arcs.cmp(&other.arcs)
    }
}

/// Macro to create an OID from literal arcs.
///
/// # Examples
///
/// ```
/// use async_snmp_agent::oid;
///
/// let sys_descr = oid!(1, 3, 6, 1, 2, 1, 1, 1, 0);
/// assert_eq!(sys_descr.to_string(), "1.3.6.1.2.1.1.1.0");
/// assert!(sys_descr.starts_with(&oid!(1, 3, 6, 1, 2, 1, 1)));
/// ```
#[macro_export]
macro_rules! oid {
    ($($arc:expr),* $(,)?) => {
        $crate::oid::Oid::from_slice(&[$($arc),*])
    };
}
