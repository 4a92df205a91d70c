//! Numeric sentence-alignment records and the operations shared by every
//! pipeline stage: position ranges, mappings between two corpora, the text
//! codec used by the on-disk format, and the ordered two-stream merge.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

pub mod merge;

pub use merge::{MergeIter, ProcPosition, merge_mappings};

/// Sentinel for "no counterpart on this axis".
pub const EMPTY_POS: i64 = -1;

/// Sentinel for "range not yet opened" inside the compressor, and for the
/// poisoned `ERROR` record. Never appears in serialized ranges.
pub const PLACEHOLDER_POS: i64 = -2;

/// The literal line marking a mapping file as unusable for downstream
/// consumers.
pub const ERROR_LINE: &str = "ERROR";

/// An inclusive range of structure positions within one corpus. The most
/// common range in real data has size 1, in which case `first == last`.
///
/// The derived ordering (first, then last) is the ordering used by both
/// sorted mapping streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PosRange {
    pub first: i64,
    pub last: i64,
}

/// Failure to decode a comma-separated range.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RangeParseError {
    #[error("malformed integer '{0}' in range")]
    BadInt(String),
    #[error("half-empty range ({0},{1})")]
    HalfEmpty(i64, i64),
    #[error("inverted range ({0},{1})")]
    Inverted(i64, i64),
    #[error("too many fields in range '{0}'")]
    TooManyFields(String),
}

impl PosRange {
    pub const EMPTY: PosRange = PosRange {
        first: EMPTY_POS,
        last: EMPTY_POS,
    };

    pub const PLACEHOLDER: PosRange = PosRange {
        first: PLACEHOLDER_POS,
        last: PLACEHOLDER_POS,
    };

    pub fn new(first: i64, last: i64) -> Self {
        Self { first, last }
    }

    pub fn is_empty(&self) -> bool {
        self.first == EMPTY_POS && self.last == EMPTY_POS
    }

    /// Number of positions covered, 0 for the empty range.
    pub fn len(&self) -> i64 {
        if self.first == EMPTY_POS {
            0
        } else {
            self.last - self.first + 1
        }
    }
}

impl fmt::Display for PosRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.first == self.last {
            write!(f, "{}", self.first)
        } else {
            write!(f, "{},{}", self.first, self.last)
        }
    }
}

fn parse_pos(tok: &str) -> Result<i64, RangeParseError> {
    if tok.is_empty() {
        return Ok(EMPTY_POS);
    }
    tok.parse::<i64>()
        .map_err(|_| RangeParseError::BadInt(tok.to_string()))
}

impl FromStr for PosRange {
    type Err = RangeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Ok(Self::EMPTY);
        }
        let mut parts = s.splitn(3, ',');
        let first_tok = parts.next().unwrap_or("");
        let second_tok = parts.next();
        if parts.next().is_some() {
            return Err(RangeParseError::TooManyFields(s.to_string()));
        }
        let first = parse_pos(first_tok)?;
        let last = match second_tok {
            Some(tok) => parse_pos(tok)?,
            None => first,
        };
        if (first == EMPTY_POS) != (last == EMPTY_POS) {
            return Err(RangeParseError::HalfEmpty(first, last));
        }
        if first != EMPTY_POS && first > last {
            return Err(RangeParseError::Inverted(first, last));
        }
        Ok(Self { first, last })
    }
}

/// The four legal record shapes plus the degenerate fully-empty value.
/// Matching on this instead of comparing raw sentinels keeps the -1/-2
/// encoding out of call sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingShape {
    /// Both sides defined: a real M:N alignment.
    Full,
    /// Content on the first axis with no counterpart.
    FromOnly,
    /// Content on the second axis with no counterpart.
    ToOnly,
    /// Both sides empty. Produced transiently by the transalign walker and
    /// filtered before emission.
    Empty,
    /// The poisoned `ERROR` marker.
    Error,
}

/// An alignment between a range of structures in the first corpus and a
/// range in the second one. `is_gap` marks records synthesised for stretches
/// of structures missing on the other axis entirely (contiguous missing
/// documents), as opposed to an ordinary within-document 1:0 alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Mapping {
    pub from: PosRange,
    pub to: PosRange,
    pub is_gap: bool,
}

/// Failure to decode a serialized mapping line.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MappingParseError {
    #[error(transparent)]
    Range(#[from] RangeParseError),
    #[error("expected 2 or 3 tab-separated fields, got {0}")]
    FieldCount(usize),
    #[error("unrecognised flag column '{0}'")]
    BadFlag(String),
}

impl Mapping {
    pub fn new(from: PosRange, to: PosRange) -> Self {
        Self {
            from,
            to,
            is_gap: false,
        }
    }

    pub fn gap(from: PosRange, to: PosRange) -> Self {
        Self {
            from,
            to,
            is_gap: true,
        }
    }

    /// The poisoned marker record. Serializes as the literal `ERROR` line.
    pub fn error() -> Self {
        Self {
            from: PosRange::PLACEHOLDER,
            to: PosRange::PLACEHOLDER,
            is_gap: false,
        }
    }

    pub fn is_error(&self) -> bool {
        self.from.first == PLACEHOLDER_POS && self.to.first == PLACEHOLDER_POS
    }

    pub fn is_empty(&self) -> bool {
        self.from.is_empty() && self.to.is_empty()
    }

    pub fn shape(&self) -> MappingShape {
        if self.is_error() {
            MappingShape::Error
        } else if self.from.is_empty() && self.to.is_empty() {
            MappingShape::Empty
        } else if self.to.is_empty() {
            MappingShape::FromOnly
        } else if self.from.is_empty() {
            MappingShape::ToOnly
        } else {
            MappingShape::Full
        }
    }
}

impl fmt::Display for Mapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_error() {
            return f.write_str(ERROR_LINE);
        }
        write!(f, "{}\t{}", self.from, self.to)?;
        if self.is_gap {
            f.write_str("\tg")?;
        }
        Ok(())
    }
}

impl FromStr for Mapping {
    type Err = MappingParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        if line == ERROR_LINE {
            return Ok(Self::error());
        }
        let fields: Vec<&str> = line.split('\t').collect();
        match fields.as_slice() {
            [from, to] => Ok(Self::new(from.parse()?, to.parse()?)),
            [from, to, flag] => {
                if *flag != "g" {
                    return Err(MappingParseError::BadFlag(flag.to_string()));
                }
                Ok(Self::gap(from.parse()?, to.parse()?))
            }
            other => Err(MappingParseError::FieldCount(other.len())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pos_range_singleton_formats_without_comma() {
        assert_eq!(PosRange::new(7, 7).to_string(), "7");
        assert_eq!(PosRange::new(3, 9).to_string(), "3,9");
        assert_eq!(PosRange::EMPTY.to_string(), "-1");
    }

    #[test]
    fn pos_range_parse_round_trip() {
        for r in [
            PosRange::new(0, 0),
            PosRange::new(2, 5),
            PosRange::EMPTY,
            PosRange::new(1000, 1000),
        ] {
            assert_eq!(r.to_string().parse::<PosRange>(), Ok(r));
        }
    }

    #[test]
    fn pos_range_parse_rejects_half_empty() {
        assert_eq!(
            "-1,5".parse::<PosRange>(),
            Err(RangeParseError::HalfEmpty(-1, 5))
        );
        assert_eq!(
            "5,-1".parse::<PosRange>(),
            Err(RangeParseError::HalfEmpty(5, -1))
        );
    }

    #[test]
    fn pos_range_parse_rejects_inverted() {
        assert_eq!(
            "9,2".parse::<PosRange>(),
            Err(RangeParseError::Inverted(9, 2))
        );
    }

    #[test]
    fn pos_range_parse_rejects_junk() {
        assert!(matches!(
            "x,2".parse::<PosRange>(),
            Err(RangeParseError::BadInt(_))
        ));
        assert!(matches!(
            "1,2,3".parse::<PosRange>(),
            Err(RangeParseError::TooManyFields(_))
        ));
    }

    #[test]
    fn pos_range_empty_input_is_empty_range() {
        assert_eq!("".parse::<PosRange>(), Ok(PosRange::EMPTY));
    }

    #[test]
    fn pos_range_ordering_uses_first_then_last() {
        assert!(PosRange::new(1, 9) < PosRange::new(2, 0));
        assert!(PosRange::new(3, 3) < PosRange::new(3, 4));
        assert!(PosRange::new(3, 4) >= PosRange::new(3, 4));
    }

    #[test]
    fn mapping_display_matches_wire_format() {
        let m = Mapping::gap(PosRange::new(1, 2), PosRange::new(3, 4));
        assert_eq!(m.to_string(), "1,2\t3,4\tg");

        let m2 = Mapping::new(PosRange::new(1, 2), PosRange::new(3, 4));
        assert_eq!(m2.to_string(), "1,2\t3,4");

        let m3 = Mapping::new(PosRange::new(1, 1), PosRange::new(3, 3));
        assert_eq!(m3.to_string(), "1\t3");

        assert_eq!(Mapping::error().to_string(), "ERROR");
    }

    #[test]
    fn mapping_parse_round_trip() {
        for m in [
            Mapping::new(PosRange::new(0, 0), PosRange::new(4, 6)),
            Mapping::new(PosRange::new(2, 3), PosRange::EMPTY),
            Mapping::gap(PosRange::EMPTY, PosRange::new(6, 19)),
            Mapping::error(),
        ] {
            assert_eq!(m.to_string().parse::<Mapping>(), Ok(m));
        }
    }

    #[test]
    fn mapping_parse_rejects_bad_field_counts() {
        assert_eq!(
            "1".parse::<Mapping>(),
            Err(MappingParseError::FieldCount(1))
        );
        assert_eq!(
            "1\t2\tg\tx".parse::<Mapping>(),
            Err(MappingParseError::FieldCount(4))
        );
        assert_eq!(
            "1\t2\tz".parse::<Mapping>(),
            Err(MappingParseError::BadFlag("z".to_string()))
        );
    }

    #[test]
    fn mapping_shapes() {
        let full = Mapping::new(PosRange::new(1, 1), PosRange::new(2, 2));
        assert_eq!(full.shape(), MappingShape::Full);
        let from_only = Mapping::new(PosRange::new(1, 1), PosRange::EMPTY);
        assert_eq!(from_only.shape(), MappingShape::FromOnly);
        let to_only = Mapping::new(PosRange::EMPTY, PosRange::new(2, 2));
        assert_eq!(to_only.shape(), MappingShape::ToOnly);
        assert_eq!(
            Mapping::new(PosRange::EMPTY, PosRange::EMPTY).shape(),
            MappingShape::Empty
        );
        assert_eq!(Mapping::error().shape(), MappingShape::Error);
    }

    #[test]
    fn mapping_is_empty() {
        assert!(Mapping::new(PosRange::EMPTY, PosRange::EMPTY).is_empty());
        assert!(!Mapping::new(PosRange::new(2, -1), PosRange::EMPTY).is_empty());
    }
}
