//! Gap filler: inserts placeholder records so both coordinate axes are
//! densely covered.
//!
//! Mid-stream holes are filled with one gap record per missing position;
//! the whole-corpus tails after end of stream use a single range record
//! each, because a trailing hole can span an arbitrarily large stretch of
//! unaligned documents.

use core_mapping::{EMPTY_POS, Mapping, PosRange};
use tracing::error;

use crate::errors::FixGapsError;

/// Streaming gap-fill state. Feed records through [`GapFiller::step`] and
/// call [`GapFiller::finish`] once the stream is drained; any overlap
/// errors collected along the way are returned there and must fail the
/// surrounding run.
pub struct GapFiller {
    start_from_zero: bool,
    struct1_size: i64,
    struct2_size: i64,
    last_l1: Option<i64>,
    last_l2: Option<i64>,
    errors: Vec<FixGapsError>,
}

impl GapFiller {
    /// `struct1_size`/`struct2_size` are the corpus structure counts used
    /// for the trailing fill; pass 0 to disable the tails. With
    /// `start_from_zero` off, the first record seen on an axis sets the
    /// watermark instead of position 0, so no leading fill is produced.
    pub fn new(start_from_zero: bool, struct1_size: i64, struct2_size: i64) -> Self {
        Self {
            start_from_zero,
            struct1_size,
            struct2_size,
            last_l1: None,
            last_l2: None,
            errors: Vec::new(),
        }
    }

    pub fn step<F>(&mut self, mapping: Mapping, on_item: &mut F)
    where
        F: FnMut(Mapping),
    {
        if !self.start_from_zero {
            if self.last_l1.is_none() && mapping.from.first != EMPTY_POS {
                self.last_l1 = Some(mapping.from.first - 1);
            }
            if self.last_l2.is_none() && mapping.to.first != EMPTY_POS {
                self.last_l2 = Some(mapping.to.first - 1);
            }
        }
        let mut last_l1 = self.last_l1.unwrap_or(EMPTY_POS);
        let mut last_l2 = self.last_l2.unwrap_or(EMPTY_POS);

        let overlaps_l1 = mapping.from.first != EMPTY_POS && mapping.from.first <= last_l1;
        let overlaps_l2 = mapping.to.first != EMPTY_POS && mapping.to.first <= last_l2;
        if overlaps_l1 || overlaps_l2 {
            let err = FixGapsError {
                mapping,
                last_l1,
                last_l2,
            };
            error!(target: "import.fixgaps", "{}", err);
            self.errors.push(err);
            on_item(Mapping::error());
        }

        while mapping.from.first > last_l1 + 1 {
            last_l1 += 1;
            on_item(Mapping::gap(
                PosRange::new(last_l1, last_l1),
                PosRange::EMPTY,
            ));
        }
        while mapping.to.first > last_l2 + 1 {
            last_l2 += 1;
            on_item(Mapping::gap(
                PosRange::EMPTY,
                PosRange::new(last_l2, last_l2),
            ));
        }
        on_item(mapping);

        if mapping.from.last != EMPTY_POS {
            last_l1 = mapping.from.last;
        }
        if mapping.to.last != EMPTY_POS {
            last_l2 = mapping.to.last;
        }
        self.last_l1 = Some(last_l1);
        self.last_l2 = Some(last_l2);
    }

    /// Emits the whole-corpus tail records and hands back the collected
    /// overlap errors.
    pub fn finish<F>(self, on_item: &mut F) -> Vec<FixGapsError>
    where
        F: FnMut(Mapping),
    {
        let last_l1 = self.last_l1.unwrap_or(EMPTY_POS);
        let last_l2 = self.last_l2.unwrap_or(EMPTY_POS);
        if last_l1 < self.struct1_size - 1 {
            on_item(Mapping::gap(
                PosRange::new(last_l1 + 1, self.struct1_size - 1),
                PosRange::EMPTY,
            ));
        }
        if last_l2 < self.struct2_size - 1 {
            on_item(Mapping::gap(
                PosRange::EMPTY,
                PosRange::new(last_l2 + 1, self.struct2_size - 1),
            ));
        }
        self.errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(f1: i64, f2: i64, t1: i64, t2: i64) -> Mapping {
        Mapping::new(PosRange::new(f1, f2), PosRange::new(t1, t2))
    }

    fn g(f1: i64, f2: i64, t1: i64, t2: i64) -> Mapping {
        Mapping::gap(PosRange::new(f1, f2), PosRange::new(t1, t2))
    }

    fn run(
        input: &[Mapping],
        start_from_zero: bool,
        s1: i64,
        s2: i64,
    ) -> (Vec<Mapping>, Vec<FixGapsError>) {
        let mut filler = GapFiller::new(start_from_zero, s1, s2);
        let mut out = Vec::new();
        for item in input {
            filler.step(*item, &mut |x| out.push(x));
        }
        let errors = filler.finish(&mut |x| out.push(x));
        (out, errors)
    }

    #[test]
    fn fills_holes_and_tails() {
        let input = [m(1, 1, 0, 2), m(2, 2, 3, 3), m(4, 4, 5, 5)];
        let (out, errors) = run(&input, true, 10, 20);
        assert!(errors.is_empty());
        assert_eq!(
            out,
            vec![
                g(0, 0, -1, -1),
                m(1, 1, 0, 2),
                m(2, 2, 3, 3),
                g(3, 3, -1, -1),
                g(-1, -1, 4, 4),
                m(4, 4, 5, 5),
                g(5, 9, -1, -1),
                g(-1, -1, 6, 19),
            ]
        );
    }

    #[test]
    fn covers_both_axes_exactly_once() {
        let input = [m(2, 3, 1, 1), m(5, 5, 4, 6)];
        let (out, errors) = run(&input, true, 8, 9);
        assert!(errors.is_empty());
        let mut covered1 = Vec::new();
        let mut covered2 = Vec::new();
        for item in &out {
            if item.from.first != EMPTY_POS {
                covered1.extend(item.from.first..=item.from.last);
            }
            if item.to.first != EMPTY_POS {
                covered2.extend(item.to.first..=item.to.last);
            }
        }
        assert_eq!(covered1, (0..8).collect::<Vec<_>>());
        assert_eq!(covered2, (0..9).collect::<Vec<_>>());
    }

    #[test]
    fn no_leading_fill_without_start_from_zero() {
        let input = [m(5, 5, 7, 7), m(6, 6, 8, 8)];
        let (out, errors) = run(&input, false, 0, 0);
        assert!(errors.is_empty());
        assert_eq!(out, vec![m(5, 5, 7, 7), m(6, 6, 8, 8)]);
    }

    #[test]
    fn overlap_is_recorded_and_poisons_stream() {
        let input = [m(0, 3, 0, 0), m(2, 2, 1, 1)];
        let (out, errors) = run(&input, true, 0, 0);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].last_l1, 3);
        assert!(out.contains(&Mapping::error()));
    }

    #[test]
    fn one_sided_records_only_advance_their_axis() {
        let input = [m(0, 0, -1, -1), m(1, 1, 0, 0)];
        let (out, errors) = run(&input, true, 2, 1);
        assert!(errors.is_empty());
        assert_eq!(out, vec![m(0, 0, -1, -1), m(1, 1, 0, 0)]);
    }

    #[test]
    fn empty_stream_yields_full_range_tails() {
        let (out, errors) = run(&[], true, 3, 2);
        assert!(errors.is_empty());
        assert_eq!(out, vec![g(0, 2, -1, -1), g(-1, -1, 0, 1)]);
    }
}
