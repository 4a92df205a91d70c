//! Run-length compression of adjacent one-sided records.
//!
//! Subsequent records with `-1` in the same column collapse into a single
//! record whose range spans the whole run, e.g. three consecutive
//! `n\t-1` lines become one `n,n+2\t-1` line.

use core_mapping::{Mapping, PLACEHOLDER_POS, PosRange};

/// Streaming coalescer. One accumulator holds an optionally open run per
/// axis; `-2` endpoints mark a run as not yet opened. With `gaps_only` set,
/// only gap records participate in coalescing and real 1:0 alignments pass
/// through untouched.
pub struct Compressor {
    curr: Mapping,
    gaps_only: bool,
}

impl Compressor {
    pub fn new(gaps_only: bool) -> Self {
        Self {
            curr: Mapping {
                from: PosRange::PLACEHOLDER,
                to: PosRange::PLACEHOLDER,
                is_gap: false,
            },
            gaps_only,
        }
    }

    fn flush_left<F: FnMut(Mapping)>(&mut self, on_item: &mut F) {
        on_item(Mapping {
            from: self.curr.from,
            to: PosRange::EMPTY,
            is_gap: self.curr.is_gap,
        });
        self.curr.from = PosRange::PLACEHOLDER;
    }

    fn flush_right<F: FnMut(Mapping)>(&mut self, on_item: &mut F) {
        on_item(Mapping {
            from: PosRange::EMPTY,
            to: self.curr.to,
            is_gap: self.curr.is_gap,
        });
        self.curr.to = PosRange::PLACEHOLDER;
    }

    pub fn step<F>(&mut self, item: Mapping, on_item: &mut F)
    where
        F: FnMut(Mapping),
    {
        if item.to.is_empty() && (!self.gaps_only || item.is_gap) {
            if self.curr.from.first == PLACEHOLDER_POS {
                self.curr.from = item.from;
            } else {
                self.curr.from.last = item.from.last;
            }
            self.curr.is_gap = item.is_gap;
            return;
        } else if self.curr.from.first != PLACEHOLDER_POS {
            self.flush_left(on_item);
        }

        if item.from.is_empty() && (!self.gaps_only || item.is_gap) {
            if self.curr.to.first == PLACEHOLDER_POS {
                self.curr.to = item.to;
            } else {
                self.curr.to.last = item.to.last;
            }
            self.curr.is_gap = item.is_gap;
            return;
        } else if self.curr.to.first != PLACEHOLDER_POS {
            self.flush_right(on_item);
        }

        on_item(item);
    }

    /// Flushes whatever runs are still open, left axis first.
    pub fn finish<F>(mut self, on_item: &mut F)
    where
        F: FnMut(Mapping),
    {
        if self.curr.from.first != PLACEHOLDER_POS {
            self.flush_left(on_item);
        }
        if self.curr.to.first != PLACEHOLDER_POS {
            self.flush_right(on_item);
        }
    }
}
