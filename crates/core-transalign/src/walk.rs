//! The pivot-interval walk producing the L1↔L2 mapping.
//!
//! Both inputs are ascending on the pivot start position. The walk keeps
//! one cursor per side, advances whichever side is behind on the pivot
//! axis, grows a union interval while the two sides agree on a start but
//! not yet on an end, and emits a covering pair once both ends meet. Gap
//! rows are never bridged: they stand for document-boundary padding, not
//! sentence equivalence, so the other side is emitted one-sided and the
//! pivots are re-synced instead.

use std::thread;

use core_mapping::{EMPTY_POS, Mapping, PosRange, ProcPosition, merge_mappings};
use tracing::info;

use crate::pivot::PivotMapping;

struct Cursor<'a> {
    pm: &'a PivotMapping,
    idx: usize,
    lang: PosRange,
    pivot: PosRange,
}

impl<'a> Cursor<'a> {
    fn new(pm: &'a PivotMapping) -> Self {
        let mut cursor = Self {
            pm,
            idx: 0,
            lang: PosRange::EMPTY,
            pivot: PosRange::EMPTY,
        };
        cursor.fetch();
        cursor
    }

    fn in_bounds(&self) -> bool {
        self.idx < self.pm.size()
    }

    /// Re-initialises the accumulated ranges from the current row. Past the
    /// end this is a no-op and returns false.
    fn fetch(&mut self) -> bool {
        if !self.in_bounds() {
            return false;
        }
        self.lang = self.pm.lang_of(self.idx);
        self.pivot = self.pm.pivot_of(self.idx);
        true
    }

    fn advance_fetch(&mut self) {
        self.idx += 1;
        self.fetch();
    }

    /// Moves to the next row and extends only the end of the accumulated
    /// ranges, keeping their start.
    fn append_next(&mut self) {
        self.idx += 1;
        if !self.in_bounds() {
            return;
        }
        let row_lang = self.pm.lang_of(self.idx);
        if self.lang.first == EMPTY_POS {
            self.lang.first = row_lang.first;
        }
        if row_lang.last != EMPTY_POS {
            self.lang.last = row_lang.last;
        }
        self.pivot.last = self.pm.pivot_of(self.idx).last;
    }

    fn row_is_gap(&self) -> bool {
        self.pm.is_gap(self.idx)
    }
}

fn push_mapping(list: &mut Vec<Mapping>, mapping: Mapping) {
    if !mapping.is_empty() {
        list.push(mapping);
    }
}

/// Walks both pivot mappings, sorts the two result streams in parallel and
/// merges them into a single total order delivered through `on_item`
/// together with the running output position. The output is not
/// compressed; chain a compressor behind the callback for the canonical
/// form.
pub fn run_transalign<F>(pm1: &PivotMapping, pm2: &PivotMapping, on_item: F)
where
    F: FnMut(&Mapping, ProcPosition),
{
    info!(
        target: "transalign.run",
        rows1 = pm1.size(),
        rows2 = pm2.size(),
        "computing new alignment"
    );

    let mut main = Vec::with_capacity(pm1.size());
    let mut back_empty = Vec::with_capacity(pm1.size() / 10 + 1);

    let mut c1 = Cursor::new(pm1);
    let mut c2 = Cursor::new(pm2);

    while c1.in_bounds() && c2.in_bounds() {
        if c1.pivot.first < c2.pivot.first {
            // align the beginnings of the pivots
            if c1.pivot.last == EMPTY_POS {
                push_mapping(&mut main, Mapping::new(c1.lang, PosRange::EMPTY));
            }
            c1.advance_fetch();
        } else if c1.pivot.first > c2.pivot.first {
            if c2.pivot.last == EMPTY_POS {
                push_mapping(&mut back_empty, Mapping::new(PosRange::EMPTY, c2.lang));
            }
            c2.advance_fetch();
        } else if c1.pivot.last > c2.pivot.last {
            if c1.row_is_gap() {
                // cannot extend an alignment across a gap
                push_mapping(&mut back_empty, Mapping::new(PosRange::EMPTY, c2.lang));
                c2.advance_fetch();
                // re-sync the pivots so comparisons resume from one start
                c1.pivot.first = c2.pivot.first;
            } else {
                c2.append_next();
            }
        } else if c2.pivot.last > c1.pivot.last {
            if c2.row_is_gap() {
                push_mapping(&mut main, Mapping::new(c1.lang, PosRange::EMPTY));
                c1.advance_fetch();
                c2.pivot.first = c1.pivot.first;
            } else {
                c1.append_next();
            }
        } else if c1.pivot.last == EMPTY_POS && c2.pivot.last == EMPTY_POS {
            // neither row has a pivot counterpart
            push_mapping(&mut main, Mapping::new(c1.lang, PosRange::EMPTY));
            push_mapping(&mut back_empty, Mapping::new(PosRange::EMPTY, c2.lang));
            c1.advance_fetch();
            c2.advance_fetch();
        } else {
            let covering = Mapping::new(c1.lang, c2.lang);
            if c1.lang.first != EMPTY_POS {
                push_mapping(&mut main, covering);
            } else {
                push_mapping(&mut back_empty, covering);
            }
            c1.advance_fetch();
            c2.advance_fetch();
        }
    }

    info!(
        target: "transalign.run",
        main = main.len(),
        back_empty = back_empty.len(),
        "sorting result streams"
    );
    thread::scope(|scope| {
        scope.spawn(|| main.sort_by_key(|m: &Mapping| m.from));
        scope.spawn(|| back_empty.sort_by_key(|m: &Mapping| m.to));
    });

    merge_mappings(&main, &back_empty, on_item);
}
