//! In-order merge of the two complementary mapping streams.
//!
//! A mapping set is kept as two separately sorted partitions: the main
//! stream (records with a defined `from` side, ordered by `from`) and the
//! back-empty stream (records with `from` empty, ordered by `to`). The two
//! partitions cannot share one comparator, so merging them is driven by a
//! dedicated priority rule on the `to` column.

use tracing::debug;

use crate::{EMPTY_POS, Mapping};

/// Running output position, one watermark per axis. Starts at (-1, -1) and
/// advances to the `last` endpoint of every defined side that passes
/// through the merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProcPosition {
    pub left: i64,
    pub right: i64,
}

impl ProcPosition {
    pub fn start() -> Self {
        Self {
            left: EMPTY_POS,
            right: EMPTY_POS,
        }
    }
}

/// Cursor over one sorted mapping slice. The cursor applies a function to
/// its current item rather than handing the item out, so the shared
/// position watermark can be maintained in one place.
pub struct MergeIter<'a> {
    items: &'a [Mapping],
    idx: usize,
    finished: bool,
}

impl<'a> MergeIter<'a> {
    pub fn new(items: &'a [Mapping]) -> Self {
        Self {
            items,
            idx: 0,
            finished: items.is_empty(),
        }
    }

    fn head(&self) -> Option<&Mapping> {
        self.items.get(self.idx)
    }

    /// Whether the cursor still has an unconsumed item.
    pub fn unfinished(&self) -> bool {
        !self.finished
    }

    /// Calls `on_item` with the current item and the watermark as it stood
    /// before this item, then folds the item into the watermark. Must only
    /// be called while `unfinished()`.
    pub fn apply<F>(&mut self, pos: &mut ProcPosition, on_item: &mut F)
    where
        F: FnMut(&Mapping, ProcPosition),
    {
        let item = &self.items[self.idx];
        on_item(item, *pos);
        if item.from.first != EMPTY_POS {
            pos.left = item.from.last;
        }
        if item.to.first != EMPTY_POS {
            pos.right = item.to.last;
        }
        if self.idx == self.items.len() - 1 {
            self.finished = true;
        }
    }

    /// Moves to the next item; at the end of the slice this is a no-op and
    /// the cursor simply stays finished.
    pub fn advance(&mut self) {
        if self.idx + 1 < self.items.len() {
            self.idx += 1;
        }
    }

    /// Whether this cursor's head must be emitted before `other`'s head,
    /// comparing the `to` columns. A finished cursor never has priority.
    pub fn has_priority_over(&self, other: &MergeIter<'_>) -> bool {
        if self.finished {
            return false;
        }
        match (self.head(), other.head()) {
            (Some(mine), Some(theirs)) => mine.to < theirs.to,
            (Some(_), None) => true,
            _ => false,
        }
    }
}

/// Merges the main stream and the back-empty stream into a single total
/// order, calling `on_item` once per record together with the running
/// position. A back-empty record is emitted ahead of a main record exactly
/// when the main cursor is exhausted or the back-empty head's `to` sorts
/// lower. Empty inputs are legal and produce no output.
pub fn merge_mappings<F>(main: &[Mapping], back_empty: &[Mapping], mut on_item: F)
where
    F: FnMut(&Mapping, ProcPosition),
{
    let mut pos = ProcPosition::start();
    let mut main_iter = MergeIter::new(main);
    let mut back_iter = MergeIter::new(back_empty);

    while main_iter.unfinished() || back_iter.unfinished() {
        if !main_iter.unfinished() || back_iter.has_priority_over(&main_iter) {
            back_iter.apply(&mut pos, &mut on_item);
            back_iter.advance();
        } else {
            main_iter.apply(&mut pos, &mut on_item);
            main_iter.advance();
        }
    }
    debug!(
        target: "mapping.merge",
        main = main.len(),
        back_empty = back_empty.len(),
        left = pos.left,
        right = pos.right,
        "merge finished"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PosRange;

    fn m(f1: i64, f2: i64, t1: i64, t2: i64) -> Mapping {
        Mapping::new(PosRange::new(f1, f2), PosRange::new(t1, t2))
    }

    fn collect_merge(main: &[Mapping], back: &[Mapping]) -> Vec<Mapping> {
        let mut out = Vec::new();
        merge_mappings(main, back, |item, _| out.push(*item));
        out
    }

    #[test]
    fn fresh_iterator_is_unfinished() {
        let items = [m(1, 2, -1, -1), m(3, 4, -1, -1)];
        let it = MergeIter::new(&items);
        assert!(it.unfinished());
    }

    #[test]
    fn empty_iterator_starts_finished() {
        let it = MergeIter::new(&[]);
        assert!(!it.unfinished());
    }

    #[test]
    fn apply_on_last_item_finishes() {
        let items = [m(1, 2, -1, -1)];
        let mut it = MergeIter::new(&items);
        let mut pos = ProcPosition::start();
        it.apply(&mut pos, &mut |_, _| {});
        assert!(!it.unfinished());
        assert_eq!(pos.left, 2);
        assert_eq!(pos.right, -1);
    }

    #[test]
    fn priority_compares_to_columns() {
        let items = [
            m(1, 2, -1, -1),
            m(3, 4, -1, -1),
            m(5, 5, -1, -1),
            m(6, 6, 0, 0),
        ];
        let mut it1 = MergeIter::new(&items);
        let mut it2 = MergeIter::new(&items);
        it1.advance();
        it2.advance();
        it2.advance();
        // both heads still carry to = (-1,-1)
        assert!(!it1.has_priority_over(&it2));
        it2.advance();
        it2.advance();
        // (-1,-1) against (0,0)
        assert!(it1.has_priority_over(&it2));
    }

    #[test]
    fn merge_interleaves_by_to_column() {
        let main = [m(1, 2, -1, -1), m(3, 3, 1, 1), m(4, 5, 4, 4), m(6, 6, 6, 7)];
        let back = [m(-1, -1, 2, 3), m(-1, -1, 5, 5)];
        let got = collect_merge(&main, &back);
        assert_eq!(
            got,
            vec![main[0], main[1], back[0], main[2], back[1], main[3]]
        );
    }

    #[test]
    fn merge_alternating_items() {
        let main = [m(1, 1, 1, 1), m(2, 2, 4, 4)];
        let back = [m(-1, -1, 2, 3), m(-1, -1, 5, 5)];
        let got = collect_merge(&main, &back);
        assert_eq!(got, vec![main[0], back[0], main[1], back[1]]);
    }

    #[test]
    fn merge_drains_waiting_column_first() {
        let main = [m(1, 1, 3, 3), m(2, 2, 4, 4)];
        let back = [m(-1, -1, 1, 1), m(-1, -1, 2, 2)];
        let got = collect_merge(&main, &back);
        assert_eq!(got, vec![back[0], back[1], main[0], main[1]]);
    }

    #[test]
    fn merge_of_empty_sources_yields_nothing() {
        assert!(collect_merge(&[], &[]).is_empty());
    }

    #[test]
    fn merge_with_one_empty_source_passes_through() {
        let main = [m(0, 0, 0, 0), m(1, 1, 1, 1)];
        assert_eq!(collect_merge(&main, &[]), main.to_vec());
        let back = [m(-1, -1, 0, 0), m(-1, -1, 1, 1)];
        assert_eq!(collect_merge(&[], &back), back.to_vec());
    }

    #[test]
    fn merge_tracks_running_position() {
        let main = [m(1, 1, 1, 1), m(2, 2, 4, 4)];
        let back = [m(-1, -1, 2, 3)];
        let mut seen = Vec::new();
        merge_mappings(&main, &back, |_, pos| seen.push((pos.left, pos.right)));
        // position reported before each item is folded in
        assert_eq!(seen, vec![(-1, -1), (1, 1), (1, 3)]);
    }
}
