//! Reconstruction of per-document XML alignment sections from a compressed
//! numeric mapping file.
//!
//! The numeric stream carries no document boundaries, so each record's
//! group is recovered by resolving its positions back to structure
//! identifiers and applying a [`GroupFilter`]. Range records whose
//! positions span several documents are split at the boundaries first,
//! then everything is staged in a [`TextGroupPool`] and written out as
//! `<linkGrp>` sections once complete.

use std::io::{BufRead, Write};
use std::path::Path;

use anyhow::{Context, Result, bail};
use core_attrib::AttrStore;
use core_mapping::{EMPTY_POS, Mapping, MappingShape, PosRange};
use tracing::{error, info};

pub mod filters;
pub mod gpool;

pub use filters::{ExportType, GroupFilter, IntercorpFilter, PlainFilter, filter_for};
pub use gpool::{DEFAULT_READY_WINDOW, TextGroup, TextGroupPool};

pub struct ExportArgs<'a, A1: AttrStore, A2: AttrStore> {
    pub attr1: &'a A1,
    pub attr2: &'a A2,
    pub reg1: &'a Path,
    pub reg2: &'a Path,
    pub filter: &'a dyn GroupFilter,
    pub ready_window: i64,
}

fn side_repr<A: AttrStore>(attr: &A, range: PosRange) -> (String, i64) {
    if range.first == EMPTY_POS {
        (String::new(), 0)
    } else if range.first != range.last {
        (
            format!(
                "{} {}",
                attr.id2str(range.first).unwrap_or(""),
                attr.id2str(range.last).unwrap_or("")
            ),
            range.len(),
        )
    } else {
        (attr.id2str(range.first).unwrap_or("").to_string(), 1)
    }
}

fn link_tag<A1: AttrStore, A2: AttrStore>(attr1: &A1, attr2: &A2, mapping: &Mapping) -> String {
    let (lft, lft_num) = side_repr(attr1, mapping.from);
    let (rgt, rgt_num) = side_repr(attr2, mapping.to);
    format!("<link type=\"{lft_num}-{rgt_num}\" xtargets=\"{lft};{rgt}\" status=\"man\" />")
}

fn group_tag(ident: &str, lang1: &str, lang2: &str) -> String {
    format!(
        "<linkGrp toDoc=\"{ident}.{lang2}-00.xml\" fromDoc=\"{ident}.{lang1}-00.xml\">"
    )
}

fn group_of_position<A: AttrStore>(
    attr: &A,
    filter: &dyn GroupFilter,
    pos: i64,
) -> Option<String> {
    attr.id2str(pos).and_then(|id| filter.extract_group_id(id))
}

/// Splits a one-sided range record at document boundaries: every slice of
/// positions sharing one group becomes its own mapping. Two-sided and
/// singleton records come back unchanged with their group attached.
fn ungroup<A1: AttrStore, A2: AttrStore>(
    args: &ExportArgs<'_, A1, A2>,
    mapping: Mapping,
) -> Vec<(Option<String>, Mapping)> {
    match mapping.shape() {
        MappingShape::FromOnly if mapping.from.first != mapping.from.last => {
            split_range(mapping, mapping.from, |pos| {
                group_of_position(args.attr1, args.filter, pos)
            })
            .into_iter()
            .map(|(group, slice)| {
                (
                    group,
                    Mapping {
                        from: slice,
                        to: PosRange::EMPTY,
                        is_gap: mapping.is_gap,
                    },
                )
            })
            .collect()
        }
        MappingShape::ToOnly if mapping.to.first != mapping.to.last => {
            split_range(mapping, mapping.to, |pos| {
                group_of_position(args.attr2, args.filter, pos)
            })
            .into_iter()
            .map(|(group, slice)| {
                (
                    group,
                    Mapping {
                        from: PosRange::EMPTY,
                        to: slice,
                        is_gap: mapping.is_gap,
                    },
                )
            })
            .collect()
        }
        _ => {
            let group = if mapping.from.first != EMPTY_POS {
                group_of_position(args.attr1, args.filter, mapping.from.first)
                    .or_else(|| group_of_position(args.attr2, args.filter, mapping.to.first))
            } else {
                group_of_position(args.attr2, args.filter, mapping.to.first)
            };
            vec![(group, mapping)]
        }
    }
}

fn split_range<G>(mapping: Mapping, range: PosRange, group_at: G) -> Vec<(Option<String>, PosRange)>
where
    G: Fn(i64) -> Option<String>,
{
    let mut slices: Vec<(Option<String>, PosRange)> = Vec::new();
    let mut slice_start = range.first;
    let mut slice_group = group_at(range.first);
    for pos in range.first + 1..=range.last {
        let group = group_at(pos);
        if group != slice_group {
            slices.push((slice_group.take(), PosRange::new(slice_start, pos - 1)));
            slice_start = pos;
            slice_group = group;
        }
    }
    slices.push((slice_group, PosRange::new(slice_start, range.last)));
    if slices.len() > 1 {
        tracing::debug!(
            target: "export.ungroup",
            record = %mapping,
            slices = slices.len(),
            "range split at group boundaries"
        );
    }
    slices
}

fn write_group<A1: AttrStore, A2: AttrStore, W: Write>(
    out: &mut W,
    args: &ExportArgs<'_, A1, A2>,
    lang1: &str,
    lang2: &str,
    group: &TextGroup,
) -> std::io::Result<()> {
    writeln!(out, "{}", group_tag(&group.id, lang1, lang2))?;
    for mapping in group.iter() {
        writeln!(out, "{}", link_tag(args.attr1, args.attr2, mapping))?;
    }
    writeln!(out, "</linkGrp>")
}

/// Streams a compressed numeric mapping file back out as grouped alignment
/// XML. A literal `ERROR` line in the input aborts the export.
pub fn run_export<A1, A2, R, W>(
    args: &ExportArgs<'_, A1, A2>,
    reader: R,
    mut out: W,
) -> Result<()>
where
    A1: AttrStore,
    A2: AttrStore,
    R: BufRead,
    W: Write,
{
    let lang1 = args.filter.extract_lang(args.reg1);
    let lang2 = args.filter.extract_lang(args.reg2);
    writeln!(out, "<?xml version=\"1.0\" encoding=\"utf-8\"?>")
        .context("writing XML prologue")?;

    let mut pool = TextGroupPool::with_ready_window(args.ready_window);
    let mut current_group = String::new();
    let mut flushed = 0usize;
    for (i, line) in reader.lines().enumerate() {
        let line = line.context("reading mapping input")?;
        let mapping = match line.parse::<Mapping>() {
            Ok(mapping) => mapping,
            Err(err) => {
                error!(target: "export.read", line = i + 1, "{}", err);
                continue;
            }
        };
        if mapping.is_error() {
            bail!("mapping input is poisoned by an ERROR marker on line {}", i + 1);
        }
        for (group, piece) in ungroup(args, mapping) {
            let group = group.unwrap_or_else(|| current_group.clone());
            current_group = group.clone();
            pool.add(&group, piece);
            while let Some(ready) = pool.pop_next_ready() {
                write_group(&mut out, args, &lang1, &lang2, &ready)
                    .context("writing linkGrp section")?;
                flushed += 1;
            }
        }
    }
    while let Some(group) = pool.pop_oldest() {
        write_group(&mut out, args, &lang1, &lang2, &group)
            .context("writing linkGrp section")?;
        flushed += 1;
    }
    out.flush().context("flushing XML output")?;
    info!(target: "export.run", groups = flushed, "export finished");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_attrib::TableAttrStore;

    fn store1() -> TableAttrStore {
        TableAttrStore::from_pairs([
            ("cs:docA:1:1:1", 0),
            ("cs:docA:1:1:2", 1),
            ("cs:docB:1:1:1", 2),
            ("cs:docB:1:1:2", 3),
        ])
    }

    fn store2() -> TableAttrStore {
        TableAttrStore::from_pairs([
            ("en:docA:1:1:1", 0),
            ("en:docA:1:1:2", 1),
            ("en:docB:1:1:1", 2),
        ])
    }

    fn m(f1: i64, f2: i64, t1: i64, t2: i64) -> Mapping {
        Mapping::new(PosRange::new(f1, f2), PosRange::new(t1, t2))
    }

    #[test]
    fn link_tag_counts_positions_per_side() {
        let a1 = store1();
        let a2 = store2();
        assert_eq!(
            link_tag(&a1, &a2, &m(0, 1, 0, 0)),
            "<link type=\"2-1\" xtargets=\"cs:docA:1:1:1 cs:docA:1:1:2;en:docA:1:1:1\" status=\"man\" />"
        );
        assert_eq!(
            link_tag(&a1, &a2, &m(0, 0, -1, -1)),
            "<link type=\"1-0\" xtargets=\"cs:docA:1:1:1;\" status=\"man\" />"
        );
        assert_eq!(
            link_tag(&a1, &a2, &m(-1, -1, 2, 2)),
            "<link type=\"0-1\" xtargets=\";en:docB:1:1:1\" status=\"man\" />"
        );
    }

    #[test]
    fn ungroup_splits_range_spanning_documents() {
        let a1 = store1();
        let a2 = store2();
        let filter = IntercorpFilter::new();
        let args = ExportArgs {
            attr1: &a1,
            attr2: &a2,
            reg1: Path::new("/registry/intercorp_cs"),
            reg2: Path::new("/registry/intercorp_en"),
            filter: &filter,
            ready_window: DEFAULT_READY_WINDOW,
        };
        let pieces = ungroup(&args, m(0, 3, -1, -1));
        assert_eq!(
            pieces,
            vec![
                (Some("docA".to_string()), m(0, 1, -1, -1)),
                (Some("docB".to_string()), m(2, 3, -1, -1)),
            ]
        );
    }

    #[test]
    fn ungroup_keeps_two_sided_records_whole() {
        let a1 = store1();
        let a2 = store2();
        let filter = IntercorpFilter::new();
        let args = ExportArgs {
            attr1: &a1,
            attr2: &a2,
            reg1: Path::new("cs"),
            reg2: Path::new("en"),
            filter: &filter,
            ready_window: DEFAULT_READY_WINDOW,
        };
        let pieces = ungroup(&args, m(0, 1, 0, 1));
        assert_eq!(pieces, vec![(Some("docA".to_string()), m(0, 1, 0, 1))]);
    }

    #[test]
    fn export_emits_grouped_sections() {
        let a1 = store1();
        let a2 = store2();
        let filter = IntercorpFilter::new();
        let args = ExportArgs {
            attr1: &a1,
            attr2: &a2,
            reg1: Path::new("/registry/intercorp_cs"),
            reg2: Path::new("/registry/intercorp_en"),
            filter: &filter,
            ready_window: DEFAULT_READY_WINDOW,
        };
        let input = "0\t0\n1\t1\n2\t2\n3\t-1\n";
        let mut out = Vec::new();
        run_export(&args, input.as_bytes(), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n\
             <linkGrp toDoc=\"docA.en-00.xml\" fromDoc=\"docA.cs-00.xml\">\n\
             <link type=\"1-1\" xtargets=\"cs:docA:1:1:1;en:docA:1:1:1\" status=\"man\" />\n\
             <link type=\"1-1\" xtargets=\"cs:docA:1:1:2;en:docA:1:1:2\" status=\"man\" />\n\
             </linkGrp>\n\
             <linkGrp toDoc=\"docB.en-00.xml\" fromDoc=\"docB.cs-00.xml\">\n\
             <link type=\"1-1\" xtargets=\"cs:docB:1:1:1;en:docB:1:1:1\" status=\"man\" />\n\
             <link type=\"1-0\" xtargets=\"cs:docB:1:1:2;\" status=\"man\" />\n\
             </linkGrp>\n"
        );
    }

    #[test]
    fn export_rejects_poisoned_input() {
        let a1 = store1();
        let a2 = store2();
        let filter = PlainFilter;
        let args = ExportArgs {
            attr1: &a1,
            attr2: &a2,
            reg1: Path::new("cs"),
            reg2: Path::new("en"),
            filter: &filter,
            ready_window: DEFAULT_READY_WINDOW,
        };
        let input = "0\t0\nERROR\n";
        let mut out = Vec::new();
        let err = run_export(&args, input.as_bytes(), &mut out).unwrap_err();
        assert!(err.to_string().contains("poisoned"));
    }
}
