//! Parse stage: extracts the `xtargets` payload from alignment XML lines
//! and resolves its structure identifiers to numeric ranges.
//!
//! The input is line-oriented and only one tag shape is consumed; anything
//! without an `xtargets` attribute is reported as ignorable. A payload has
//! two semicolon-separated halves, each either empty or a space-separated
//! identifier list of which only the first and last entries matter.

use std::io::{self, BufRead};

use core_attrib::{AttrStore, UNKNOWN_ID};
use core_mapping::{Mapping, PosRange};
use tracing::{error, info, warn};

use crate::errors::ParseLineError;

/// Quote character wrapping the `xtargets` value, selectable per run
/// because both conventions occur in the wild.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteStyle {
    Single,
    Double,
}

impl QuoteStyle {
    fn prefix(self) -> &'static str {
        match self {
            QuoteStyle::Single => "xtargets='",
            QuoteStyle::Double => "xtargets=\"",
        }
    }

    fn suffix(self) -> char {
        match self {
            QuoteStyle::Single => '\'',
            QuoteStyle::Double => '"',
        }
    }
}

/// Resolves one half of an `xtargets` payload. An empty half is a legal
/// "no counterpart" range; a half where only one endpoint resolves is
/// repaired by substituting the resolved endpoint for both.
fn resolve_half<A: AttrStore>(
    attr: &A,
    value: &str,
    line: usize,
) -> Result<PosRange, ParseLineError> {
    if value.is_empty() {
        return Ok(PosRange::EMPTY);
    }
    let beg = value.split(' ').next().unwrap_or(value);
    let end = value.rsplit(' ').next().unwrap_or(value);
    if beg == end {
        let b = attr.str2id(beg);
        if b == UNKNOWN_ID {
            return Err(ParseLineError::SkippedPosition {
                beg: beg.to_string(),
                end: end.to_string(),
                line,
            });
        }
        return Ok(PosRange::new(b, b));
    }
    let b = attr.str2id(beg);
    let e = attr.str2id(end);
    match (b, e) {
        (UNKNOWN_ID, UNKNOWN_ID) => Err(ParseLineError::SkippedPosition {
            beg: beg.to_string(),
            end: end.to_string(),
            line,
        }),
        (UNKNOWN_ID, _) => {
            warn!(
                target: "import.parse",
                line = line + 1,
                value = beg,
                "unresolved range start, using end"
            );
            Ok(PosRange::new(e, e))
        }
        (_, UNKNOWN_ID) => {
            warn!(
                target: "import.parse",
                line = line + 1,
                value = end,
                "unresolved range end, using start"
            );
            Ok(PosRange::new(b, b))
        }
        (b, e) => Ok(PosRange::new(b, e)),
    }
}

/// Streaming parser for one alignment XML file, holding the lexicons of
/// both corpora.
pub struct Processor<'a, A1: AttrStore, A2: AttrStore> {
    attr1: &'a A1,
    attr2: &'a A2,
    quote: QuoteStyle,
}

impl<'a, A1: AttrStore, A2: AttrStore> Processor<'a, A1, A2> {
    pub fn new(attr1: &'a A1, attr2: &'a A2, quote: QuoteStyle) -> Self {
        Self { attr1, attr2, quote }
    }

    fn locate_value<'s>(&self, line: &'s str) -> Option<&'s str> {
        let prefix = self.quote.prefix();
        let start = line.find(prefix)? + prefix.len();
        let rest = &line[start..];
        let end = rest.find(self.quote.suffix())?;
        Some(&rest[..end])
    }

    /// Parses a single input line, e.g.
    /// `<link type='1-1' xtargets='pl:doc1:28:1;cs:doc1:28:1' status='auto'/>`.
    /// Lines without an `xtargets` payload yield `Ignorable`.
    pub fn process_line(&self, line: &str, line_num: usize) -> Result<Mapping, ParseLineError> {
        let value = self
            .locate_value(line)
            .ok_or(ParseLineError::Ignorable { line: line_num })?;
        let mut halves = value.splitn(3, ';');
        let left = halves.next().unwrap_or("");
        let right = halves
            .next()
            .ok_or(ParseLineError::InvalidLine { line: line_num })?;
        if halves.next().is_some() {
            return Err(ParseLineError::InvalidLine { line: line_num });
        }
        let from = resolve_half(self.attr1, left, line_num)?;
        let to = resolve_half(self.attr2, right, line_num)?;
        Ok(Mapping::new(from, to))
    }

    /// Feeds every successfully parsed line to `on_item` along with its
    /// zero-based line index; the index is stable across skipped lines.
    /// Per-line failures are logged and do not stop the stream.
    pub fn process_file<R, F>(&self, reader: R, mut on_item: F) -> io::Result<()>
    where
        R: BufRead,
        F: FnMut(Mapping, usize),
    {
        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            match self.process_line(&line, i) {
                Ok(mapping) => on_item(mapping, i),
                Err(err) if err.is_ignorable() => {
                    info!(target: "import.parse", "{}", err);
                }
                Err(err) => {
                    error!(target: "import.parse", "{}", err);
                }
            }
        }
        Ok(())
    }
}
