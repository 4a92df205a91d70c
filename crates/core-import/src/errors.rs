//! Typed failures of the import stages. Per-record failures are contained
//! at the record level; `FixGapsError` is structural and fails the run once
//! the stage has drained.

use core_mapping::Mapping;
use thiserror::Error;

/// Failure to turn one input line into a mapping. Only `Ignorable` is
/// expected in normal operation (alignment files carry plenty of
/// non-`<link>` markup).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseLineError {
    #[error("ignoring line {line}: no alignment payload")]
    Ignorable { line: usize },
    #[error("skipping invalid mapping on line {line}")]
    InvalidLine { line: usize },
    #[error("skipping unresolved positions ('{beg}', '{end}') on line {line}")]
    SkippedPosition {
        beg: String,
        end: String,
        line: usize,
    },
}

impl ParseLineError {
    pub fn is_ignorable(&self) -> bool {
        matches!(self, ParseLineError::Ignorable { .. })
    }
}

/// An input record starting at or before the last accepted position on one
/// of the axes. The stream cannot be turned into a self-consistent
/// alignment once this happens.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error(
    "record {mapping} overlaps already covered positions (watermarks L1={last_l1}, L2={last_l2})"
)]
pub struct FixGapsError {
    pub mapping: Mapping,
    pub last_l1: i64,
    pub last_l2: i64,
}
