//! Loaded representation of one half of a pivot alignment (lang ↔ pivot).

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use core_mapping::{ERROR_LINE, Mapping, PosRange};
use thiserror::Error;
use tracing::{info, warn};

/// Rough bytes-per-record ratio of the numeric mapping format, used to
/// pre-allocate the row vectors in one go.
pub const FILE_TO_CAPACITY_RATIO: u64 = 14;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("pivot mapping {path} is poisoned by an ERROR marker on line {line}")]
    Poisoned { path: String, line: usize },
    #[error("failed to read pivot mapping {path}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
}

/// Three parallel row sequences, one row per valid input line, kept in
/// input order (which equals ascending order on `pivot.first`). Loaded
/// once, never mutated.
#[derive(Debug)]
pub struct PivotMapping {
    name: String,
    lang: Vec<PosRange>,
    pivot: Vec<PosRange>,
    gap: Vec<bool>,
}

impl PivotMapping {
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let name = path.display().to_string();
        let file = File::open(path).map_err(|source| LoadError::Io {
            path: name.clone(),
            source,
        })?;
        let capacity = file
            .metadata()
            .map(|meta| (meta.len() / FILE_TO_CAPACITY_RATIO) as usize)
            .unwrap_or(0);
        Self::from_reader(&name, BufReader::new(file), capacity)
    }

    pub fn from_reader<R: BufRead>(
        name: &str,
        reader: R,
        capacity: usize,
    ) -> Result<Self, LoadError> {
        let mut lang = Vec::with_capacity(capacity);
        let mut pivot = Vec::with_capacity(capacity);
        let mut gap = Vec::with_capacity(capacity);
        let mut skipped = 0usize;
        for (i, line) in reader.lines().enumerate() {
            let line = line.map_err(|source| LoadError::Io {
                path: name.to_string(),
                source,
            })?;
            if line == ERROR_LINE {
                return Err(LoadError::Poisoned {
                    path: name.to_string(),
                    line: i + 1,
                });
            }
            match line.parse::<Mapping>() {
                Ok(mapping) => {
                    lang.push(mapping.from);
                    pivot.push(mapping.to);
                    gap.push(mapping.is_gap);
                }
                Err(err) => {
                    warn!(target: "transalign.load", line = i + 1, "{}", err);
                    skipped += 1;
                }
            }
        }
        info!(
            target: "transalign.load",
            source = name,
            rows = lang.len(),
            skipped,
            "pivot mapping loaded"
        );
        Ok(Self {
            name: name.to_string(),
            lang,
            pivot,
            gap,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> usize {
        self.lang.len()
    }

    pub fn lang_of(&self, idx: usize) -> PosRange {
        self.lang[idx]
    }

    pub fn pivot_of(&self, idx: usize) -> PosRange {
        self.pivot[idx]
    }

    pub fn is_gap(&self, idx: usize) -> bool {
        self.gap[idx]
    }
}
