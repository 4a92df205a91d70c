//! Resolution of string structure identifiers to numeric positions.
//!
//! The alignment pipelines never touch identifier storage directly; they
//! only rely on the small capability set expressed by [`AttrStore`]. The
//! production implementation here is a file-backed lexicon loaded from a
//! registry directory; tests and small tools can use [`TableAttrStore`]
//! built from literal pairs.

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

/// Identifier returned for unknown structure identifiers.
pub const UNKNOWN_ID: i64 = -1;

#[derive(Debug, Error)]
pub enum AttribError {
    #[error("registry path {path} is not a directory")]
    Registry { path: PathBuf },
    #[error("failed to read attribute file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// The id↔string capability set an alignment run needs from a corpus.
pub trait AttrStore {
    /// Resolves a structure identifier to its numeric position, or
    /// [`UNKNOWN_ID`] when the identifier is not present.
    fn str2id(&self, value: &str) -> i64;

    /// Inverse of [`AttrStore::str2id`].
    fn id2str(&self, id: i64) -> Option<&str>;

    /// Number of known structures.
    fn size(&self) -> usize;
}

/// A corpus registry: a directory holding one `<attr>.lex` lexicon per
/// structural attribute, one identifier per line, the line number being the
/// numeric id.
#[derive(Debug, Clone)]
pub struct Corpus {
    dir: PathBuf,
}

impl Corpus {
    pub fn open(registry_path: &Path) -> Result<Self, AttribError> {
        if !registry_path.is_dir() {
            return Err(AttribError::Registry {
                path: registry_path.to_path_buf(),
            });
        }
        Ok(Self {
            dir: registry_path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    fn lexicon_path(&self, attr_name: &str) -> PathBuf {
        self.dir.join(format!("{attr_name}.lex"))
    }

    /// Loads the lexicon of a structural attribute into memory.
    pub fn attr(&self, attr_name: &str) -> Result<FileAttrStore, AttribError> {
        let path = self.lexicon_path(attr_name);
        let file = File::open(&path).map_err(|source| AttribError::Io {
            path: path.clone(),
            source,
        })?;
        let mut values = Vec::new();
        let mut index = HashMap::new();
        for line in BufReader::new(file).lines() {
            let value = line.map_err(|source| AttribError::Io {
                path: path.clone(),
                source,
            })?;
            index.insert(value.clone(), values.len() as i64);
            values.push(value);
        }
        info!(
            target: "attrib.load",
            attr = attr_name,
            size = values.len(),
            path = %path.display(),
            "lexicon loaded"
        );
        Ok(FileAttrStore { values, index })
    }

    /// Count of top-level structures addressed by the given attribute,
    /// without materialising the lexicon.
    pub fn struct_size(&self, attr_name: &str) -> Result<i64, AttribError> {
        let path = self.lexicon_path(attr_name);
        let file = File::open(&path).map_err(|source| AttribError::Io {
            path: path.clone(),
            source,
        })?;
        let mut count: i64 = 0;
        for line in BufReader::new(file).lines() {
            line.map_err(|source| AttribError::Io {
                path: path.clone(),
                source,
            })?;
            count += 1;
        }
        Ok(count)
    }
}

/// Lexicon of one structural attribute, fully loaded. Ids are dense and
/// equal to the source line number.
#[derive(Debug, Clone)]
pub struct FileAttrStore {
    values: Vec<String>,
    index: HashMap<String, i64>,
}

impl AttrStore for FileAttrStore {
    fn str2id(&self, value: &str) -> i64 {
        self.index.get(value).copied().unwrap_or(UNKNOWN_ID)
    }

    fn id2str(&self, id: i64) -> Option<&str> {
        if id < 0 {
            return None;
        }
        self.values.get(id as usize).map(String::as_str)
    }

    fn size(&self) -> usize {
        self.values.len()
    }
}

/// Literal-table store for tests and ad-hoc probes. Ids need not be dense.
#[derive(Debug, Clone, Default)]
pub struct TableAttrStore {
    forward: HashMap<String, i64>,
    backward: HashMap<i64, String>,
}

impl TableAttrStore {
    pub fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, i64)>,
    {
        let mut forward = HashMap::new();
        let mut backward = HashMap::new();
        for (value, id) in pairs {
            forward.insert(value.to_string(), id);
            backward.insert(id, value.to_string());
        }
        Self { forward, backward }
    }
}

impl AttrStore for TableAttrStore {
    fn str2id(&self, value: &str) -> i64 {
        self.forward.get(value).copied().unwrap_or(UNKNOWN_ID)
    }

    fn id2str(&self, id: i64) -> Option<&str> {
        self.backward.get(&id).map(String::as_str)
    }

    fn size(&self) -> usize {
        self.forward.len()
    }
}
