//! Extraction of document-level group identifiers from structure
//! identifiers. The convention is corpus-specific, so the extraction is a
//! pluggable filter.

use std::path::Path;

use regex::Regex;

/// Filter kind selected per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportType {
    Intercorp,
    #[default]
    Plain,
}

impl ExportType {
    pub fn from_name(name: &str) -> Self {
        match name {
            "intercorp" => ExportType::Intercorp,
            _ => ExportType::Plain,
        }
    }
}

pub trait GroupFilter {
    /// Group (document) identifier contained in a structure identifier, if
    /// the identifier follows the filter's convention.
    fn extract_group_id(&self, rec_id: &str) -> Option<String>;

    /// Language code derived from a registry path, used in exported
    /// document names.
    fn extract_lang(&self, registry_path: &Path) -> String;
}

/// InterCorp identifiers look like `lang:DOC:seg:par:sen`; the group is the
/// second field and registries are named by their two-letter language code.
pub struct IntercorpFilter {
    pattern: Regex,
}

impl IntercorpFilter {
    pub fn new() -> Self {
        Self {
            pattern: Regex::new(r"^(\w{2}):([\w\d_-]+):(\d+):(\d+):(\d+)$")
                .expect("static pattern compiles"),
        }
    }
}

impl Default for IntercorpFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl GroupFilter for IntercorpFilter {
    fn extract_group_id(&self, rec_id: &str) -> Option<String> {
        self.pattern
            .captures(rec_id)
            .map(|caps| caps[2].to_string())
    }

    fn extract_lang(&self, registry_path: &Path) -> String {
        let path = registry_path.to_string_lossy();
        let tail_start = path.len().saturating_sub(2);
        path[tail_start..].to_string()
    }
}

/// Fallback filter: no grouping at all, language taken from the registry
/// file name.
pub struct PlainFilter;

impl GroupFilter for PlainFilter {
    fn extract_group_id(&self, _rec_id: &str) -> Option<String> {
        None
    }

    fn extract_lang(&self, registry_path: &Path) -> String {
        registry_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

pub fn filter_for(kind: ExportType) -> Box<dyn GroupFilter> {
    match kind {
        ExportType::Intercorp => Box::new(IntercorpFilter::new()),
        ExportType::Plain => Box::new(PlainFilter),
    }
}
