//! Derivation of a direct L1↔L2 alignment from two pivot alignments
//! L1↔P and L2↔P sharing the pivot language P.

pub mod pivot;
pub mod walk;

pub use pivot::{FILE_TO_CAPACITY_RATIO, LoadError, PivotMapping};
pub use walk::run_transalign;
