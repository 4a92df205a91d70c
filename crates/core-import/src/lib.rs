//! The import pipeline: alignment XML lines in, dense compressed numeric
//! mapping lines out.
//!
//! Three stages run concurrently, chained by bounded channels of chunked
//! batches: the parse stage resolves `xtargets` identifier pairs to
//! numeric ranges, the gap filler inserts placeholder records so both axes
//! are covered from position 0 to the corpus structure count, and the
//! compressor coalesces adjacent one-sided runs into ranges.

pub mod compress;
pub mod errors;
pub mod fixgaps;
pub mod parse;
pub mod pipeline;

pub use compress::Compressor;
pub use errors::{FixGapsError, ParseLineError};
pub use fixgaps::GapFiller;
pub use parse::{Processor, QuoteStyle};
pub use pipeline::{CHANNEL_CAP, CHUNK_SIZE, ImportOptions, run_import};
