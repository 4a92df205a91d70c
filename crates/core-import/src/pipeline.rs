//! Wiring of the three import stages across worker threads.
//!
//! Parse and gap-fill each run on their own thread and push chunked
//! batches downstream through bounded channels; compression and the final
//! write happen on the calling thread. Channel disconnection unwinds the
//! pipeline early when a downstream stage stops consuming.

use std::io::{self, Write};
use std::thread;

use anyhow::{Context, Result, bail};
use core_attrib::AttrStore;
use core_mapping::Mapping;
use crossbeam_channel::bounded;
use tracing::{error, info};

use crate::compress::Compressor;
use crate::errors::FixGapsError;
use crate::fixgaps::GapFiller;
use crate::parse::Processor;

/// Items per batch flushed between stages.
pub const CHUNK_SIZE: usize = 5000;

/// Batches a stage-to-stage channel can hold before the producer blocks.
pub const CHANNEL_CAP: usize = 5;

#[derive(Debug, Clone, Copy)]
pub struct ImportOptions {
    pub start_from_zero: bool,
    pub struct1_size: i64,
    pub struct2_size: i64,
    pub gaps_only: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            start_from_zero: true,
            struct1_size: 0,
            struct2_size: 0,
            gaps_only: true,
        }
    }
}

/// Accumulates items into `CHUNK_SIZE` batches and forwards them through a
/// channel; stops buffering once the receiver is gone.
struct ChunkSender {
    tx: crossbeam_channel::Sender<Vec<Mapping>>,
    chunk: Vec<Mapping>,
    closed: bool,
}

impl ChunkSender {
    fn new(tx: crossbeam_channel::Sender<Vec<Mapping>>) -> Self {
        Self {
            tx,
            chunk: Vec::with_capacity(CHUNK_SIZE),
            closed: false,
        }
    }

    fn push(&mut self, item: Mapping) {
        if self.closed {
            return;
        }
        self.chunk.push(item);
        if self.chunk.len() >= CHUNK_SIZE {
            let full = std::mem::replace(&mut self.chunk, Vec::with_capacity(CHUNK_SIZE));
            if self.tx.send(full).is_err() {
                self.closed = true;
            }
        }
    }

    fn finish(mut self) {
        if !self.closed && !self.chunk.is_empty() {
            let _ = self.tx.send(std::mem::take(&mut self.chunk));
        }
    }
}

/// Runs the full import pipeline: XML lines from `reader`, compressed
/// numeric mapping lines into `out`. Per-line parse failures are logged
/// and skipped; any gap-fill overlap fails the run after the stream has
/// drained, with the poisoning `ERROR` marker already written.
pub fn run_import<R, A1, A2, W>(
    reader: R,
    processor: &Processor<'_, A1, A2>,
    opts: ImportOptions,
    mut out: W,
) -> Result<()>
where
    R: io::BufRead + Send,
    A1: AttrStore + Sync,
    A2: AttrStore + Sync,
    W: Write,
{
    let overlap_errors = thread::scope(|scope| -> Result<Vec<FixGapsError>> {
        let (parse_tx, parse_rx) = bounded::<Vec<Mapping>>(CHANNEL_CAP);
        let (fix_tx, fix_rx) = bounded::<Vec<Mapping>>(CHANNEL_CAP);

        let parse_handle = scope.spawn(move || -> io::Result<()> {
            let mut sender = ChunkSender::new(parse_tx);
            processor.process_file(reader, |mapping, _| sender.push(mapping))?;
            sender.finish();
            Ok(())
        });

        let opts_for_fill = opts;
        let fix_handle = scope.spawn(move || -> Vec<FixGapsError> {
            let mut filler = GapFiller::new(
                opts_for_fill.start_from_zero,
                opts_for_fill.struct1_size,
                opts_for_fill.struct2_size,
            );
            let mut sender = ChunkSender::new(fix_tx);
            for batch in parse_rx {
                for mapping in batch {
                    filler.step(mapping, &mut |item| sender.push(item));
                }
            }
            let errors = filler.finish(&mut |item| sender.push(item));
            sender.finish();
            errors
        });

        let mut write_err: Option<io::Error> = None;
        {
            let mut sink = |mapping: Mapping| {
                if write_err.is_none()
                    && let Err(err) = writeln!(out, "{mapping}")
                {
                    write_err = Some(err);
                }
            };
            let mut compressor = Compressor::new(opts.gaps_only);
            for batch in fix_rx {
                for mapping in batch {
                    compressor.step(mapping, &mut sink);
                }
            }
            compressor.finish(&mut sink);
        }

        match parse_handle.join() {
            Ok(result) => result.context("reading alignment input")?,
            Err(_) => bail!("parse stage panicked"),
        }
        let errors = match fix_handle.join() {
            Ok(errors) => errors,
            Err(_) => bail!("gap-fill stage panicked"),
        };
        if let Some(err) = write_err {
            return Err(err).context("writing mapping output");
        }
        out.flush().context("flushing mapping output")?;
        Ok(errors)
    })?;

    if !overlap_errors.is_empty() {
        for err in &overlap_errors {
            error!(target: "import.fixgaps", "{}", err);
        }
        bail!(
            "cannot produce correct alignment: {} overlapping records",
            overlap_errors.len()
        );
    }
    info!(target: "import.pipeline", "import finished");
    Ok(())
}
