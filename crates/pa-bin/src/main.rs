//! pivotalign entrypoint: wires files, stdin and stdout to the alignment
//! pipelines. No domain logic lives here.

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, LineWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Once;

use anyhow::{Context, Result, bail};
use clap::Parser;
use clap::error::ErrorKind;
use core_attrib::{AttrStore, Corpus, FileAttrStore};
use core_export::{ExportArgs, ExportType, filter_for, run_export};
use core_import::{Compressor, ImportOptions, Processor, QuoteStyle, run_import};
use core_mapping::{Mapping, ProcPosition};
use core_transalign::{PivotMapping, run_transalign};
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

mod cli;

use cli::{Args, Command};

/// Global flags merged with the optional config file; flags win.
struct Settings {
    quote: QuoteStyle,
    start_from_zero: bool,
    line_buffer: bool,
    registry_prefix: Option<PathBuf>,
    export_type: ExportType,
    ready_window: i64,
}

impl Settings {
    fn merge(args: &Args, config: &core_config::Config) -> Self {
        let quote_style = args.quote_style.unwrap_or(config.file.import.quote_style);
        let export_type = args
            .export_type
            .as_deref()
            .map(ExportType::from_name)
            .unwrap_or_else(|| ExportType::from_name(&config.file.export.filter_type));
        Self {
            quote: if quote_style == 2 {
                QuoteStyle::Double
            } else {
                QuoteStyle::Single
            },
            start_from_zero: config.file.import.start_from_zero,
            line_buffer: args.line_buffer || config.file.io.line_buffer,
            registry_prefix: args
                .registry_path
                .clone()
                .or_else(|| config.file.io.registry_path.clone()),
            export_type,
            ready_window: config.file.export.ready_window,
        }
    }

    fn resolve_registry(&self, registry: &Path) -> PathBuf {
        match (&self.registry_prefix, registry.is_absolute()) {
            (Some(prefix), false) => prefix.join(registry),
            _ => registry.to_path_buf(),
        }
    }
}

fn init_logging() -> Option<WorkerGuard> {
    let (writer, guard) = tracing_appender::non_blocking(io::stderr());
    match tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(writer)
        .try_init()
    {
        Ok(()) => Some(guard),
        Err(_) => None,
    }
}

fn install_panic_hook() {
    static HOOK: Once = Once::new();
    HOOK.call_once(|| {
        let default_panic = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            tracing::error!(target: "runtime.panic", ?info, "panic");
            default_panic(info);
        }));
    });
}

fn open_corpus_attr(
    settings: &Settings,
    registry: &Path,
    attr: &str,
) -> Result<(Corpus, FileAttrStore)> {
    let registry = settings.resolve_registry(registry);
    let corpus = Corpus::open(&registry)
        .with_context(|| format!("opening corpus registry {}", registry.display()))?;
    let store = corpus
        .attr(attr)
        .with_context(|| format!("loading attribute {attr}"))?;
    Ok((corpus, store))
}

fn cmd_import(
    settings: &Settings,
    reg1: &Path,
    reg2: &Path,
    attr: &str,
    mapping_file: Option<&Path>,
) -> Result<()> {
    let (corpus1, attr1) = open_corpus_attr(settings, reg1, attr)?;
    let (corpus2, attr2) = open_corpus_attr(settings, reg2, attr)?;
    let struct1_size = corpus1.struct_size(attr)?;
    let struct2_size = corpus2.struct_size(attr)?;

    let reader: Box<dyn BufRead + Send> = match mapping_file {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("opening {}", path.display()))?,
        )),
        None => Box::new(BufReader::new(io::stdin())),
    };
    let processor = Processor::new(&attr1, &attr2, settings.quote);
    let opts = ImportOptions {
        start_from_zero: settings.start_from_zero,
        struct1_size,
        struct2_size,
        gaps_only: true,
    };
    let stdout = io::stdout();
    if settings.line_buffer {
        run_import(reader, &processor, opts, LineWriter::new(stdout.lock()))
    } else {
        run_import(reader, &processor, opts, BufWriter::new(stdout.lock()))
    }
}

fn cmd_transalign(settings: &Settings, file1: &Path, file2: &Path) -> Result<()> {
    let pm1 = PivotMapping::load(file1)?;
    let pm2 = PivotMapping::load(file2)?;

    let stdout = io::stdout();
    let mut out: Box<dyn Write> = if settings.line_buffer {
        Box::new(LineWriter::new(stdout.lock()))
    } else {
        Box::new(BufWriter::new(stdout.lock()))
    };
    let mut write_err: Option<io::Error> = None;
    let mut final_pos = ProcPosition::start();
    let mut compressor = Compressor::new(false);
    {
        let mut sink = |mapping: Mapping| {
            if write_err.is_none()
                && let Err(err) = writeln!(out, "{mapping}")
            {
                write_err = Some(err);
            }
        };
        run_transalign(&pm1, &pm2, |item, pos| {
            final_pos = pos;
            compressor.step(*item, &mut sink);
        });
        compressor.finish(&mut sink);
    }
    if let Some(err) = write_err {
        return Err(err).context("writing alignment output");
    }
    out.flush().context("flushing alignment output")?;
    info!(
        target: "transalign.run",
        left = final_pos.left,
        right = final_pos.right,
        "alignment written"
    );
    Ok(())
}

fn cmd_export(
    settings: &Settings,
    reg1: &Path,
    reg2: &Path,
    attr: &str,
    mapping_file: &Path,
) -> Result<()> {
    let (_, attr1) = open_corpus_attr(settings, reg1, attr)?;
    let (_, attr2) = open_corpus_attr(settings, reg2, attr)?;
    let filter = filter_for(settings.export_type);
    let reg1 = settings.resolve_registry(reg1);
    let reg2 = settings.resolve_registry(reg2);
    let args = ExportArgs {
        attr1: &attr1,
        attr2: &attr2,
        reg1: &reg1,
        reg2: &reg2,
        filter: filter.as_ref(),
        ready_window: settings.ready_window,
    };
    let file = File::open(mapping_file)
        .with_context(|| format!("opening {}", mapping_file.display()))?;
    let stdout = io::stdout();
    if settings.line_buffer {
        run_export(&args, BufReader::new(file), LineWriter::new(stdout.lock()))
    } else {
        run_export(&args, BufReader::new(file), BufWriter::new(stdout.lock()))
    }
}

fn cmd_search(settings: &Settings, reg: &Path, attr: &str, position: &str) -> Result<()> {
    let (_, store) = open_corpus_attr(settings, reg, attr)?;
    match position.parse::<i64>() {
        Ok(id) => match store.id2str(id) {
            Some(value) => println!("{value}"),
            None => bail!("position {id} not found in attribute {attr}"),
        },
        Err(_) => println!("{}", store.str2id(position)),
    }
    Ok(())
}

fn run(args: Args) -> Result<()> {
    let config = core_config::load_from(args.config.clone())?;
    let settings = Settings::merge(&args, &config);
    match &args.command {
        Command::Import {
            reg1,
            reg2,
            attr,
            mapping_file,
        } => cmd_import(&settings, reg1, reg2, attr, mapping_file.as_deref()),
        Command::Transalign { file1, file2 } => cmd_transalign(&settings, file1, file2),
        Command::Export {
            reg1,
            reg2,
            attr,
            mapping_file,
        } => cmd_export(&settings, reg1, reg2, attr, mapping_file),
        Command::Search {
            reg,
            attr,
            position,
        } => cmd_search(&settings, reg, attr, position),
    }
}

fn main() {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            if matches!(
                err.kind(),
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion
            ) {
                err.exit();
            }
            let _ = err.print();
            std::process::exit(1);
        }
    };
    let _log_guard = init_logging();
    install_panic_hook();
    info!(target: "runtime", "startup");
    if let Err(err) = run(args) {
        error!(target: "runtime", "{err:#}");
        std::process::exit(1);
    }
}
