//! Command line surface.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "pivotalign",
    version,
    about = "Numeric sentence-alignment tables between parallel corpora"
)]
pub struct Args {
    /// Configuration file path (overrides discovery of `pivotalign.toml`).
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Flush output after every record (useful when piping).
    #[arg(long)]
    pub line_buffer: bool,
    /// Prefix prepended to relative registry arguments.
    #[arg(long)]
    pub registry_path: Option<PathBuf>,
    /// Quote style around xtargets values: 1 = single, 2 = double.
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=2))]
    pub quote_style: Option<u8>,
    /// Group filter used by export ("intercorp" or empty).
    #[arg(long)]
    pub export_type: Option<String>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Convert an alignment XML file into the numeric mapping format.
    Import {
        reg1: PathBuf,
        reg2: PathBuf,
        attr: String,
        /// Alignment XML file; stdin when omitted.
        mapping_file: Option<PathBuf>,
    },
    /// Compose two pivot mappings into a direct L1-L2 mapping.
    Transalign { file1: PathBuf, file2: PathBuf },
    /// Re-export a numeric mapping as grouped alignment XML.
    Export {
        reg1: PathBuf,
        reg2: PathBuf,
        attr: String,
        mapping_file: PathBuf,
    },
    /// Resolve a numeric position or a structure identifier in a corpus.
    Search {
        reg: PathBuf,
        attr: String,
        position: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_import_with_global_flags() {
        let args = Args::try_parse_from([
            "pivotalign",
            "--quote-style",
            "2",
            "--line-buffer",
            "import",
            "registry/cs",
            "registry/en",
            "s.id",
        ])
        .unwrap();
        assert_eq!(args.quote_style, Some(2));
        assert!(args.line_buffer);
        match args.command {
            Command::Import {
                attr, mapping_file, ..
            } => {
                assert_eq!(attr, "s.id");
                assert!(mapping_file.is_none());
            }
            other => panic!("expected import, got {other:?}"),
        }
    }

    #[test]
    fn rejects_out_of_range_quote_style() {
        assert!(
            Args::try_parse_from(["pivotalign", "--quote-style", "3", "transalign", "a", "b"])
                .is_err()
        );
    }

    #[test]
    fn transalign_requires_both_files() {
        assert!(Args::try_parse_from(["pivotalign", "transalign", "only-one"]).is_err());
        let args =
            Args::try_parse_from(["pivotalign", "transalign", "cs2pivot", "en2pivot"]).unwrap();
        match args.command {
            Command::Transalign { file1, file2 } => {
                assert_eq!(file1, PathBuf::from("cs2pivot"));
                assert_eq!(file2, PathBuf::from("en2pivot"));
            }
            other => panic!("expected transalign, got {other:?}"),
        }
    }

    #[test]
    fn export_takes_mapping_file() {
        let args = Args::try_parse_from([
            "pivotalign",
            "--export-type",
            "intercorp",
            "export",
            "registry/cs",
            "registry/en",
            "s.id",
            "aligned.tsv",
        ])
        .unwrap();
        assert_eq!(args.export_type.as_deref(), Some("intercorp"));
        match args.command {
            Command::Export { mapping_file, .. } => {
                assert_eq!(mapping_file, PathBuf::from("aligned.tsv"));
            }
            other => panic!("expected export, got {other:?}"),
        }
    }

    #[test]
    fn missing_subcommand_is_an_error() {
        assert!(Args::try_parse_from(["pivotalign"]).is_err());
    }
}
