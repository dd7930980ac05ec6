//! cram-rs CLI
//!
//! A thin driver over the CRAM decoding pipeline. Argument parsing here is
//! deliberately minimal: the real engineering (codecs, container/slice
//! parsing, normalization) lives in `cram-core`, `cram-codecs`,
//! `cram-format`, and `cram-normalize`. This binary wires them to a file on
//! disk and reports the record/base counts a caller would want without a
//! full SAM/BAM writer.

mod reference_source;

use clap::{Parser, Subcommand};
use cram_format::container::Container;
use cram_format::file_header::FileHeader;
use cram_format::sam_header::SamHeader;
use cram_normalize::normalizer::{normalize, NormalizeContext};
use cram_normalize::reference::ReferenceCache;
use reference_source::FastaReferenceSource;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "cram-rs")]
#[command(author, version, about = "Decode a CRAM alignment container stream")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Decode a CRAM file and report record/base counts.
    Decode {
        /// Path to the CRAM file.
        input: PathBuf,

        /// Optional FASTA reference used to resolve read bases; without it,
        /// reference-delta reads are filled with `N`.
        #[arg(short, long)]
        reference: Option<PathBuf>,

        /// Default quality score for positions no feature assigns.
        #[arg(long, default_value_t = 30)]
        default_quality: u8,

        /// Log reference MD5 mismatches instead of aborting the decode.
        #[arg(long)]
        ignore_ref_md5: bool,
    },

    /// Print the file header and SAM header without decoding containers.
    Info {
        /// Path to the CRAM file.
        input: PathBuf,
    },
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Decode {
            input,
            reference,
            default_quality,
            ignore_ref_md5,
        } => run_decode(&input, reference.as_deref(), default_quality, ignore_ref_md5),
        Command::Info { input } => run_info(&input),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run_info(input: &std::path::Path) -> cram_core::error::Result<()> {
    let file = File::open(input)?;
    let mut reader = BufReader::new(file);

    let file_header = FileHeader::read(&mut reader)?;
    let sam_header = SamHeader::read(&mut reader)?;

    println!(
        "CRAM v{}.{}, id={:?}",
        file_header.major_version, file_header.minor_version, file_header.id
    );
    println!("{} reference sequences", sam_header.sequence_names.len());
    Ok(())
}

fn run_decode(
    input: &std::path::Path,
    reference: Option<&std::path::Path>,
    default_quality: u8,
    ignore_ref_md5: bool,
) -> cram_core::error::Result<()> {
    let file = File::open(input)?;
    let mut reader = BufReader::new(file);

    let file_header = FileHeader::read(&mut reader)?;
    if !file_header.is_supported_version() {
        log::warn!(
            "unsupported CRAM major version {}; attempting decode anyway",
            file_header.major_version
        );
    }
    let sam_header = SamHeader::read(&mut reader)?;

    let source = FastaReferenceSource::load(reference, &sam_header)?;
    let mut reference_cache = ReferenceCache::new(source);

    let mut counter = 0usize;
    let mut total_records = 0usize;
    let mut total_bases = 0usize;
    let mut container_index = 0usize;

    loop {
        let container = match Container::read(&mut reader) {
            Ok(container) => container,
            Err(cram_core::error::CramError::Io(e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(err) => {
                log::error!("container {container_index} failed to decode: {err}");
                return Err(err);
            }
        };

        for mut slice in container.slices {
            let reference_bases = reference_cache.bases_for(container.sequence_id).to_vec();

            if !reference_bases.is_empty() {
                if let Err(err) = slice.verify_ref_md5(&reference_bases) {
                    if ignore_ref_md5 {
                        log::warn!("{err}");
                    } else {
                        return Err(err);
                    }
                }
            }

            let ctx = NormalizeContext {
                reference_bases: &reference_bases,
                substitution_matrix: &container.compression_header.substitution_matrix,
                sam_header: &sam_header,
                force_preserve_quality_scores: container
                    .compression_header
                    .preservation
                    .force_preserve_quality_scores,
                default_quality_score: default_quality,
                read_name_prefix: "cram-rs:",
            };
            normalize(&mut slice.records, &ctx, &mut counter)?;

            total_records += slice.records.len();
            total_bases += slice.records.iter().map(|r| r.bases.len()).sum::<usize>();
        }

        container_index += 1;
    }

    println!("{container_index} containers, {total_records} records, {total_bases} bases");
    Ok(())
}
