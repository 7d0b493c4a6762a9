use clap::Parser;
use log::{debug, info};
use scafrecon::agp::parse_agp_file;
use scafrecon::bed::{chrom_cluster_coverage, AlignmentIndex};
use scafrecon::breaks::classify_contig_breaks;
use scafrecon::chrom::assign_scaffold_chromosomes;
use scafrecon::fasta::load_fasta_scaffolds;
use scafrecon::order::{annotate_scaffold_chromosomes, assign_agp_order};
use scafrecon::output::{demote_low_confidence, dump_fasta_sequences, dump_statistics};
use scafrecon::support::compute_contig_support;
use std::fs;
use std::io;
use std::path::Path;

/// Reconcile a hybrid-scaffold assembly: segment the scaffold FASTA,
/// cross-check it against the AGP layout, classify contig breaks from
/// reference alignments and dump annotated tables and sequences.
#[derive(Parser, Debug)]
#[command(author, version, about, disable_help_subcommand = true)]
struct Args {
    /// Path to the hybrid-scaffold AGP file
    #[clap(short = 'a', long, value_parser)]
    agp_file: String,

    /// Path to the hybrid-scaffold FASTA file
    #[clap(short = 'f', long, value_parser)]
    fasta_file: String,

    /// Path to the BED file with contig-to-reference alignments
    #[clap(short = 'b', long, value_parser)]
    bed_file: String,

    /// Prefix for all output files
    #[clap(short = 'o', long, value_parser, default_value = "bng_hybrid")]
    output: String,

    /// Do not read or write the binary FASTA layout cache
    #[clap(long, action)]
    no_fasta_cache: bool,

    /// Verbosity level (0 = error, 1 = info, 2 = debug)
    #[clap(short, long, default_value = "0")]
    verbose: u8,
}

fn main() -> io::Result<()> {
    let args = Args::parse();

    // Initialize logger based on verbosity
    env_logger::Builder::new()
        .filter_level(match args.verbose {
            0 => log::LevelFilter::Error,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .init();

    if let Some(parent) = Path::new(&args.output).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    info!("Loading scaffold FASTA from {}", args.fasta_file);
    let layout = load_fasta_scaffolds(&args.fasta_file, &args.output, args.no_fasta_cache)?;
    let mut rows = layout.rows;

    info!("Loading AGP records from {}", args.agp_file);
    let agp = parse_agp_file(&args.agp_file)?;

    info!("Loading reference alignments from {}", args.bed_file);
    let alignments = AlignmentIndex::from_file(&args.bed_file)?;
    for ((chrom, cluster, mapq), length) in
        chrom_cluster_coverage(&alignments.records).into_iter().take(10)
    {
        debug!(
            "Aligned {} bp to {} from cluster {} at mapq {}",
            length, chrom, cluster, mapq
        );
    }

    let mut support = compute_contig_support(&agp)?;
    let assignment = assign_scaffold_chromosomes(&support.contig_to_scaffold, &alignments);
    classify_contig_breaks(&mut support, &assignment)?;

    annotate_scaffold_chromosomes(&mut rows, &assignment)?;
    assign_agp_order(&mut rows, &agp)?;
    demote_low_confidence(&mut rows);

    dump_fasta_sequences(&rows, &layout.sequences, &args.output)?;
    dump_statistics(&rows, &support.contigs, &args.output)?;

    info!("Done");
    Ok(())
}
