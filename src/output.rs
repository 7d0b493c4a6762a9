//! Table and FASTA emission.
//!
//! Writers only run after the whole reconciliation has succeeded; there is
//! no partial-output mode. The FASTA dump slices contig sequences back out
//! of their scaffolds using the reconciled layout coordinates.

use crate::fasta::SequenceStore;
use crate::layout::{LayoutRow, RowKind};
use crate::support::ContigSupport;
use log::info;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Scaffolds assigned below this confidence are demoted to the unplaced
/// chromosome for sequence emission.
pub const MIN_CONFIDENCE: f64 = 0.5;

const FASTA_LINE_WIDTH: usize = 120;

/// Demote low-confidence chromosome assignments to `chrUn`.
pub fn demote_low_confidence(rows: &mut [LayoutRow]) {
    for row in rows.iter_mut() {
        if row.confidence < MIN_CONFIDENCE {
            row.chrom = crate::chrom::UNPLACED_CHROM.to_string();
        }
    }
}

/// Write one FASTA record, wrapping the sequence at a fixed width.
pub fn write_fasta<W: Write>(header: &str, sequence: &str, output: &mut W) -> io::Result<()> {
    writeln!(output, ">{}", header)?;
    let mut chars_written = 0;
    for chunk in sequence.as_bytes().chunks(FASTA_LINE_WIDTH) {
        output.write_all(chunk)?;
        output.write_all(b"\n")?;
        chars_written += chunk.len();
    }
    if chars_written != sequence.len() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!(
                "Dropped sequence during dump: {} / {}",
                chars_written,
                sequence.len()
            ),
        ));
    }
    writeln!(output)?;
    Ok(())
}

/// Emit the whole-genome scaffold FASTA and the per-chromosome contig
/// FASTA files. Every possible chromosome file is created, with a dummy
/// record if nothing maps to it, so downstream pipelines always find their
/// declared outputs.
pub fn dump_fasta_sequences(
    rows: &[LayoutRow],
    sequences: &SequenceStore,
    output_prefix: &str,
) -> io::Result<()> {
    let scaffold_chrom: Vec<(&str, &str)> = rows
        .iter()
        .filter(|r| r.kind == RowKind::Scaffold)
        .map(|r| (r.name.as_str(), r.chrom.as_str()))
        .collect();

    let mut chroms: Vec<&str> = scaffold_chrom.iter().map(|(_, chrom)| *chrom).collect();
    chroms.sort_by(|a, b| natord::compare(a, b));
    chroms.dedup();

    let scaffold_out = format!("{}.scaffolds.wg.fasta", output_prefix);
    let mut scaffold_dump = BufWriter::new(File::create(&scaffold_out)?);

    for chrom in &chroms {
        let chrom_out = format!("{}.contigs.{}.fasta", output_prefix, chrom);
        let mut dump = BufWriter::new(File::create(&chrom_out)?);

        let mut members: Vec<&str> = scaffold_chrom
            .iter()
            .filter(|(_, c)| c == chrom)
            .map(|(scaffold, _)| *scaffold)
            .collect();
        members.sort_by(|a, b| natord::compare(a, b));

        for scaffold in members {
            let scaffold_seq = sequences.get(scaffold).ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("No sequence recorded for scaffold '{}'", scaffold),
                )
            })?;
            let header = format!("{}@{}@scf:0-{}", scaffold, chrom, scaffold_seq.len());
            write_fasta(&header, scaffold_seq, &mut scaffold_dump)?;

            for row in rows
                .iter()
                .filter(|r| r.kind == RowKind::Sequence && r.scaffold == scaffold)
            {
                let orient = if row.orientation == 1 { "frw" } else { "rev" };
                let header = format!(
                    "{}@{}@{}@{}@{}@ctg:{}-{}",
                    scaffold, chrom, row.order, orient, row.name, row.ctg_seq_start, row.ctg_seq_end
                );
                let contig_seq = &scaffold_seq[row.start as usize..row.end as usize];
                write_fasta(&header, contig_seq, &mut dump)?;
            }
        }
        dump.flush()?;
    }
    scaffold_dump.flush()?;

    let mut placeholders: Vec<String> = (1..=22).map(|i| format!("chr{}", i)).collect();
    placeholders.push("chrXY".to_string());
    placeholders.push("chrUn".to_string());
    for chrom in placeholders {
        let chrom_out = format!("{}.contigs.{}.fasta", output_prefix, chrom);
        if !Path::new(&chrom_out).exists() {
            let mut dump = BufWriter::new(File::create(&chrom_out)?);
            write_fasta("empty", &"ACGT".repeat(120), &mut dump)?;
            dump.flush()?;
        }
    }

    info!("Dumped sequences for {} chromosomes", chroms.len());
    Ok(())
}

fn layout_tsv_row(row: &LayoutRow) -> String {
    let object = match row.kind {
        RowKind::Scaffold => "scaffold",
        _ => row.scaffold.as_str(),
    };
    let counts = match &row.composition {
        Some(composition) => composition
            .counts()
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join("\t"),
        None => vec!["-1"; 10].join("\t"),
    };
    format!(
        "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{:.3}\t{}\t{}\t{}\t{}",
        object,
        row.kind.label(),
        row.name,
        row.order,
        row.start,
        row.end,
        row.length,
        row.orientation,
        row.chrom,
        row.confidence,
        row.ctg_seq_start,
        row.ctg_seq_end,
        row.cut_sites,
        counts
    )
}

/// Write the annotated layout table and the classified contig table.
pub fn dump_statistics(
    rows: &[LayoutRow],
    contigs: &[ContigSupport],
    output_prefix: &str,
) -> io::Result<()> {
    let layout_out = format!("{}.scaffold-layout.tsv", output_prefix);
    let mut writer = BufWriter::new(File::create(&layout_out)?);
    writeln!(
        writer,
        "object\tcomponent\tname\torder\tstart\tend\tlength\torientation\tchrom\tconfidence\t\
         ctg_seq_start\tctg_seq_end\tcut_sites\tA\tC\tG\tT\ta\tc\tg\tt\tN\tn"
    )?;
    for row in rows {
        writeln!(writer, "{}", layout_tsv_row(row))?;
    }
    writer.flush()?;

    let contigs_out = format!("{}.contig-stats.tsv", output_prefix);
    let mut writer = BufWriter::new(File::create(&contigs_out)?);
    writeln!(
        writer,
        "contig_name\tBNG_supported\tBNG_unsupported\tcontig_breaks\tlocal_breaks\t\
         global_breaks\tchimeric_breaks\tsupport_breaks"
    )?;
    for contig in contigs {
        writeln!(writer, "{}", contig)?;
    }
    writer.flush()?;

    info!("Wrote {} and {}", layout_out, contigs_out);
    Ok(())
}
