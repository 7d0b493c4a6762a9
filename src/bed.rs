//! Contig-to-reference alignment (BED) parsing and aggregation.
//!
//! Six fixed tab-separated columns, no header: chrom, start, end, contig,
//! mapping quality, strand. Chromosome labels are normalized by stripping
//! everything after the first underscore (`chr1_random` -> `chr1`); the
//! cluster key is the contig-name prefix before its first underscore.

use log::debug;
use rustc_hash::FxHashMap;
use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Error as IoError};
use std::num::ParseIntError;

#[derive(Debug)]
pub enum ParseErr {
    NotEnoughFields,
    IoError(IoError),
    InvalidField(ParseIntError),
    InvalidStrand,
}

impl fmt::Display for ParseErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseErr::NotEnoughFields => write!(f, "Not enough fields in BED record"),
            ParseErr::IoError(e) => write!(f, "IO error: {}", e),
            ParseErr::InvalidField(e) => write!(f, "Invalid field: {}", e),
            ParseErr::InvalidStrand => write!(f, "Invalid strand"),
        }
    }
}

impl std::error::Error for ParseErr {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strand {
    Forward,
    Reverse,
}

/// One contig-to-reference alignment with its derived fields.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignmentRecord {
    /// Reference chromosome with unplaced suffixes stripped.
    pub chrom: String,
    pub start: i64,
    pub end: i64,
    pub contig: String,
    pub mapq: u32,
    pub strand: Strand,
    pub length: i64,
    /// Contig-name prefix before the first underscore.
    pub cluster: String,
}

fn parse_bed_line(line: &str) -> Result<AlignmentRecord, ParseErr> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() < 6 {
        return Err(ParseErr::NotEnoughFields);
    }

    let chrom = fields[0]
        .split('_')
        .next()
        .unwrap_or(fields[0])
        .to_string();
    let start = fields[1].parse::<i64>().map_err(ParseErr::InvalidField)?;
    let end = fields[2].parse::<i64>().map_err(ParseErr::InvalidField)?;
    let contig = fields[3].to_string();
    let mapq = fields[4].parse::<u32>().map_err(ParseErr::InvalidField)?;
    let strand = match fields[5] {
        "+" => Strand::Forward,
        "-" => Strand::Reverse,
        _ => return Err(ParseErr::InvalidStrand),
    };
    let cluster = contig.split('_').next().unwrap_or(&contig).to_string();

    Ok(AlignmentRecord {
        chrom,
        start,
        end,
        contig,
        mapq,
        strand,
        length: end - start,
        cluster,
    })
}

pub fn parse_bed<R: BufRead>(reader: R) -> Result<Vec<AlignmentRecord>, ParseErr> {
    let mut records = Vec::new();
    for line_result in reader.lines() {
        let line = line_result.map_err(ParseErr::IoError)?;
        if line.is_empty() {
            continue;
        }
        records.push(parse_bed_line(&line)?);
    }
    Ok(records)
}

/// Alignment records plus the per-contig evidence table used for scaffold
/// chromosome assignment.
#[derive(Debug)]
pub struct AlignmentIndex {
    pub records: Vec<AlignmentRecord>,
    /// contig -> (chrom, mapq) -> summed aligned length
    pub by_contig: FxHashMap<String, FxHashMap<(String, u32), i64>>,
}

impl AlignmentIndex {
    pub fn from_records(records: Vec<AlignmentRecord>) -> Self {
        let mut by_contig: FxHashMap<String, FxHashMap<(String, u32), i64>> =
            FxHashMap::default();
        for record in &records {
            *by_contig
                .entry(record.contig.clone())
                .or_default()
                .entry((record.chrom.clone(), record.mapq))
                .or_insert(0) += record.length;
        }
        AlignmentIndex { records, by_contig }
    }

    pub fn from_file(bed_file: &str) -> io::Result<Self> {
        let file = File::open(bed_file).map_err(|e| {
            io::Error::new(e.kind(), format!("Failed to open '{}': {}", bed_file, e))
        })?;
        let reader = BufReader::new(file);
        let records = parse_bed(reader).map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Failed to parse BED from {}: {}", bed_file, e),
            )
        })?;
        debug!("Parsed {} alignment records from {}", records.len(), bed_file);
        Ok(AlignmentIndex::from_records(records))
    }
}

/// Aggregate coverage per (chrom, cluster, mapq), sorted descending by
/// summed aligned length. Reported for diagnostics.
pub fn chrom_cluster_coverage(records: &[AlignmentRecord]) -> Vec<((String, String, u32), i64)> {
    let mut coverage: FxHashMap<(String, String, u32), i64> = FxHashMap::default();
    for record in records {
        *coverage
            .entry((record.chrom.clone(), record.cluster.clone(), record.mapq))
            .or_insert(0) += record.length;
    }
    let mut entries: Vec<_> = coverage.into_iter().collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    entries
}
