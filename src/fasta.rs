//! FASTA scaffold parsing and parse-once layout caching.
//!
//! Parsing a multi-gigabyte scaffold FASTA dominates the run time, so the
//! segmented layout and the raw sequence store are serialized to a cache
//! file next to the output prefix and reused on later runs. The cache write
//! is an independent, idempotent side effect; there is no locking, so
//! concurrent runs against one cache path must be serialized by the caller.

use crate::layout::{BaseComposition, LayoutRow};
use crate::segment::{characterize_scaffold, fill_gap_coordinates};
use log::{debug, info, warn};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter};

pub type SequenceStore = FxHashMap<String, String>;

/// Segmented layout rows plus the scaffold name -> raw sequence store.
#[derive(Debug, Serialize, Deserialize)]
pub struct FastaLayout {
    pub rows: Vec<LayoutRow>,
    pub sequences: SequenceStore,
}

fn flush_scaffold(
    rows: &mut Vec<LayoutRow>,
    sequences: &mut SequenceStore,
    name: &str,
    sequence: &mut String,
) {
    if sequence.is_empty() {
        return;
    }
    rows.push(LayoutRow::scaffold_row(
        name,
        sequence.len() as i64,
        BaseComposition::from_seq(sequence),
    ));
    rows.extend(characterize_scaffold(sequence, name));
    sequences.insert(name.to_string(), std::mem::take(sequence));
}

/// Parse a scaffold FASTA into its segmented layout and sequence store.
pub fn parse_fasta_scaffolds(fasta_file: &str) -> io::Result<FastaLayout> {
    let file = File::open(fasta_file).map_err(|e| {
        io::Error::new(e.kind(), format!("Failed to open '{}': {}", fasta_file, e))
    })?;
    let reader = BufReader::new(file);

    let mut rows = Vec::new();
    let mut sequences = SequenceStore::default();
    let mut current_name = String::new();
    let mut current_seq = String::new();

    for line_result in reader.lines() {
        let line = line_result?;
        if let Some(header) = line.strip_prefix('>') {
            flush_scaffold(&mut rows, &mut sequences, &current_name, &mut current_seq);
            current_name = header.trim().to_string();
        } else {
            current_seq.push_str(line.trim());
        }
    }
    flush_scaffold(&mut rows, &mut sequences, &current_name, &mut current_seq);

    fill_gap_coordinates(&mut rows);

    info!(
        "Segmented {} scaffolds into {} layout rows",
        sequences.len(),
        rows.len()
    );
    Ok(FastaLayout { rows, sequences })
}

fn cache_path(output_prefix: &str) -> String {
    format!("{}.cache.fasta.bin", output_prefix)
}

fn load_cached_layout(fasta_file: &str, cache_file: &str) -> io::Result<FastaLayout> {
    let fasta_metadata = std::fs::metadata(fasta_file)?;
    let cache_metadata = std::fs::metadata(cache_file)?;
    if let (Ok(fasta_ts), Ok(cache_ts)) = (fasta_metadata.modified(), cache_metadata.modified()) {
        if fasta_ts > cache_ts {
            warn!("WARNING:\tFASTA file has been modified since layout cache creation.");
        }
    } else {
        warn!("WARNING:\tUnable to compare timestamps of FASTA file and layout cache.");
    }

    let file = File::open(cache_file)?;
    let reader = BufReader::new(file);
    let layout: FastaLayout = bincode::deserialize_from(reader).map_err(|e| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("Failed to deserialize layout cache {}: {:?}", cache_file, e),
        )
    })?;
    debug!("Loaded layout cache from {}", cache_file);
    Ok(layout)
}

/// Load the segmented FASTA layout, going through the cache unless disabled.
pub fn load_fasta_scaffolds(
    fasta_file: &str,
    output_prefix: &str,
    no_cache: bool,
) -> io::Result<FastaLayout> {
    if no_cache {
        return parse_fasta_scaffolds(fasta_file);
    }

    let cache_file = cache_path(output_prefix);
    if std::path::Path::new(&cache_file).exists() {
        load_cached_layout(fasta_file, &cache_file)
    } else {
        let layout = parse_fasta_scaffolds(fasta_file)?;
        let file = File::create(&cache_file)?;
        let writer = BufWriter::new(file);
        bincode::serialize_into(writer, &layout).map_err(|e| {
            io::Error::new(
                io::ErrorKind::Other,
                format!("Failed to serialize layout cache {}: {:?}", cache_file, e),
            )
        })?;
        debug!("Wrote layout cache to {}", cache_file);
        Ok(layout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::RowKind;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_fixture(dir: &TempDir) -> String {
        let path = dir.path().join("scaffolds.fasta");
        let mut file = File::create(&path).unwrap();
        // 8-base wrap to exercise multi-line sequences
        writeln!(file, ">Super-Scaffold_1").unwrap();
        writeln!(file, "ACGTACGT").unwrap();
        writeln!(file, "NNNNNNNN").unwrap();
        writeln!(file, "ACGTACGT").unwrap();
        writeln!(file, ">Super-Scaffold_2").unwrap();
        writeln!(file, "ACGTACGTACGT").unwrap();
        path.to_str().unwrap().to_string()
    }

    #[test]
    fn test_parse_fasta_scaffolds() {
        let dir = TempDir::new().unwrap();
        let fasta = write_fixture(&dir);

        let layout = parse_fasta_scaffolds(&fasta).unwrap();
        assert_eq!(layout.sequences.len(), 2);
        assert_eq!(layout.sequences["Super-Scaffold_1"].len(), 24);

        // scaffold row + seq/gap/seq, then scaffold row + seq
        assert_eq!(layout.rows.len(), 6);
        assert_eq!(layout.rows[0].kind, RowKind::Scaffold);
        assert_eq!(layout.rows[0].length, 24);
        assert_eq!(layout.rows[2].kind, RowKind::Gap);
        assert_eq!((layout.rows[2].start, layout.rows[2].end), (8, 16));
        assert_eq!(layout.rows[4].kind, RowKind::Scaffold);
        assert_eq!(layout.rows[4].name, "Super-Scaffold_2");
    }

    #[test]
    fn test_cache_round_trip() {
        let dir = TempDir::new().unwrap();
        let fasta = write_fixture(&dir);
        let prefix = dir.path().join("out").to_str().unwrap().to_string();

        let first = load_fasta_scaffolds(&fasta, &prefix, false).unwrap();
        assert!(std::path::Path::new(&cache_path(&prefix)).exists());

        let second = load_fasta_scaffolds(&fasta, &prefix, false).unwrap();
        assert_eq!(first.rows.len(), second.rows.len());
        assert_eq!(first.sequences, second.sequences);
        assert_eq!(first.rows[2].start, second.rows[2].start);
    }

    #[test]
    fn test_no_cache_skips_cache_file() {
        let dir = TempDir::new().unwrap();
        let fasta = write_fixture(&dir);
        let prefix = dir.path().join("nocache").to_str().unwrap().to_string();

        load_fasta_scaffolds(&fasta, &prefix, true).unwrap();
        assert!(!std::path::Path::new(&cache_path(&prefix)).exists());
    }
}
