//! Order reconciliation between the FASTA layout and the AGP.
//!
//! Ideally a scaffold's FASTA segments and its AGP records pair up one to
//! one. Some upstream assemblers insert their own N stretches into contigs,
//! though, and those gaps never appear in the AGP: the scaffold then has
//! more FASTA segments than AGP records and the declared components must be
//! re-matched by coordinates, with split sequence fragments tracked through
//! an explicit active-split state.

use crate::agp::{AgpRecord, ComponentType};
use crate::chrom::ChromAssignment;
use crate::contig_id::ContigId;
use crate::layout::{LayoutRow, OrderKey, RowKind};
use log::debug;
use rustc_hash::FxHashMap;
use std::io;

fn orientation_of(field: &str) -> i8 {
    match field {
        "+" => 1,
        "-" => -1,
        _ => 0,
    }
}

/// Annotate every layout row with its scaffold's chromosome assignment.
pub fn annotate_scaffold_chromosomes(
    rows: &mut [LayoutRow],
    assignment: &ChromAssignment,
) -> io::Result<()> {
    for row in rows.iter_mut() {
        let (chrom, confidence) = assignment.get(&row.scaffold).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "No chromosome assignment for scaffold '{}': {}",
                    row.scaffold, row
                ),
            )
        })?;
        row.chrom = chrom.clone();
        row.confidence = *confidence;
    }
    Ok(())
}

fn apply_gap_match(row: &mut LayoutRow, record: &AgpRecord) -> io::Result<()> {
    let agp_gap = record.gap_length()?;
    if agp_gap != row.length {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("Gap length mismatch: {} / {}", row, record),
        ));
    }
    row.name = "gap".to_string();
    row.order = OrderKey::component(record.comp_number);
    row.ctg_seq_start = -1;
    row.ctg_seq_end = -1;
    row.orientation = 0;
    Ok(())
}

fn apply_sequence_match(row: &mut LayoutRow, record: &AgpRecord) -> io::Result<()> {
    let agp_len = record.component_length()?;
    if agp_len != row.length {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("Sequence length mismatch: {} / {}", row, record),
        ));
    }
    let contig_id = ContigId::parse(&record.comp_name_or_gap_length);
    let (start, end) = match contig_id.subrange {
        Some((start, end)) => {
            if end - start != row.length {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("Sub-range length mismatch: {} / {}", row, record),
                ));
            }
            (start, end)
        }
        None => (0, row.length),
    };
    row.name = contig_id.base;
    row.order = OrderKey::component(record.comp_number);
    row.ctg_seq_start = start;
    row.ctg_seq_end = end;
    row.orientation = orientation_of(&record.comp_orient_or_evidence);
    Ok(())
}

/// Compatible regime: segment and AGP record counts agree, pair them
/// positionally and verify type and length agreement.
fn reconcile_compatible(segments: &mut [LayoutRow], agp: &[&AgpRecord]) -> io::Result<()> {
    for (row, record) in segments.iter_mut().zip(agp.iter()) {
        match (row.kind, record.comp_type) {
            (RowKind::Gap, ComponentType::Gap) => apply_gap_match(row, record)?,
            (RowKind::Sequence, ComponentType::Sequence) => apply_sequence_match(row, record)?,
            _ => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("Component type mismatch: {} / {}", row, record),
                ))
            }
        }
    }
    Ok(())
}

/// A sequence component split across several FASTA fragments by
/// assembler-inserted gaps.
#[derive(Debug)]
struct ActiveSplit {
    component: u32,
    count: u32,
    name: String,
    orientation: i8,
    /// Running position inside the original contig.
    cursor: i64,
    /// Object end of the previous fragment of this split.
    last_end: i64,
}

#[derive(Debug)]
enum SplitState {
    Idle,
    Active(ActiveSplit),
}

/// Incompatible regime: extra gaps were inserted by the upstream assembler
/// and are absent from the AGP. Match by coordinates where possible, then
/// walk the leftover sequence fragments through the split state machine.
fn reconcile_incompatible(segments: &mut [LayoutRow], agp: &[&AgpRecord]) -> io::Result<()> {
    let mut unmatched: Vec<usize> = Vec::new();

    for (idx, row) in segments.iter_mut().enumerate() {
        let object_start = row.start + 1; // AGP is 1-based
        let kind = row.kind;
        let length = row.length;
        let matched = agp.iter().copied().find(|record| {
            if record.object_start != object_start {
                return false;
            }
            match (kind, record.comp_type) {
                (RowKind::Gap, ComponentType::Gap) => record.gap_length().ok() == Some(length),
                (RowKind::Sequence, ComponentType::Sequence) => {
                    record.component_length().ok() == Some(length)
                }
                _ => false,
            }
        });

        match matched {
            Some(record) if kind == RowKind::Gap => apply_gap_match(row, record)?,
            Some(record) => apply_sequence_match(row, record)?,
            None if kind == RowKind::Gap => {
                // Assembler-only gap: legitimate and ignorable.
                row.name = "gap".to_string();
                row.order = OrderKey::UNPLACED;
                row.ctg_seq_start = -1;
                row.ctg_seq_end = -1;
                row.orientation = 0;
            }
            None => unmatched.push(idx),
        }
    }

    let mut state = SplitState::Idle;
    for idx in unmatched {
        let row = &mut segments[idx];
        let object_start = row.start + 1;
        let hits: Vec<&AgpRecord> = agp
            .iter()
            .copied()
            .filter(|record| record.object_start == object_start)
            .collect();

        match hits.as_slice() {
            [record] => {
                // First fragment of a split component.
                let contig_id = ContigId::parse(&record.comp_name_or_gap_length);
                let (start, end) = match contig_id.subrange {
                    Some((start, _)) => (start, start + row.length),
                    None => (0, row.length),
                };
                row.name = contig_id.base.clone();
                row.orientation = orientation_of(&record.comp_orient_or_evidence);
                row.order = OrderKey::split(record.comp_number, 1);
                row.ctg_seq_start = start;
                row.ctg_seq_end = end;
                state = SplitState::Active(ActiveSplit {
                    component: record.comp_number,
                    count: 1,
                    name: contig_id.base,
                    orientation: row.orientation,
                    cursor: end,
                    last_end: row.end,
                });
            }
            [] => match state {
                SplitState::Active(ref mut split) => {
                    split.count += 1;
                    // The contig-internal cursor jumps across the physical
                    // gap between the two fragments.
                    split.cursor += row.start - split.last_end;
                    let start = split.cursor;
                    let end = start + row.length;
                    row.name = split.name.clone();
                    row.orientation = split.orientation;
                    row.order = OrderKey::split(split.component, split.count);
                    row.ctg_seq_start = start;
                    row.ctg_seq_end = end;
                    split.cursor = end;
                    split.last_end = row.end;
                }
                SplitState::Idle => {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("Unmatched sequence segment outside any split: {}", row),
                    ));
                }
            },
            _ => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!(
                        "Multiple AGP records share object start {}: {}",
                        object_start, row
                    ),
                ));
            }
        }
    }
    Ok(())
}

/// Reconcile every scaffold's segments against its AGP records, filling in
/// order numbers, resolved names, intra-contig coordinates and orientation.
pub fn assign_agp_order(rows: &mut [LayoutRow], agp: &[AgpRecord]) -> io::Result<()> {
    let mut agp_by_object: FxHashMap<&str, Vec<&AgpRecord>> = FxHashMap::default();
    for record in agp {
        agp_by_object
            .entry(record.object_name.as_str())
            .or_default()
            .push(record);
    }

    let empty = Vec::new();
    let mut idx = 0;
    while idx < rows.len() {
        let scaffold = rows[idx].name.clone();
        let mut seg_end = idx + 1;
        while seg_end < rows.len() && rows[seg_end].kind != RowKind::Scaffold {
            seg_end += 1;
        }

        let subset = agp_by_object.get(scaffold.as_str()).unwrap_or(&empty);
        let segments = &mut rows[idx + 1..seg_end];
        if segments.len() == subset.len() {
            reconcile_compatible(segments, subset)?;
        } else {
            debug!(
                "Scaffold {}: {} FASTA segments vs {} AGP records, reconciling splits",
                scaffold,
                segments.len(),
                subset.len()
            );
            reconcile_incompatible(segments, subset)?;
        }
        rows[idx].order = OrderKey::SCAFFOLD;
        idx = seg_end;
    }
    Ok(())
}
