//! Row types of the annotated scaffold layout table.
//!
//! The layout is a flat table: one scaffold-level row spanning the whole
//! sequence, followed by the scaffold's sequence/gap segments in document
//! order. Downstream stages only fill in columns (order, name, coordinates,
//! orientation, chromosome), they never move rows.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Bases tracked by the composition columns, in output column order.
pub const BASE_KEYS: [u8; 10] = [b'A', b'C', b'G', b'T', b'a', b'c', b'g', b't', b'N', b'n'];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RowKind {
    Scaffold,
    Sequence,
    Gap,
}

impl RowKind {
    /// Label used in the `component` column of the layout table.
    pub fn label(&self) -> &'static str {
        match self {
            RowKind::Scaffold => "self",
            RowKind::Sequence => "sequence",
            RowKind::Gap => "gap",
        }
    }
}

/// Per-base counts over {A,C,G,T,a,c,g,t,N,n}; other characters are ignored.
/// Case is preserved, matching the raw FASTA text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseComposition {
    counts: [u64; 10],
}

impl BaseComposition {
    pub fn from_seq(sequence: &str) -> Self {
        let mut counts = [0u64; 10];
        for byte in sequence.bytes() {
            if let Some(idx) = BASE_KEYS.iter().position(|&b| b == byte) {
                counts[idx] += 1;
            }
        }
        BaseComposition { counts }
    }

    pub fn count(&self, base: u8) -> u64 {
        BASE_KEYS
            .iter()
            .position(|&b| b == base)
            .map(|idx| self.counts[idx])
            .unwrap_or(0)
    }

    pub fn counts(&self) -> &[u64; 10] {
        &self.counts
    }
}

/// Two-level ordering key derived from the AGP component number.
///
/// `major` is the AGP component index, `minor` the sub-split counter for
/// sequence fragments that share one AGP component. Scaffold rows sort as
/// `0.0`; assembler-inserted gaps absent from the AGP get the `-1.0`
/// sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OrderKey {
    pub major: i64,
    pub minor: u32,
}

impl OrderKey {
    pub const SCAFFOLD: OrderKey = OrderKey { major: 0, minor: 0 };
    pub const UNPLACED: OrderKey = OrderKey { major: -1, minor: 0 };

    /// Order of a segment matching AGP component `number` one-to-one.
    pub fn component(number: u32) -> OrderKey {
        OrderKey {
            major: number as i64,
            minor: 0,
        }
    }

    /// Order of the `count`-th fragment of a split AGP component.
    pub fn split(number: u32, count: u32) -> OrderKey {
        OrderKey {
            major: number as i64,
            minor: count,
        }
    }

    pub fn is_unplaced(&self) -> bool {
        self.major < 0
    }
}

impl fmt::Display for OrderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// One row of the scaffold layout table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutRow {
    /// Owning scaffold; equals `name` for scaffold-level rows.
    pub scaffold: String,
    pub kind: RowKind,
    /// Resolved contig name, `gap`, or the scaffold name for scaffold rows.
    pub name: String,
    /// Intra-scaffold document order assigned by the segmenter, 1-based.
    pub seg_index: u32,
    pub order: OrderKey,
    pub start: i64,
    pub end: i64,
    pub length: i64,
    /// Restriction motifs embedded in a gap; -1 for non-gap rows.
    pub cut_sites: i64,
    pub composition: Option<BaseComposition>,
    /// {+1, 0, -1} for {forward, none/gap, reverse}.
    pub orientation: i8,
    pub chrom: String,
    pub confidence: f64,
    pub ctg_seq_start: i64,
    pub ctg_seq_end: i64,
}

impl LayoutRow {
    pub fn scaffold_row(name: &str, length: i64, composition: BaseComposition) -> LayoutRow {
        LayoutRow {
            scaffold: name.to_string(),
            kind: RowKind::Scaffold,
            name: name.to_string(),
            seg_index: 0,
            order: OrderKey::SCAFFOLD,
            start: 0,
            end: length,
            length,
            cut_sites: -1,
            composition: Some(composition),
            orientation: 0,
            chrom: String::new(),
            confidence: 0.0,
            ctg_seq_start: -1,
            ctg_seq_end: -1,
        }
    }

    pub fn sequence_row(
        scaffold: &str,
        seg_index: u32,
        start: i64,
        end: i64,
        composition: BaseComposition,
    ) -> LayoutRow {
        LayoutRow {
            scaffold: scaffold.to_string(),
            kind: RowKind::Sequence,
            name: "sequence".to_string(),
            seg_index,
            order: OrderKey::UNPLACED,
            start,
            end,
            length: end - start,
            cut_sites: -1,
            composition: Some(composition),
            orientation: 0,
            chrom: String::new(),
            confidence: 0.0,
            ctg_seq_start: -1,
            ctg_seq_end: -1,
        }
    }

    pub fn gap_row(scaffold: &str, seg_index: u32, length: i64, cut_sites: i64) -> LayoutRow {
        LayoutRow {
            scaffold: scaffold.to_string(),
            kind: RowKind::Gap,
            name: "gap".to_string(),
            seg_index,
            order: OrderKey::UNPLACED,
            // Gap coordinates are back-filled from the flanking sequence
            // segments once the scaffold is fully segmented.
            start: -1,
            end: -1,
            length,
            cut_sites,
            composition: None,
            orientation: 0,
            chrom: String::new(),
            confidence: 0.0,
            ctg_seq_start: -1,
            ctg_seq_end: -1,
        }
    }
}

impl fmt::Display for LayoutRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}",
            self.scaffold,
            self.kind.label(),
            self.name,
            self.order,
            self.start,
            self.end,
            self.length
        )
    }
}
