//! Scaffold sequence segmentation.
//!
//! Splits one scaffold sequence into alternating genomic/gap runs. A run of
//! N extends the open gap; a lone 6-base restriction motif inside a gap
//! extends it too and bumps the gap's cut-site counter (the motif is only
//! planted into bridges by the optical-mapping scaffolder). A genomic run
//! flushes the open gap and emits a sequence segment with its base
//! composition.

use crate::layout::{BaseComposition, LayoutRow, RowKind};
use regex::Regex;
use std::sync::OnceLock;

/// Restriction motif embedded in optical-mapping bridge gaps.
pub const CUT_SITE_MOTIF: &str = "CTTAAG";

fn base_runs() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[ACGT]+|N+").unwrap())
}

/// Segment one scaffold sequence into sequence/gap rows in document order.
///
/// Order indices start at 1 and count emitted segments. A trailing N run is
/// dropped: a gap is only flushed when the next genomic run arrives.
pub fn characterize_scaffold(sequence: &str, scaffold: &str) -> Vec<LayoutRow> {
    let upper = sequence.to_ascii_uppercase();

    let mut rows = Vec::new();
    let mut order: u32 = 0;
    let mut gap_size: i64 = 0;
    let mut cuts_per_gap: i64 = 0;

    for mat in base_runs().find_iter(&upper) {
        let (start, end) = (mat.start(), mat.end());
        let length = (end - start) as i64;
        let run = &upper[start..end];

        if length == 6 && run == CUT_SITE_MOTIF {
            // Restriction site, only found inside bridge gaps.
            gap_size += length;
            cuts_per_gap += 1;
        } else if run.as_bytes()[0] == b'N' {
            gap_size += length;
        } else {
            if gap_size > 0 {
                order += 1;
                rows.push(LayoutRow::gap_row(scaffold, order, gap_size, cuts_per_gap));
                gap_size = 0;
                cuts_per_gap = 0;
            }
            order += 1;
            rows.push(LayoutRow::sequence_row(
                scaffold,
                order,
                start as i64,
                end as i64,
                BaseComposition::from_seq(&sequence[start..end]),
            ));
        }
    }

    rows
}

/// Back-fill gap coordinates from the flanking rows.
///
/// A gap has no bases of its own to anchor coordinates, so it takes the end
/// of the preceding row and the start of the following one. The segmenter
/// never emits a gap as the first or last row of the table: every gap is
/// flushed by a genomic run, and the first row is always a scaffold row.
pub fn fill_gap_coordinates(rows: &mut [LayoutRow]) {
    for idx in 0..rows.len() {
        if rows[idx].kind == RowKind::Gap {
            rows[idx].start = rows[idx - 1].end;
            rows[idx].end = rows[idx + 1].start;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seq_of(len: usize) -> String {
        "ACGT".chars().cycle().take(len).collect()
    }

    #[test]
    fn test_two_segments_one_plain_gap() {
        let sequence = format!("{}{}{}", seq_of(1000), "N".repeat(50), seq_of(2000));
        let rows = characterize_scaffold(&sequence, "scaffold_1");

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].kind, RowKind::Sequence);
        assert_eq!((rows[0].start, rows[0].end), (0, 1000));
        assert_eq!(rows[1].kind, RowKind::Gap);
        assert_eq!(rows[1].length, 50);
        assert_eq!(rows[1].cut_sites, 0);
        assert_eq!(rows[2].kind, RowKind::Sequence);
        assert_eq!((rows[2].start, rows[2].end), (1050, 3050));
        assert_eq!(
            rows.iter().map(|r| r.seg_index).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
    }

    #[test]
    fn test_cut_site_extends_gap() {
        // 19N + CTTAAG + 19N reads as a single 44-base gap with one cut site
        let sequence = format!(
            "{}{}CTTAAG{}{}",
            seq_of(100),
            "N".repeat(19),
            "N".repeat(19),
            seq_of(100)
        );
        let rows = characterize_scaffold(&sequence, "scaffold_1");

        assert_eq!(rows.len(), 3);
        let gap = &rows[1];
        assert_eq!(gap.kind, RowKind::Gap);
        assert_eq!(gap.length, 44);
        assert_eq!(gap.cut_sites, 1);
    }

    #[test]
    fn test_segment_lengths_reconstruct_scaffold() {
        let sequence = format!(
            "{}{}CTTAAG{}{}{}{}",
            seq_of(123),
            "N".repeat(7),
            "N".repeat(3),
            seq_of(456),
            "N".repeat(11),
            seq_of(78)
        );
        let rows = characterize_scaffold(&sequence, "s");
        let total: i64 = rows.iter().map(|r| r.length).sum();
        assert_eq!(total as usize, sequence.len());
    }

    #[test]
    fn test_trailing_gap_is_dropped() {
        let sequence = format!("{}{}", seq_of(100), "N".repeat(30));
        let rows = characterize_scaffold(&sequence, "s");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].kind, RowKind::Sequence);
    }

    #[test]
    fn test_lowercase_runs_and_composition() {
        let sequence = format!("acgt{}ACGT", "n".repeat(10));
        let rows = characterize_scaffold(&sequence, "s");
        assert_eq!(rows.len(), 3);
        let first = rows[0].composition.unwrap();
        assert_eq!(first.count(b'a'), 1);
        assert_eq!(first.count(b'A'), 0);
        let last = rows[2].composition.unwrap();
        assert_eq!(last.count(b'A'), 1);
        assert_eq!(rows[1].length, 10);
    }

    #[test]
    fn test_gap_coordinate_backfill() {
        let sequence = format!("{}{}{}", seq_of(40), "N".repeat(10), seq_of(60));
        let mut rows = vec![crate::layout::LayoutRow::scaffold_row(
            "s",
            sequence.len() as i64,
            BaseComposition::from_seq(&sequence),
        )];
        rows.extend(characterize_scaffold(&sequence, "s"));
        fill_gap_coordinates(&mut rows);

        let gap = &rows[2];
        assert_eq!(gap.kind, RowKind::Gap);
        assert_eq!((gap.start, gap.end), (40, 50));
    }
}
