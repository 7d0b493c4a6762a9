//! Scaffold-to-chromosome assignment from alignment evidence.
//!
//! Each scaffold pools the reference alignments of all its member contigs
//! and is assigned the chromosome with the largest mapq-weighted aligned
//! length. The confidence is that chromosome's share of the total weighted
//! evidence, rounded to 3 decimals.

use crate::bed::AlignmentIndex;
use log::info;
use rustc_hash::FxHashMap;

/// Bookkeeping label for contigs without any recorded alignment.
pub const UNALIGNED_CHROM: &str = "unaln";
/// Sentinel assignment for scaffolds without eligible evidence.
pub const NO_EVIDENCE_CHROM: &str = "random";
/// Unplaced-chromosome bucket, excluded from the evidence.
pub const UNPLACED_CHROM: &str = "chrUn";
/// X and Y are pooled into one pseudo-chromosome.
pub const MERGED_SEX_CHROM: &str = "chrXY";

/// scaffold -> (best chromosome, confidence in [0, 1])
pub type ChromAssignment = FxHashMap<String, (String, f64)>;

/// Pool alignment evidence per scaffold and pick the best chromosome.
///
/// `chrUn` and zero-mapq alignments are discarded, chrX/chrY merge into
/// `chrXY`, and each chromosome's aligned length is weighted by mapping
/// quality. Scaffolds without any eligible evidence get the sentinel label
/// with confidence 0.
pub fn assign_scaffold_chromosomes(
    contig_to_scaffold: &FxHashMap<String, Vec<String>>,
    alignments: &AlignmentIndex,
) -> ChromAssignment {
    // scaffold -> (chrom, mapq) -> pooled aligned length
    let mut evidence: FxHashMap<String, FxHashMap<(String, u32), i64>> = FxHashMap::default();

    for (contig, scaffolds) in contig_to_scaffold.iter() {
        for scaffold in scaffolds {
            let pooled = evidence.entry(scaffold.clone()).or_default();
            match alignments.by_contig.get(contig) {
                Some(contig_evidence) => {
                    for (key, length) in contig_evidence.iter() {
                        *pooled.entry(key.clone()).or_insert(0) += length;
                    }
                }
                None => {
                    // Keep the scaffold in the table even without evidence.
                    pooled.entry((UNALIGNED_CHROM.to_string(), 0)).or_insert(0);
                }
            }
        }
    }

    let mut assignment = ChromAssignment::default();
    for (scaffold, pooled) in evidence.into_iter() {
        let mut weighted: FxHashMap<String, i64> = FxHashMap::default();
        for ((chrom, mapq), length) in pooled.into_iter() {
            if chrom == UNPLACED_CHROM || mapq == 0 {
                continue;
            }
            let label = if chrom == "chrX" || chrom == "chrY" {
                MERGED_SEX_CHROM.to_string()
            } else {
                chrom
            };
            *weighted.entry(label).or_insert(0) += length * mapq as i64;
        }

        let total: i64 = weighted.values().sum();
        let mut candidates: Vec<(String, i64)> = weighted.into_iter().collect();
        candidates.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        let entry = match candidates.into_iter().next() {
            Some((best_chrom, best_weight)) => {
                let confidence = (best_weight as f64 / total as f64 * 1000.0).round() / 1000.0;
                (best_chrom, confidence)
            }
            None => (NO_EVIDENCE_CHROM.to_string(), 0.0),
        };
        assignment.insert(scaffold, entry);
    }

    info!("Assigned chromosomes to {} scaffolds", assignment.len());
    assignment
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bed::{parse_bed, AlignmentIndex};

    fn adjacency(entries: &[(&str, &[&str])]) -> FxHashMap<String, Vec<String>> {
        entries
            .iter()
            .map(|(contig, scaffolds)| {
                (
                    contig.to_string(),
                    scaffolds.iter().map(|s| s.to_string()).collect(),
                )
            })
            .collect()
    }

    fn index_of(data: &str) -> AlignmentIndex {
        AlignmentIndex::from_records(parse_bed(data.as_bytes()).unwrap())
    }

    #[test]
    fn test_weighted_best_chromosome() {
        let alignments = index_of(
            "chr1\t0\t1000\tcontig_1\t60\t+\n\
             chr2\t0\t100\tcontig_1\t60\t+\n",
        );
        let contig_to_scaffold = adjacency(&[("contig_1", &["Super-Scaffold_1"])]);

        let assignment = assign_scaffold_chromosomes(&contig_to_scaffold, &alignments);
        let (chrom, confidence) = &assignment["Super-Scaffold_1"];
        assert_eq!(chrom, "chr1");
        // 60000 / 66000, rounded to 3 decimals
        assert_eq!(*confidence, 0.909);
    }

    #[test]
    fn test_unplaced_and_zero_mapq_excluded() {
        let alignments = index_of(
            "chrUn\t0\t100000\tcontig_1\t60\t+\n\
             chr3\t0\t500\tcontig_1\t0\t+\n\
             chr4\t0\t100\tcontig_1\t30\t+\n",
        );
        let contig_to_scaffold = adjacency(&[("contig_1", &["Super-Scaffold_1"])]);

        let assignment = assign_scaffold_chromosomes(&contig_to_scaffold, &alignments);
        let (chrom, confidence) = &assignment["Super-Scaffold_1"];
        assert_eq!(chrom, "chr4");
        assert_eq!(*confidence, 1.0);
    }

    #[test]
    fn test_sex_chromosomes_merged() {
        let alignments = index_of(
            "chrX\t0\t400\tcontig_1\t60\t+\n\
             chrY\t0\t400\tcontig_1\t60\t+\n\
             chr5\t0\t500\tcontig_1\t60\t+\n",
        );
        let contig_to_scaffold = adjacency(&[("contig_1", &["Super-Scaffold_1"])]);

        let assignment = assign_scaffold_chromosomes(&contig_to_scaffold, &alignments);
        let (chrom, _) = &assignment["Super-Scaffold_1"];
        assert_eq!(chrom, "chrXY");
    }

    #[test]
    fn test_no_evidence_sentinel() {
        // Only an unplaced-chromosome alignment: no eligible evidence.
        let alignments = index_of("chrUn\t0\t1000\tcontig_1\t60\t+\n");
        let contig_to_scaffold = adjacency(&[
            ("contig_1", &["Super-Scaffold_1"]),
            ("contig_2", &["Super-Scaffold_2"]),
        ]);

        let assignment = assign_scaffold_chromosomes(&contig_to_scaffold, &alignments);
        assert_eq!(
            assignment["Super-Scaffold_1"],
            (NO_EVIDENCE_CHROM.to_string(), 0.0)
        );
        // contig_2 has no alignments at all but its scaffold still appears
        assert_eq!(
            assignment["Super-Scaffold_2"],
            (NO_EVIDENCE_CHROM.to_string(), 0.0)
        );
    }

    #[test]
    fn test_evidence_pooled_across_member_contigs() {
        let alignments = index_of(
            "chr1\t0\t100\tcontig_1\t60\t+\n\
             chr2\t0\t20000\tcontig_2\t60\t+\n",
        );
        let contig_to_scaffold = adjacency(&[
            ("contig_1", &["Super-Scaffold_1"]),
            ("contig_2", &["Super-Scaffold_1"]),
        ]);

        let assignment = assign_scaffold_chromosomes(&contig_to_scaffold, &alignments);
        let (chrom, confidence) = &assignment["Super-Scaffold_1"];
        assert_eq!(chrom, "chr2");
        assert!(*confidence > 0.99 && *confidence <= 1.0);
    }
}
