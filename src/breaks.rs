//! Contig break classification.
//!
//! Partitions each contig's raw fragmentation count into four disjoint
//! causes: support (evidence ran out), local (same scaffold), global (same
//! chromosome, different scaffolds) and chimeric (different chromosomes).
//! The four causes must sum exactly to the raw count for every contig; a
//! mismatch means the inputs contradict each other and aborts the run.

use crate::chrom::ChromAssignment;
use crate::support::SupportTable;
use log::info;
use rustc_hash::{FxHashMap, FxHashSet};
use std::io;

/// Score every unordered pair of (scaffold, chromosome) placements once,
/// spending the remaining break budget. Same-scaffold pairs are skipped
/// (already counted as local); equal chromosomes score global, differing
/// ones chimeric. The scan stops once the budget is exhausted so a contig
/// scattered across many chromosomes is not over-counted.
///
/// Returns (global, chimeric, remaining budget).
fn score_scaffold_pairs(placements: &[(String, String)], mut remaining: i64) -> (i64, i64, i64) {
    let mut global = 0;
    let mut chimeric = 0;
    let mut scored: FxHashSet<(String, String)> = FxHashSet::default();

    for i in 0..placements.len() {
        for j in (i + 1)..placements.len() {
            if remaining == 0 {
                return (global, chimeric, remaining);
            }
            let (a_scf, a_chr) = &placements[i];
            let (b_scf, b_chr) = &placements[j];

            let key = if a_scf <= b_scf {
                (a_scf.clone(), b_scf.clone())
            } else {
                (b_scf.clone(), a_scf.clone())
            };
            if !scored.insert(key) {
                continue;
            }
            if a_scf == b_scf {
                // Local breaks are counted from the occurrence multiset.
                continue;
            }

            if a_chr == b_chr {
                global += 1;
            } else {
                chimeric += 1;
            }
            remaining -= 1;
        }
    }

    (global, chimeric, remaining)
}

/// Classify all contig breaks in place and sort the table for presentation.
pub fn classify_contig_breaks(
    table: &mut SupportTable,
    scaffold_to_chrom: &ChromAssignment,
) -> io::Result<()> {
    for contig in table.contigs.iter_mut() {
        // Easy case first: part of the contig has no scaffolding support.
        // A single supported/unsupported transition is attributed once,
        // regardless of the fragment count.
        if contig.supported > 0 && contig.unsupported > 0 {
            contig.support_breaks = 1;
        }

        if contig.breaks == 0 || contig.breaks == contig.support_breaks {
            continue;
        }

        let scaffolds = table
            .contig_to_scaffold
            .get(&contig.contig_name)
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!(
                        "Contig '{}' has {} breaks but no scaffold placement",
                        contig.contig_name, contig.breaks
                    ),
                )
            })?;

        if scaffolds.len() == 1 {
            // Within-scaffold misassembly: breaks scaffold contiguity but
            // not chromosome assignment.
            contig.local_breaks = contig.breaks - contig.support_breaks;
            continue;
        }

        let mut scaffold_counts: FxHashMap<&String, i64> = FxHashMap::default();
        for scaffold in scaffolds {
            *scaffold_counts.entry(scaffold).or_insert(0) += 1;
        }
        for count in scaffold_counts.values() {
            if *count >= 2 {
                contig.local_breaks += count - 1;
            }
        }

        if scaffold_counts.len() > 1 {
            let placements = scaffolds
                .iter()
                .map(|scaffold| {
                    let (chrom, _) = scaffold_to_chrom.get(scaffold).ok_or_else(|| {
                        io::Error::new(
                            io::ErrorKind::InvalidData,
                            format!(
                                "No chromosome assignment for scaffold '{}' (contig '{}')",
                                scaffold, contig.contig_name
                            ),
                        )
                    })?;
                    Ok((scaffold.clone(), chrom.clone()))
                })
                .collect::<io::Result<Vec<_>>>()?;

            let budget = contig.breaks - contig.support_breaks - contig.local_breaks;
            let (global, chimeric, _remaining) = score_scaffold_pairs(&placements, budget);
            contig.global_breaks += global;
            contig.chimeric_breaks += chimeric;
        }
    }

    // Every observed break must be accounted for by exactly one cause.
    let mismatched: Vec<String> = table
        .contigs
        .iter()
        .filter(|contig| contig.classified_breaks() != contig.breaks)
        .map(|contig| contig.to_string())
        .collect();
    if !mismatched.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("Unaccounted contig breaks:\n{}", mismatched.join("\n")),
        ));
    }

    table.contigs.sort_by(|a, b| {
        (b.supported, b.unsupported).cmp(&(a.supported, a.unsupported))
    });

    info!("Classified breaks for {} contigs", table.contigs.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::support::ContigSupport;

    fn contig(name: &str, supported: i64, unsupported: i64, breaks: i64) -> ContigSupport {
        ContigSupport {
            contig_name: name.to_string(),
            supported,
            unsupported,
            breaks,
            local_breaks: 0,
            global_breaks: 0,
            chimeric_breaks: 0,
            support_breaks: 0,
        }
    }

    fn table_with(
        contigs: Vec<ContigSupport>,
        adjacency: &[(&str, &[&str])],
    ) -> SupportTable {
        let mut table = SupportTable {
            contigs,
            ..Default::default()
        };
        for (name, scaffolds) in adjacency {
            table.contig_to_scaffold.insert(
                name.to_string(),
                scaffolds.iter().map(|s| s.to_string()).collect(),
            );
        }
        table
    }

    fn assignment_of(entries: &[(&str, &str)]) -> ChromAssignment {
        entries
            .iter()
            .map(|(scaffold, chrom)| (scaffold.to_string(), (chrom.to_string(), 0.9)))
            .collect()
    }

    #[test]
    fn test_chimeric_break_across_chromosomes() {
        let mut table = table_with(
            vec![contig("contig_1", 1800, 0, 1)],
            &[("contig_1", &["Super-Scaffold_1", "Super-Scaffold_2"])],
        );
        let assignment =
            assignment_of(&[("Super-Scaffold_1", "chr1"), ("Super-Scaffold_2", "chr2")]);

        classify_contig_breaks(&mut table, &assignment).unwrap();
        let row = table.get("contig_1").unwrap();
        assert_eq!(row.chimeric_breaks, 1);
        assert_eq!(row.global_breaks, 0);
        assert_eq!(row.local_breaks, 0);
        assert_eq!(row.support_breaks, 0);
    }

    #[test]
    fn test_global_break_same_chromosome() {
        let mut table = table_with(
            vec![contig("contig_1", 1800, 0, 1)],
            &[("contig_1", &["Super-Scaffold_1", "Super-Scaffold_2"])],
        );
        let assignment =
            assignment_of(&[("Super-Scaffold_1", "chr7"), ("Super-Scaffold_2", "chr7")]);

        classify_contig_breaks(&mut table, &assignment).unwrap();
        let row = table.get("contig_1").unwrap();
        assert_eq!(row.global_breaks, 1);
        assert_eq!(row.chimeric_breaks, 0);
    }

    #[test]
    fn test_single_scaffold_breaks_are_local() {
        let mut table = table_with(
            vec![contig("contig_1", 900, 100, 2)],
            &[("contig_1", &["Super-Scaffold_1"])],
        );
        let assignment = assignment_of(&[("Super-Scaffold_1", "chr1")]);

        classify_contig_breaks(&mut table, &assignment).unwrap();
        let row = table.get("contig_1").unwrap();
        assert_eq!(row.support_breaks, 1);
        assert_eq!(row.local_breaks, 1);
        assert_eq!(row.classified_breaks(), row.breaks);
    }

    #[test]
    fn test_repeated_scaffold_membership_is_local() {
        // Two fragments in scaffold 1, one in scaffold 2 on another
        // chromosome: one local break plus one chimeric break.
        let mut table = table_with(
            vec![contig("contig_1", 3000, 0, 2)],
            &[(
                "contig_1",
                &["Super-Scaffold_1", "Super-Scaffold_1", "Super-Scaffold_2"],
            )],
        );
        let assignment =
            assignment_of(&[("Super-Scaffold_1", "chr1"), ("Super-Scaffold_2", "chr3")]);

        classify_contig_breaks(&mut table, &assignment).unwrap();
        let row = table.get("contig_1").unwrap();
        assert_eq!(row.local_breaks, 1);
        assert_eq!(row.chimeric_breaks, 1);
        assert_eq!(row.global_breaks, 0);
    }

    #[test]
    fn test_pair_scan_stops_at_budget() {
        // Scattered across three scaffolds on three chromosomes with only
        // two raw breaks: the third pair must not be scored.
        let mut table = table_with(
            vec![contig("contig_1", 3000, 0, 2)],
            &[(
                "contig_1",
                &["Super-Scaffold_1", "Super-Scaffold_2", "Super-Scaffold_3"],
            )],
        );
        let assignment = assignment_of(&[
            ("Super-Scaffold_1", "chr1"),
            ("Super-Scaffold_2", "chr2"),
            ("Super-Scaffold_3", "chr3"),
        ]);

        classify_contig_breaks(&mut table, &assignment).unwrap();
        let row = table.get("contig_1").unwrap();
        assert_eq!(row.chimeric_breaks, 2);
        assert_eq!(row.classified_breaks(), 2);
    }

    #[test]
    fn test_support_break_completes_classification() {
        let mut table = table_with(
            vec![contig("contig_1", 500, 300, 1)],
            &[("contig_1", &["Super-Scaffold_1"])],
        );
        let assignment = assignment_of(&[("Super-Scaffold_1", "chr1")]);

        classify_contig_breaks(&mut table, &assignment).unwrap();
        let row = table.get("contig_1").unwrap();
        assert_eq!(row.support_breaks, 1);
        assert_eq!(row.local_breaks, 0);
    }

    #[test]
    fn test_missing_assignment_is_fatal() {
        let mut table = table_with(
            vec![contig("contig_1", 1800, 0, 1)],
            &[("contig_1", &["Super-Scaffold_1", "Super-Scaffold_2"])],
        );
        let assignment = assignment_of(&[("Super-Scaffold_1", "chr1")]);

        let err = classify_contig_breaks(&mut table, &assignment).unwrap_err();
        assert!(err.to_string().contains("Super-Scaffold_2"));
    }

    #[test]
    fn test_unaccounted_breaks_are_fatal() {
        // Four raw breaks but only one scoreable pair and no support break:
        // the accounting invariant must trip.
        let mut table = table_with(
            vec![contig("contig_1", 1800, 0, 4)],
            &[("contig_1", &["Super-Scaffold_1", "Super-Scaffold_2"])],
        );
        let assignment =
            assignment_of(&[("Super-Scaffold_1", "chr1"), ("Super-Scaffold_2", "chr2")]);

        let err = classify_contig_breaks(&mut table, &assignment).unwrap_err();
        assert!(err.to_string().contains("Unaccounted contig breaks"));
    }

    #[test]
    fn test_final_sort_descending_by_support() {
        let mut table = table_with(
            vec![
                contig("small", 100, 0, 0),
                contig("large", 9000, 0, 0),
                contig("unplaced", 0, 5000, 0),
            ],
            &[],
        );
        let assignment = ChromAssignment::default();

        classify_contig_breaks(&mut table, &assignment).unwrap();
        let names: Vec<&str> = table
            .contigs
            .iter()
            .map(|c| c.contig_name.as_str())
            .collect();
        assert_eq!(names, vec!["large", "small", "unplaced"]);
    }
}
