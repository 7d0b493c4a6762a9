//! Scaffolding-support aggregation per contig.
//!
//! Walks the AGP placement records and totals, per original contig, how many
//! bases ended up inside genuine scaffolds (supported) versus outside
//! (unsupported), together with the raw fragmentation count and the
//! contig <-> scaffold adjacency consumed by the downstream classifier.

use crate::agp::{AgpRecord, ComponentType};
use crate::contig_id::ContigId;
use log::info;
use rustc_hash::FxHashMap;
use std::fmt;
use std::io;

/// Objects carrying this tag are genuine hybrid scaffolds; anything else in
/// the AGP is an unscaffolded leftover contig.
pub const SCAFFOLD_NAME_TAG: &str = "Super-Scaffold";

pub fn is_scaffold_object(object_name: &str) -> bool {
    object_name.contains(SCAFFOLD_NAME_TAG)
}

/// Per-contig support totals and break counts. The four cause columns are
/// zero until the break classifier fills them in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContigSupport {
    pub contig_name: String,
    pub supported: i64,
    pub unsupported: i64,
    pub breaks: i64,
    pub local_breaks: i64,
    pub global_breaks: i64,
    pub chimeric_breaks: i64,
    pub support_breaks: i64,
}

impl ContigSupport {
    fn new(contig_name: &str) -> ContigSupport {
        ContigSupport {
            contig_name: contig_name.to_string(),
            supported: 0,
            unsupported: 0,
            breaks: 0,
            local_breaks: 0,
            global_breaks: 0,
            chimeric_breaks: 0,
            support_breaks: 0,
        }
    }

    pub fn classified_breaks(&self) -> i64 {
        self.local_breaks + self.global_breaks + self.chimeric_breaks + self.support_breaks
    }
}

impl fmt::Display for ContigSupport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            self.contig_name,
            self.supported,
            self.unsupported,
            self.breaks,
            self.local_breaks,
            self.global_breaks,
            self.chimeric_breaks,
            self.support_breaks
        )
    }
}

/// Support totals plus the contig <-> scaffold adjacency, both in AGP
/// insertion order. The adjacency lists are multisets: a contig broken into
/// several fragments of one scaffold lists that scaffold once per fragment.
#[derive(Debug, Default)]
pub struct SupportTable {
    pub contigs: Vec<ContigSupport>,
    pub contig_to_scaffold: FxHashMap<String, Vec<String>>,
    pub scaffold_to_contig: FxHashMap<String, Vec<String>>,
}

impl SupportTable {
    pub fn get(&self, contig_name: &str) -> Option<&ContigSupport> {
        self.contigs.iter().find(|c| c.contig_name == contig_name)
    }
}

/// Aggregate scaffolding support from AGP placement records.
pub fn compute_contig_support(agp: &[AgpRecord]) -> io::Result<SupportTable> {
    let mut table = SupportTable::default();
    let mut index: FxHashMap<String, usize> = FxHashMap::default();
    let mut occurrences: FxHashMap<String, i64> = FxHashMap::default();
    let mut unsupported_broken: FxHashMap<String, i64> = FxHashMap::default();

    for record in agp {
        if record.comp_type == ComponentType::Gap {
            continue;
        }
        let raw_name = record.comp_name_or_gap_length.as_str();
        let contig_id = ContigId::parse(raw_name);
        let length = record.component_length()?;

        let row_idx = *index.entry(contig_id.base.clone()).or_insert_with(|| {
            table.contigs.push(ContigSupport::new(&contig_id.base));
            table.contigs.len() - 1
        });
        *occurrences.entry(contig_id.base.clone()).or_insert(0) += 1;

        if is_scaffold_object(&record.object_name) {
            table.contigs[row_idx].supported += length;
            table
                .contig_to_scaffold
                .entry(contig_id.base.clone())
                .or_default()
                .push(record.object_name.clone());
            table
                .scaffold_to_contig
                .entry(record.object_name.clone())
                .or_default()
                .push(contig_id.base.clone());
        } else {
            // Unscaffolded leftover. Fragments of one contig can appear
            // here several times; tally them to dedup the break count.
            if contig_id.is_split() {
                *unsupported_broken.entry(contig_id.base.clone()).or_insert(0) += 1;
            }
            table.contigs[row_idx].unsupported += length;
        }
    }

    for contig in table.contigs.iter_mut() {
        contig.breaks = occurrences[&contig.contig_name] - 1;
    }

    // An unsupported contig's multiple fragment listings are an artifact of
    // the unscaffolded representation, not a real break.
    for contig in table.contigs.iter_mut() {
        if contig.supported == 0 {
            contig.breaks = 0;
        }
    }

    // Several unsupported fragments of one contig would otherwise be
    // counted as several breaks; fold them into one, unless that would
    // push the count below zero.
    for (contig_name, broken_count) in unsupported_broken.iter() {
        if *broken_count < 2 {
            continue;
        }
        let unsupported_breaks = broken_count - 1;
        if let Some(&row_idx) = index.get(contig_name) {
            let contig = &mut table.contigs[row_idx];
            if contig.breaks > 0 && contig.breaks - unsupported_breaks >= 0 {
                contig.breaks -= unsupported_breaks;
            }
        }
    }

    info!(
        "Aggregated scaffolding support for {} contigs across {} scaffolds",
        table.contigs.len(),
        table.scaffold_to_contig.len()
    );
    Ok(table)
}
