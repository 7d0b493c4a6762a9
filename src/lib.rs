// lib.rs
pub mod agp;
pub mod bed;
pub mod breaks;
pub mod chrom;
pub mod contig_id;
pub mod fasta;
pub mod layout;
pub mod order;
pub mod output;
pub mod segment;
pub mod support;
