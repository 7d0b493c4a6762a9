//! Composite contig identifier parsing.
//!
//! The hybrid scaffolder names fragments of a broken contig
//! `<base>_subseq_<start>:<end>` with 1-based inclusive coordinates into the
//! original contig. Every component that hands a contig name across a module
//! boundary goes through this parser.

use regex::Regex;
use std::sync::OnceLock;

fn subseq_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(.+)_subseq_([0-9]+):([0-9]+)$").unwrap())
}

/// A contig identifier split into its base name and optional sub-range.
///
/// The sub-range is converted to 0-based half-open coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContigId {
    pub base: String,
    pub subrange: Option<(i64, i64)>,
}

impl ContigId {
    pub fn parse(raw: &str) -> ContigId {
        if let Some(caps) = subseq_re().captures(raw) {
            if let (Ok(start), Ok(end)) = (caps[2].parse::<i64>(), caps[3].parse::<i64>()) {
                return ContigId {
                    base: caps[1].to_string(),
                    subrange: Some((start - 1, end)),
                };
            }
        }
        ContigId {
            base: raw.to_string(),
            subrange: None,
        }
    }

    pub fn is_split(&self) -> bool {
        self.subrange.is_some()
    }
}
