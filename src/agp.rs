//! AGP (A Golden Path) layout parsing.
//!
//! Parses the 9-column tab-separated assembly layout emitted by the hybrid
//! scaffolding tool set. Only the simple two-valued component vocabulary is
//! accepted: `W` for placed sequence, `N` for gaps. The three overloaded
//! columns are validated against the shapes the scaffolder actually writes;
//! anything else aborts before any computation starts.

use regex::Regex;
use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Error as IoError};
use std::num::ParseIntError;
use std::sync::OnceLock;

#[derive(Debug)]
pub enum ParseErr {
    NotEnoughFields,
    IoError(IoError),
    InvalidField(ParseIntError),
    UnexpectedComponentType(String),
    UnexpectedLinkage(String),
    UnexpectedGapType(String),
}

impl fmt::Display for ParseErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseErr::NotEnoughFields => write!(f, "Not enough fields in AGP record"),
            ParseErr::IoError(e) => write!(f, "IO error: {}", e),
            ParseErr::InvalidField(e) => write!(f, "Invalid field: {}", e),
            ParseErr::UnexpectedComponentType(t) => {
                write!(f, "Unexpected component type '{}'", t)
            }
            ParseErr::UnexpectedLinkage(v) => write!(f, "Unexpected linkage field '{}'", v),
            ParseErr::UnexpectedGapType(v) => write!(f, "Unexpected gap type field '{}'", v),
        }
    }
}

impl std::error::Error for ParseErr {}

/// AGP component type; the scaffolder only ever writes these two.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentType {
    /// `W`: a placed contig (or contig fragment).
    Sequence,
    /// `N`: a gap of known length.
    Gap,
}

fn linkage_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([0-9]+|yes)$").unwrap())
}

fn gap_type_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([0-9]+|scaffold)$").unwrap())
}

/// One AGP line. The three `*_or_*` columns are overloaded by component
/// type and are kept verbatim; use the typed accessors to interpret them.
#[derive(Debug, Clone, PartialEq)]
pub struct AgpRecord {
    pub object_name: String,
    pub object_start: i64,
    pub object_end: i64,
    pub comp_number: u32,
    pub comp_type: ComponentType,
    pub comp_name_or_gap_length: String,
    pub comp_start_or_gap_type: String,
    pub comp_end_or_linkage: String,
    pub comp_orient_or_evidence: String,
}

impl AgpRecord {
    /// Placed length of a `W` component (its component-end coordinate; the
    /// scaffolder always places components from base 1).
    pub fn component_length(&self) -> io::Result<i64> {
        self.comp_end_or_linkage.parse::<i64>().map_err(|_| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Expected numeric component end in AGP record: {}", self),
            )
        })
    }

    /// Gap length of an `N` component.
    pub fn gap_length(&self) -> io::Result<i64> {
        self.comp_name_or_gap_length.parse::<i64>().map_err(|_| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Expected numeric gap length in AGP record: {}", self),
            )
        })
    }
}

impl fmt::Display for AgpRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let comp_type = match self.comp_type {
            ComponentType::Sequence => "W",
            ComponentType::Gap => "N",
        };
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            self.object_name,
            self.object_start,
            self.object_end,
            self.comp_number,
            comp_type,
            self.comp_name_or_gap_length,
            self.comp_start_or_gap_type,
            self.comp_end_or_linkage,
            self.comp_orient_or_evidence
        )
    }
}

fn parse_agp_line(line: &str) -> Result<AgpRecord, ParseErr> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() < 9 {
        return Err(ParseErr::NotEnoughFields);
    }

    let comp_type = match fields[4] {
        "W" => ComponentType::Sequence,
        "N" => ComponentType::Gap,
        other => return Err(ParseErr::UnexpectedComponentType(other.to_string())),
    };
    if !gap_type_re().is_match(fields[6]) {
        return Err(ParseErr::UnexpectedGapType(fields[6].to_string()));
    }
    if !linkage_re().is_match(fields[7]) {
        return Err(ParseErr::UnexpectedLinkage(fields[7].to_string()));
    }

    Ok(AgpRecord {
        object_name: fields[0].to_string(),
        object_start: fields[1].parse::<i64>().map_err(ParseErr::InvalidField)?,
        object_end: fields[2].parse::<i64>().map_err(ParseErr::InvalidField)?,
        comp_number: fields[3].parse::<u32>().map_err(ParseErr::InvalidField)?,
        comp_type,
        comp_name_or_gap_length: fields[5].to_string(),
        comp_start_or_gap_type: fields[6].to_string(),
        comp_end_or_linkage: fields[7].to_string(),
        comp_orient_or_evidence: fields[8].to_string(),
    })
}

/// Parse AGP records from a reader, skipping `#` comments and blank lines.
pub fn parse_agp<R: BufRead>(reader: R) -> Result<Vec<AgpRecord>, ParseErr> {
    let mut records = Vec::new();
    for line_result in reader.lines() {
        let line = line_result.map_err(ParseErr::IoError)?;
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        records.push(parse_agp_line(&line)?);
    }
    Ok(records)
}

pub fn parse_agp_file(agp_file: &str) -> io::Result<Vec<AgpRecord>> {
    let file = File::open(agp_file)
        .map_err(|e| io::Error::new(e.kind(), format!("Failed to open '{}': {}", agp_file, e)))?;
    let reader = BufReader::new(file);
    parse_agp(reader).map_err(|e| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("Failed to parse AGP from {}: {}", agp_file, e),
        )
    })
}
