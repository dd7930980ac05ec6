//! A minimal `ReferenceSource` that reads an optional FASTA file.
//!
//! This is a demo-grade implementation of the contract `cram-normalize`
//! expects (see `cram_normalize::reference::ReferenceSource`): real deployments
//! would index the FASTA and fetch ranges lazily, but for a single-pass CLI
//! driver loading each named sequence whole is simplest.

use cram_core::error::Result;
use cram_format::sam_header::SamHeader;
use cram_normalize::reference::ReferenceSource;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Reference sequences keyed by sequence id, loaded once at startup.
pub struct FastaReferenceSource {
    sequences: HashMap<i32, Vec<u8>>,
}

impl FastaReferenceSource {
    /// Load `path` as FASTA and match its records to `sam_header`'s `@SQ`
    /// order by name. With no path, every sequence id resolves to an empty
    /// placeholder and reference-delta reads fall back to `N`.
    pub fn load(path: Option<&Path>, sam_header: &SamHeader) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self {
                sequences: HashMap::new(),
            });
        };

        let text = fs::read_to_string(path)?;
        let by_name = parse_fasta(&text);

        let mut sequences = HashMap::new();
        for (id, name) in sam_header.sequence_names.iter().enumerate() {
            if let Some(bases) = by_name.get(name.as_str()) {
                sequences.insert(id as i32, bases.clone());
            }
        }
        Ok(Self { sequences })
    }
}

impl ReferenceSource for FastaReferenceSource {
    fn get_reference_bases(&self, sequence_id: i32, upper_case: bool) -> Vec<u8> {
        let mut bases = self
            .sequences
            .get(&sequence_id)
            .cloned()
            .unwrap_or_default();
        if upper_case {
            bases.make_ascii_uppercase();
        }
        bases
    }
}

fn parse_fasta(text: &str) -> HashMap<&str, Vec<u8>> {
    let mut records = HashMap::new();
    let mut current_name: Option<&str> = None;
    let mut current_seq = Vec::new();

    for line in text.lines() {
        if let Some(header) = line.strip_prefix('>') {
            if let Some(name) = current_name.take() {
                records.insert(name, std::mem::take(&mut current_seq));
            }
            current_name = header.split_whitespace().next();
        } else {
            current_seq.extend_from_slice(line.trim_end().as_bytes());
        }
    }
    if let Some(name) = current_name {
        records.insert(name, current_seq);
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_multi_record_fasta() {
        let text = ">chr1 some comment\nACGT\nACGT\n>chr2\nTTTT\n";
        let records = parse_fasta(text);
        assert_eq!(records.get("chr1").unwrap(), b"ACGTACGT");
        assert_eq!(records.get("chr2").unwrap(), b"TTTT");
    }

    #[test]
    fn missing_path_yields_empty_placeholder() {
        let header = SamHeader {
            text: String::new(),
            sequence_names: vec!["chr1".to_string()],
        };
        let source = FastaReferenceSource::load(None, &header).unwrap();
        assert!(source.get_reference_bases(0, true).is_empty());
    }
}
