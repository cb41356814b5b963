use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::domain::InputFormat;
use crate::error::ShError;

pub fn open_input(path: &Path) -> Result<BufReader<File>, ShError> {
    let file = File::open(path).map_err(|err| ShError::InputRead {
        path: path.to_path_buf(),
        message: err.to_string(),
    })?;
    Ok(BufReader::new(file))
}

/// `>Symbiotaphrina_buchneri|DQ248313|SH1641879.08FU|reps|...` gives `DQ248313`.
pub fn sequence_name_from_header(header: &str) -> Result<&str, ShError> {
    header
        .split('|')
        .nth(1)
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| ShError::MalformedFastaHeader(header.trim_end().to_string()))
}

pub fn read_identifiers<R: BufRead>(reader: R, format: InputFormat) -> Result<Vec<String>, ShError> {
    let mut identifiers = Vec::new();
    for line in reader.lines() {
        let line = line.map_err(|err| ShError::Filesystem(err.to_string()))?;
        match format {
            InputFormat::Fasta => {
                if line.starts_with('>') {
                    identifiers.push(sequence_name_from_header(&line)?.to_string());
                }
            }
            InputFormat::List => {
                let trimmed = line.trim();
                if !trimmed.is_empty() {
                    identifiers.push(trimmed.to_string());
                }
            }
        }
    }
    Ok(identifiers)
}

pub fn load_identifiers(path: &Path, format: InputFormat) -> Result<Vec<String>, ShError> {
    read_identifiers(open_input(path)?, format)
}
