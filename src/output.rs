use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use crate::app::{MatchSummary, TaxonomySummary};
use crate::cache::TaxonCache;
use crate::domain::{LineageRow, ResolvedSh};
use crate::error::ShError;

pub fn create_output(path: &Path, force: bool) -> Result<BufWriter<File>, ShError> {
    let mut options = OpenOptions::new();
    options.write(true);
    if force {
        options.create(true).truncate(true);
    } else {
        options.create_new(true);
    }
    let file = options.open(path).map_err(|err| match err.kind() {
        io::ErrorKind::AlreadyExists => ShError::OutputExists(path.to_path_buf()),
        _ => ShError::Filesystem(format!("create {}: {err}", path.display())),
    })?;
    Ok(BufWriter::new(file))
}

pub fn ensure_absent(path: &Path, force: bool) -> Result<(), ShError> {
    if !force && path.exists() {
        return Err(ShError::OutputExists(path.to_path_buf()));
    }
    Ok(())
}

pub fn write_match_row<W: Write>(
    out: &mut W,
    sequence_name: &str,
    resolved: &ResolvedSh,
) -> Result<(), ShError> {
    writeln!(
        out,
        "{sequence_name}\t{}\t{}",
        resolved.sh_name, resolved.taxon_id
    )
    .and_then(|_| out.flush())
    .map_err(|err| ShError::Filesystem(err.to_string()))
}

pub fn write_lineage_row<W: Write>(out: &mut W, row: &LineageRow) -> Result<(), ShError> {
    let mut line = format!("{}\t{}", row.sh, row.taxon_id);
    for name in row.rank_fields() {
        line.push('\t');
        line.push_str(name);
    }
    writeln!(out, "{line}")
        .and_then(|_| out.flush())
        .map_err(|err| ShError::Filesystem(err.to_string()))
}

/// Writes every cached taxon as `taxonId\trank\tname`, in first-seen order.
pub fn write_taxon_dump<W: Write>(out: &mut W, cache: &TaxonCache) -> Result<(), ShError> {
    for (taxon_id, entry) in cache.iter() {
        writeln!(out, "{taxon_id}\t{}\t{}", entry.rank, entry.name)
            .map_err(|err| ShError::Filesystem(err.to_string()))?;
    }
    out.flush()
        .map_err(|err| ShError::Filesystem(err.to_string()))
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_match(summary: &MatchSummary) -> io::Result<()> {
        Self::print_json(summary)
    }

    pub fn print_taxonomy(summary: &TaxonomySummary) -> io::Result<()> {
        Self::print_json(summary)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

impl crate::app::ProgressSink for JsonOutput {
    fn event(&self, _event: crate::app::ProgressEvent) {}
}
