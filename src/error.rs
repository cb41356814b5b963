use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum ShError {
    #[error("invalid SH name: {0}")]
    InvalidShName(String),

    #[error("invalid SH version: {0}")]
    InvalidVersion(String),

    #[error("invalid SH identity threshold: {0}")]
    InvalidThreshold(String),

    #[error(
        "malformed fasta header (sequence name expected after the first '|'): {0}"
    )]
    MalformedFastaHeader(String),

    #[error("failed to read input file {path}: {message}")]
    InputRead { path: PathBuf, message: String },

    #[error("output file {0} already exists, remove it or use --force")]
    OutputExists(PathBuf),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),

    #[error("PlutoF request failed: {0}")]
    PlutofHttp(String),

    #[error("PlutoF returned status {status}: {message}")]
    PlutofStatus { status: u16, message: String },

    #[error("unexpected PlutoF response: {0}")]
    PlutofResponse(String),

    #[error(
        "taxon {taxon_id} has ambiguous name and/or rank: cached '{cached_name}' ({cached_rank}), seen '{name}' ({rank})"
    )]
    InconsistentTaxon {
        taxon_id: String,
        cached_name: String,
        cached_rank: String,
        name: String,
        rank: String,
    },
}

impl ShError {
    pub fn exit_code(&self) -> u8 {
        match self {
            ShError::InputRead { .. }
            | ShError::OutputExists(_)
            | ShError::MalformedFastaHeader(_)
            | ShError::ConfigRead(_)
            | ShError::ConfigParse(_) => 2,
            ShError::PlutofHttp(_) | ShError::PlutofStatus { .. } | ShError::PlutofResponse(_) => 3,
            ShError::InconsistentTaxon { .. } => 4,
            _ => 1,
        }
    }
}
