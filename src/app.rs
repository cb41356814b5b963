use std::io::Write;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{info, warn};

use crate::cache::TaxonCache;
use crate::domain::{LineageRow, ShName, ShVersion, Threshold};
use crate::error::ShError;
use crate::lineage::LineageWalker;
use crate::output::{write_lineage_row, write_match_row};
use crate::plutof::TaxonomyService;
use crate::resolver::{ShMatch, resolve};

#[derive(Debug, Clone)]
pub struct MatchOptions {
    pub threshold: Threshold,
    pub version: ShVersion,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MatchSummary {
    pub processed: usize,
    pub resolved: usize,
    pub not_found: usize,
    pub ambiguous: usize,
    pub threshold: String,
    pub version: String,
    pub finished_at: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct TaxonomySummary {
    pub processed: usize,
    pub with_taxonomy: usize,
    pub missing_taxonomy: usize,
    pub invalid_names: usize,
    pub taxa_visited: usize,
    pub finished_at: String,
}

#[derive(Debug)]
pub struct TaxonomyRun {
    pub summary: TaxonomySummary,
    pub cache: TaxonCache,
}

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub message: String,
    pub elapsed: Option<Duration>,
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

pub struct App<S: TaxonomyService> {
    service: S,
}

impl<S: TaxonomyService> App<S> {
    pub fn new(service: S) -> Self {
        Self { service }
    }

    pub fn match_sequences<W: Write>(
        &self,
        names: &[String],
        options: &MatchOptions,
        out: &mut W,
        sink: &dyn ProgressSink,
    ) -> Result<MatchSummary, ShError> {
        info!(
            count = names.len(),
            threshold = %options.threshold,
            version = %options.version,
            "matching sequences to SHs"
        );
        let started = Instant::now();
        let mut summary = MatchSummary {
            threshold: options.threshold.to_string(),
            version: options.version.to_string(),
            ..MatchSummary::default()
        };

        for name in names {
            let candidates =
                self.service
                    .search_clusters(name, &options.threshold, &options.version)?;
            let outcome = resolve(name, &candidates, &options.version);
            match &outcome {
                ShMatch::Unique(_) => summary.resolved += 1,
                ShMatch::NotFound => summary.not_found += 1,
                ShMatch::Ambiguous { .. } => summary.ambiguous += 1,
            }
            let resolved = outcome.into_resolved();
            write_match_row(out, name, &resolved)?;
            summary.processed += 1;
            sink.event(ProgressEvent {
                message: format!("{name} -> {}", display_or_dash(&resolved.sh_name)),
                elapsed: Some(started.elapsed()),
            });
        }

        summary.finished_at = chrono::Utc::now().to_rfc3339();
        Ok(summary)
    }

    pub fn sh_taxonomy<W: Write>(
        &self,
        lines: &[String],
        out: &mut W,
        sink: &dyn ProgressSink,
    ) -> Result<TaxonomyRun, ShError> {
        info!(count = lines.len(), "resolving SH taxonomy");
        let started = Instant::now();
        let mut cache = TaxonCache::new();
        let mut summary = TaxonomySummary::default();

        for line in lines {
            let row = match line.parse::<ShName>() {
                Ok(sh) => {
                    let row = LineageWalker::new(&self.service, &mut cache).build_lineage_row(&sh)?;
                    if row.taxon_id.is_empty() {
                        summary.missing_taxonomy += 1;
                    } else {
                        summary.with_taxonomy += 1;
                    }
                    row
                }
                Err(err) => {
                    warn!("{err}");
                    summary.invalid_names += 1;
                    LineageRow::new(line.as_str())
                }
            };
            write_lineage_row(out, &row)?;
            summary.processed += 1;
            sink.event(ProgressEvent {
                message: format!("{} ({} ranks)", row.sh, row.populated()),
                elapsed: Some(started.elapsed()),
            });
        }

        summary.taxa_visited = cache.len();
        summary.finished_at = chrono::Utc::now().to_rfc3339();
        Ok(TaxonomyRun { summary, cache })
    }
}

fn display_or_dash(value: &str) -> &str {
    if value.is_empty() { "-" } else { value }
}
