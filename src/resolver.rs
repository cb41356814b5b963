use std::cmp::Ordering;

use tracing::{error, warn};

use crate::domain::{CandidateRecord, ResolvedSh, ShVersion};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Standing {
    Conflicted,
    Clean,
    Designated,
}

impl Standing {
    pub fn of(candidate: &CandidateRecord) -> Self {
        match (candidate.has_conflict, candidate.has_designators) {
            (true, _) => Standing::Conflicted,
            (false, false) => Standing::Clean,
            (false, true) => Standing::Designated,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShMatch {
    NotFound,
    Ambiguous { count: usize },
    Unique(ResolvedSh),
}

impl ShMatch {
    pub fn into_resolved(self) -> ResolvedSh {
        match self {
            ShMatch::Unique(resolved) => resolved,
            ShMatch::NotFound | ShMatch::Ambiguous { .. } => ResolvedSh::unresolved(),
        }
    }
}

#[derive(Debug, Default)]
struct Selection<'a> {
    best: Option<&'a CandidateRecord>,
    count: usize,
}

impl<'a> Selection<'a> {
    fn offer(&mut self, candidate: &'a CandidateRecord) {
        let Some(best) = self.best else {
            self.best = Some(candidate);
            self.count = 1;
            return;
        };
        match Standing::of(candidate).cmp(&Standing::of(best)) {
            Ordering::Greater => {
                self.best = Some(candidate);
                self.count = 1;
            }
            Ordering::Equal => self.count += 1,
            Ordering::Less => {}
        }
    }

    fn finish(self) -> ShMatch {
        match (self.best, self.count) {
            (Some(best), 1) => ShMatch::Unique(ResolvedSh {
                sh_name: best.name.clone(),
                taxon_id: best
                    .taxon_ref
                    .as_ref()
                    .map(|id| id.as_str().to_string())
                    .unwrap_or_default(),
            }),
            (None, _) | (_, 0) => ShMatch::NotFound,
            (Some(_), count) => ShMatch::Ambiguous { count },
        }
    }
}

pub fn select(candidates: &[CandidateRecord], version: &ShVersion) -> ShMatch {
    let mut selection = Selection::default();
    candidates
        .iter()
        .filter(|candidate| version.matches_label(&candidate.version))
        .for_each(|candidate| selection.offer(candidate));
    selection.finish()
}

/// Like [`select`], reporting unresolved outcomes for `query` as diagnostics.
pub fn resolve(query: &str, candidates: &[CandidateRecord], version: &ShVersion) -> ShMatch {
    let outcome = select(candidates, version);
    match &outcome {
        ShMatch::NotFound => warn!("SH not found for {query}"),
        ShMatch::Ambiguous { count } => {
            error!("several \"best\" SHs ({count}) found for {query}")
        }
        ShMatch::Unique(_) => {}
    }
    outcome
}
