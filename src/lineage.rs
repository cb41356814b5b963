use tracing::warn;

use crate::cache::TaxonCache;
use crate::domain::{LineageRow, Rank, ShName, TaxonEntry};
use crate::error::ShError;
use crate::plutof::TaxonomyService;

pub struct LineageWalker<'a, S: TaxonomyService + ?Sized> {
    service: &'a S,
    cache: &'a mut TaxonCache,
}

impl<'a, S: TaxonomyService + ?Sized> LineageWalker<'a, S> {
    pub fn new(service: &'a S, cache: &'a mut TaxonCache) -> Self {
        Self { service, cache }
    }

    pub fn build_lineage_row(&mut self, sh: &ShName) -> Result<LineageRow, ShError> {
        let mut row = LineageRow::new(sh.as_str());

        let Some(node) = self.service.taxon_for_sh(sh)? else {
            warn!("SH {sh} lacks taxonomy");
            return Ok(row);
        };

        let entry = self
            .cache
            .insert_checked(&node.id, TaxonEntry::new(node.name, &node.rank))?;
        match entry.canonical_rank() {
            Some(rank) => row.set(rank, entry.name.clone()),
            None if !entry.rank.is_empty() => {
                warn!("rank {} of taxon {} is not listed", entry.rank, node.id)
            }
            None => {}
        }
        row.taxon_id = node.id.to_string();

        for ancestor in &node.lineage {
            let entry = self.cache.get_or_resolve(ancestor, self.service)?;
            if let Some(rank) = Rank::from_canonical(&entry.rank) {
                row.set(rank, entry.name.clone());
            }
        }

        Ok(row)
    }
}
