use indexmap::IndexMap;
use indexmap::map::Entry;
use tracing::debug;

use crate::domain::{TaxonEntry, TaxonId};
use crate::error::ShError;
use crate::plutof::TaxonomyService;

#[derive(Debug, Default)]
pub struct TaxonCache {
    entries: IndexMap<TaxonId, TaxonEntry>,
}

impl TaxonCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, taxon_id: &TaxonId) -> Option<&TaxonEntry> {
        self.entries.get(taxon_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TaxonId, &TaxonEntry)> {
        self.entries.iter()
    }

    pub fn get_or_resolve<S: TaxonomyService + ?Sized>(
        &mut self,
        taxon_id: &TaxonId,
        service: &S,
    ) -> Result<&TaxonEntry, ShError> {
        match self.entries.entry(taxon_id.clone()) {
            Entry::Occupied(occupied) => Ok(occupied.into_mut()),
            Entry::Vacant(vacant) => {
                let node = service.taxon_by_id(taxon_id)?;
                debug!(taxon = %taxon_id, name = %node.name, rank = %node.rank, "resolved taxon");
                Ok(vacant.insert(TaxonEntry::new(node.name, &node.rank)))
            }
        }
    }

    pub fn insert_checked(
        &mut self,
        taxon_id: &TaxonId,
        entry: TaxonEntry,
    ) -> Result<&TaxonEntry, ShError> {
        let entry = TaxonEntry::new(entry.name, &entry.rank);
        match self.entries.entry(taxon_id.clone()) {
            Entry::Occupied(occupied) => {
                let cached = occupied.into_mut();
                if *cached != entry {
                    return Err(ShError::InconsistentTaxon {
                        taxon_id: taxon_id.to_string(),
                        cached_name: cached.name.clone(),
                        cached_rank: cached.rank.clone(),
                        name: entry.name,
                        rank: entry.rank,
                    });
                }
                Ok(cached)
            }
            Entry::Vacant(vacant) => Ok(vacant.insert(entry)),
        }
    }
}
