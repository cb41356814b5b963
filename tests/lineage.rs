use std::collections::HashMap;
use std::sync::Mutex;

use assert_matches::assert_matches;

use unite_sh::cache::TaxonCache;
use unite_sh::domain::{CandidateRecord, Rank, ShName, ShVersion, TaxonId, TaxonNode, Threshold};
use unite_sh::error::ShError;
use unite_sh::lineage::LineageWalker;
use unite_sh::plutof::TaxonomyService;

#[derive(Default)]
struct FakePlutof {
    sh_taxa: HashMap<String, String>,
    taxa: Mutex<HashMap<String, TaxonNode>>,
    lookups: Mutex<Vec<String>>,
}

impl FakePlutof {
    fn with_taxon(mut self, id: &str, name: &str, rank: &str, lineage: &[&str]) -> Self {
        self.taxa.get_mut().unwrap().insert(
            id.to_string(),
            TaxonNode {
                id: TaxonId::new(id),
                name: name.to_string(),
                rank: rank.to_string(),
                lineage: lineage.iter().map(|id| TaxonId::new(*id)).collect(),
            },
        );
        self
    }

    fn with_sh(mut self, sh: &str, taxon: &str) -> Self {
        self.sh_taxa.insert(sh.to_string(), taxon.to_string());
        self
    }

    fn rename(&self, id: &str, name: &str) {
        if let Some(node) = self.taxa.lock().unwrap().get_mut(id) {
            node.name = name.to_string();
        }
    }

    fn rerank(&self, id: &str, rank: &str) {
        if let Some(node) = self.taxa.lock().unwrap().get_mut(id) {
            node.rank = rank.to_string();
        }
    }

    fn lookups(&self) -> Vec<String> {
        self.lookups.lock().unwrap().clone()
    }
}

impl TaxonomyService for FakePlutof {
    fn search_clusters(
        &self,
        _accession: &str,
        _threshold: &Threshold,
        _version: &ShVersion,
    ) -> Result<Vec<CandidateRecord>, ShError> {
        Ok(Vec::new())
    }

    fn taxon_for_sh(&self, sh: &ShName) -> Result<Option<TaxonNode>, ShError> {
        match self.sh_taxa.get(sh.as_str()) {
            Some(taxon) => self.taxon_by_id(&TaxonId::new(taxon.as_str())).map(Some),
            None => Ok(None),
        }
    }

    fn taxon_by_id(&self, taxon_id: &TaxonId) -> Result<TaxonNode, ShError> {
        self.lookups.lock().unwrap().push(taxon_id.to_string());
        self.taxa
            .lock()
            .unwrap()
            .get(taxon_id.as_str())
            .cloned()
            .ok_or_else(|| ShError::PlutofStatus {
                status: 404,
                message: format!("taxon {taxon_id} not found"),
            })
    }
}

fn symbiotaphrina() -> FakePlutof {
    FakePlutof::default()
        .with_taxon("1", "Fungi", "Kingdom", &[])
        .with_taxon("2", "Ascomycota", "Phylum", &["1"])
        .with_taxon("3", "Symbiotaphrina", "Genus", &["1", "2"])
        .with_sh("SH1641879.08FU", "3")
}

fn sh(name: &str) -> ShName {
    name.parse().unwrap()
}

#[test]
fn partial_lineage_leaves_other_ranks_empty() {
    let service = symbiotaphrina();
    let mut cache = TaxonCache::new();
    let row = LineageWalker::new(&service, &mut cache)
        .build_lineage_row(&sh("SH1641879.08FU"))
        .unwrap();

    assert_eq!(row.taxon_id, "3");
    assert_eq!(row.get(Rank::Kingdom), Some("Fungi"));
    assert_eq!(row.get(Rank::Phylum), Some("Ascomycota"));
    assert_eq!(row.get(Rank::Genus), Some("Symbiotaphrina"));
    for rank in [Rank::Class, Rank::Order, Rank::Family, Rank::Species] {
        assert_eq!(row.get(rank), None);
    }
    let fields: Vec<&str> = row.rank_fields().collect();
    assert_eq!(
        fields,
        vec!["Fungi", "Ascomycota", "", "", "", "Symbiotaphrina", ""]
    );
    assert_eq!(cache.get(&TaxonId::new("3")).unwrap().rank, "genus");
}

#[test]
fn missing_taxonomy_gives_empty_row() {
    let service = symbiotaphrina();
    let mut cache = TaxonCache::new();
    let row = LineageWalker::new(&service, &mut cache)
        .build_lineage_row(&sh("SH9999999.08FU"))
        .unwrap();
    assert_eq!(row.sh, "SH9999999.08FU");
    assert_eq!(row.taxon_id, "");
    assert_eq!(row.populated(), 0);
    assert!(cache.is_empty());
}

#[test]
fn non_canonical_rank_is_dropped() {
    let service = FakePlutof::default()
        .with_taxon("1", "Fungi", "Kingdom", &[])
        .with_taxon("9", "Symbiotaphrina sect. X", "Section", &["1"])
        .with_sh("SH1.08FU", "9");
    let mut cache = TaxonCache::new();
    let row = LineageWalker::new(&service, &mut cache)
        .build_lineage_row(&sh("SH1.08FU"))
        .unwrap();
    assert_eq!(row.taxon_id, "9");
    assert_eq!(row.populated(), 1);
    assert_eq!(row.get(Rank::Kingdom), Some("Fungi"));
    assert_eq!(cache.get(&TaxonId::new("9")).unwrap().rank, "section");
}

#[test]
fn ancestors_are_looked_up_once_per_run() {
    let service = symbiotaphrina()
        .with_taxon("4", "Symbiotaphrina buchneri", "Species", &["1", "2", "3"])
        .with_sh("SH1541963.08FU", "4");
    let mut cache = TaxonCache::new();
    let mut walker = LineageWalker::new(&service, &mut cache);
    walker.build_lineage_row(&sh("SH1641879.08FU")).unwrap();
    let row = walker.build_lineage_row(&sh("SH1541963.08FU")).unwrap();

    assert_eq!(row.get(Rank::Species), Some("Symbiotaphrina buchneri"));
    assert_eq!(row.get(Rank::Genus), Some("Symbiotaphrina"));
    // Direct taxa come from the SH lookup, ancestors from the cache when seen before.
    assert_eq!(service.lookups(), vec!["3", "1", "2", "4"]);
    assert_eq!(cache.len(), 4);
}

#[test]
fn revisited_taxon_with_same_data_is_accepted() {
    let service = symbiotaphrina().with_sh("SH1641880.08FU", "3");
    let mut cache = TaxonCache::new();
    let mut walker = LineageWalker::new(&service, &mut cache);
    let first = walker.build_lineage_row(&sh("SH1641879.08FU")).unwrap();
    let second = walker.build_lineage_row(&sh("SH1641880.08FU")).unwrap();
    assert_eq!(
        first.rank_fields().collect::<Vec<_>>(),
        second.rank_fields().collect::<Vec<_>>()
    );
}

#[test]
fn revisited_taxon_with_new_name_aborts() {
    let service = symbiotaphrina().with_sh("SH1641880.08FU", "3");
    let mut cache = TaxonCache::new();
    LineageWalker::new(&service, &mut cache)
        .build_lineage_row(&sh("SH1641879.08FU"))
        .unwrap();

    service.rename("3", "Xylona");
    let err = LineageWalker::new(&service, &mut cache)
        .build_lineage_row(&sh("SH1641880.08FU"))
        .unwrap_err();
    assert_matches!(
        err,
        ShError::InconsistentTaxon { ref taxon_id, ref cached_name, ref name, .. }
            if taxon_id == "3" && cached_name == "Symbiotaphrina" && name == "Xylona"
    );
}

#[test]
fn revisited_taxon_with_new_rank_aborts() {
    let service = symbiotaphrina().with_sh("SH1641880.08FU", "3");
    let mut cache = TaxonCache::new();
    LineageWalker::new(&service, &mut cache)
        .build_lineage_row(&sh("SH1641879.08FU"))
        .unwrap();

    service.rerank("3", "Family");
    let err = LineageWalker::new(&service, &mut cache)
        .build_lineage_row(&sh("SH1641880.08FU"))
        .unwrap_err();
    assert_matches!(
        err,
        ShError::InconsistentTaxon { ref cached_name, ref cached_rank, ref name, ref rank, .. }
            if cached_name == "Symbiotaphrina"
                && name == "Symbiotaphrina"
                && cached_rank == "genus"
                && rank == "family"
    );
    assert_eq!(cache.get(&TaxonId::new("3")).unwrap().rank, "genus");
}

#[test]
fn fresh_caches_give_identical_rows() {
    let service = symbiotaphrina();
    let build = || {
        let mut cache = TaxonCache::new();
        LineageWalker::new(&service, &mut cache)
            .build_lineage_row(&sh("SH1641879.08FU"))
            .unwrap()
    };
    assert_eq!(build(), build());
}

#[test]
fn transport_failure_propagates() {
    let service = FakePlutof::default()
        .with_taxon("3", "Symbiotaphrina", "Genus", &["404"])
        .with_sh("SH1641879.08FU", "3");
    let mut cache = TaxonCache::new();
    let err = LineageWalker::new(&service, &mut cache)
        .build_lineage_row(&sh("SH1641879.08FU"))
        .unwrap_err();
    assert_matches!(err, ShError::PlutofStatus { status: 404, .. });
}
