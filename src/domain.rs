use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use clap::ValueEnum;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ShError;

static SH_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^SH\d+\.\d+[A-Za-z]*$").expect("valid SH name pattern"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rank {
    Kingdom,
    Phylum,
    Class,
    Order,
    Family,
    Genus,
    Species,
}

impl Rank {
    pub const ALL: [Rank; 7] = [
        Rank::Kingdom,
        Rank::Phylum,
        Rank::Class,
        Rank::Order,
        Rank::Family,
        Rank::Genus,
        Rank::Species,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Rank::Kingdom => "kingdom",
            Rank::Phylum => "phylum",
            Rank::Class => "class",
            Rank::Order => "order",
            Rank::Family => "family",
            Rank::Genus => "genus",
            Rank::Species => "species",
        }
    }

    /// Returns `None` for ranks outside the canonical seven (e.g. "subgenus").
    pub fn from_canonical(value: &str) -> Option<Rank> {
        Rank::ALL
            .into_iter()
            .find(|rank| rank.as_str().eq_ignore_ascii_case(value.trim()))
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaxonId(String);

impl TaxonId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaxonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShName(String);

impl ShName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ShName {
    type Err = ShError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim();
        if !SH_NAME_RE.is_match(normalized) {
            return Err(ShError::InvalidShName(value.to_string()));
        }
        Ok(Self(normalized.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShVersion(String);

impl ShVersion {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn label(&self) -> String {
        format!("Version {}", self.0)
    }

    pub fn matches_label(&self, label: &str) -> bool {
        label.trim() == self.label()
    }
}

impl Default for ShVersion {
    fn default() -> Self {
        Self("8".to_string())
    }
}

impl fmt::Display for ShVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ShVersion {
    type Err = ShError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let number = trimmed
            .strip_prefix("Version")
            .map(str::trim)
            .unwrap_or(trimmed);
        let is_valid = !number.is_empty() && number.chars().all(|ch| ch.is_ascii_digit());
        if !is_valid {
            return Err(ShError::InvalidVersion(value.to_string()));
        }
        Ok(Self(number.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Threshold(String);

impl Threshold {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Threshold {
    fn default() -> Self {
        Self("1.5".to_string())
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Threshold {
    type Err = ShError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        match trimmed.parse::<f64>() {
            Ok(parsed) if parsed.is_finite() && parsed > 0.0 => Ok(Self(trimmed.to_string())),
            _ => Err(ShError::InvalidThreshold(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum InputFormat {
    #[default]
    Fasta,
    List,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateRecord {
    pub version: String,
    pub name: String,
    pub has_conflict: bool,
    pub has_designators: bool,
    pub taxon_ref: Option<TaxonId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolvedSh {
    pub sh_name: String,
    pub taxon_id: String,
}

impl ResolvedSh {
    pub fn unresolved() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaxonEntry {
    pub name: String,
    pub rank: String,
}

impl TaxonEntry {
    pub fn new(name: impl Into<String>, rank: &str) -> Self {
        Self {
            name: name.into(),
            rank: rank.to_lowercase(),
        }
    }

    pub fn canonical_rank(&self) -> Option<Rank> {
        Rank::from_canonical(&self.rank)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaxonNode {
    pub id: TaxonId,
    pub name: String,
    pub rank: String,
    pub lineage: Vec<TaxonId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineageRow {
    pub sh: String,
    pub taxon_id: String,
    ranks: [Option<String>; 7],
}

impl LineageRow {
    pub fn new(sh: impl Into<String>) -> Self {
        Self {
            sh: sh.into(),
            taxon_id: String::new(),
            ranks: Default::default(),
        }
    }

    pub fn get(&self, rank: Rank) -> Option<&str> {
        self.ranks[rank.index()].as_deref()
    }

    pub fn set(&mut self, rank: Rank, name: impl Into<String>) {
        self.ranks[rank.index()] = Some(name.into());
    }

    pub fn populated(&self) -> usize {
        self.ranks.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn rank_fields(&self) -> impl Iterator<Item = &str> {
        self.ranks.iter().map(|slot| slot.as_deref().unwrap_or(""))
    }
}
