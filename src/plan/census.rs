use crate::plan::error::PlanResult;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Relation name prefixes that belong to the host's internal catalogs.
pub const INTERNAL_PREFIXES: &[&str] = &["pg_", "sql_"];

pub fn is_internal_relation(name: &str) -> bool {
    INTERNAL_PREFIXES
        .iter()
        .any(|prefix| name.starts_with(prefix))
}

/// Resident cache blocks per relation, taken fresh for each request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheCensus {
    blocks: BTreeMap<String, u64>,
}

impl CacheCensus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one entry per occupied block, skipping internal relations.
    pub fn tally<I, S>(block_owners: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut census = Self::new();
        for owner in block_owners {
            census.record(owner.as_ref(), 1);
        }
        census
    }

    /// Add `blocks` resident blocks for `relation`. Internal relations are ignored.
    pub fn record(&mut self, relation: &str, blocks: u64) {
        if is_internal_relation(relation) {
            return;
        }
        *self.blocks.entry(relation.to_string()).or_insert(0) += blocks;
    }

    pub fn blocks_for(&self, relation: &str) -> Option<u64> {
        self.blocks.get(relation).copied()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.blocks.iter().map(|(name, count)| (name.as_str(), *count))
    }

    pub fn to_json(&self) -> PlanResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> PlanResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl<S: AsRef<str>> FromIterator<(S, u64)> for CacheCensus {
    fn from_iter<I: IntoIterator<Item = (S, u64)>>(iter: I) -> Self {
        let mut census = Self::new();
        for (relation, blocks) in iter {
            census.record(relation.as_ref(), blocks);
        }
        census
    }
}
