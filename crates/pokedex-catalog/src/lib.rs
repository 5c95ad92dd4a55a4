//! Pokedex catalog: the read-only creature dataset and every query over it.
//!
//! The dataset is loaded once (see [`load`]), normalized at the boundary into
//! clean [`Record`] values, and then held immutable for the lifetime of the
//! process. Everything here is a pure read over that snapshot:
//! - list / search / get-by-id / random sample (the query-service contract),
//! - ordered neighbour lookup for wrap-around navigation,
//! - evolution chain reconstruction ([`evolution`]),
//! - dataset lint ([`lint`]).
//!
//! A `Catalog` is `Send + Sync`; share it behind an `Arc` and read it from any
//! number of threads without locking.

pub mod error;
pub mod evolution;
pub mod lint;
pub mod load;
pub mod record;
pub mod types;
pub mod wire;

use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashMap;

pub use error::CatalogError;
pub use evolution::{Evolution, EvolutionChain};
pub use lint::{Finding, FindingKind, Severity};
pub use load::{load_path, DatasetSource, LoadSummary, LoadedCatalog};
pub use record::{BaseStats, DamageRelations, Record, RecordError, StatKind};
pub use types::TypeTag;
pub use wire::WireRecord;

/// The full dataset, ordered by ascending id.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    records: Vec<Record>,
    index: HashMap<u32, usize>,
}

impl Catalog {
    /// Build a catalog from records in any order. Ids must be unique.
    pub fn from_records(mut records: Vec<Record>) -> Result<Self, CatalogError> {
        records.sort_by_key(|r| r.id);
        let mut index = HashMap::with_capacity(records.len());
        for (pos, r) in records.iter().enumerate() {
            if index.insert(r.id, pos).is_some() {
                return Err(CatalogError::DuplicateId(r.id));
            }
        }
        Ok(Self { records, index })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Every record, ascending id.
    pub fn list_all(&self) -> &[Record] {
        &self.records
    }

    pub fn ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.records.iter().map(|r| r.id)
    }

    pub fn get(&self, id: u32) -> Option<&Record> {
        self.index.get(&id).map(|pos| &self.records[*pos])
    }

    pub fn contains(&self, id: u32) -> bool {
        self.index.contains_key(&id)
    }

    pub fn get_by_id(&self, id: u32) -> Result<&Record, CatalogError> {
        self.get(id).ok_or(CatalogError::NotFound(id))
    }

    /// Search by name or id.
    ///
    /// A query that parses as an integer matches the record with exactly that
    /// id and nothing else. Any other query is a case-insensitive substring
    /// match on the name. An empty query matches nothing.
    pub fn search(&self, query: &str) -> Vec<&Record> {
        let q = query.trim().to_lowercase();
        if q.is_empty() {
            return Vec::new();
        }
        if let Ok(n) = q.parse::<i64>() {
            return u32::try_from(n)
                .ok()
                .and_then(|id| self.get(id))
                .into_iter()
                .collect();
        }
        self.records
            .iter()
            .filter(|r| r.name.to_lowercase().contains(&q))
            .collect()
    }

    /// Up to `count` distinct records chosen uniformly at random.
    pub fn random_sample<R: Rng + ?Sized>(&self, count: usize, rng: &mut R) -> Vec<&Record> {
        let count = count.min(self.records.len());
        self.records.choose_multiple(rng, count).collect()
    }

    /// Id after `id` in ascending order, wrapping from the last to the first.
    ///
    /// `id` need not be present: the next greater id is returned.
    pub fn successor_id(&self, id: u32) -> Option<u32> {
        let pos = self.records.partition_point(|r| r.id <= id);
        self.records
            .get(pos)
            .or_else(|| self.records.first())
            .map(|r| r.id)
    }

    /// Id before `id` in ascending order, wrapping from the first to the last.
    pub fn predecessor_id(&self, id: u32) -> Option<u32> {
        let pos = self.records.partition_point(|r| r.id < id);
        match pos.checked_sub(1) {
            Some(prev) => self.records.get(prev),
            None => self.records.last(),
        }
        .map(|r| r.id)
    }
}
