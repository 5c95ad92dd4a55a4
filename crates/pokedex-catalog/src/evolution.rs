//! Evolution chain reconstruction.
//!
//! Records only carry local links: an optional `previous_evolution_id` and a
//! list of `next_evolution_ids`. A chain is rebuilt on demand by walking up to
//! the root ancestor and then breadth-first back down. Links may be dangling,
//! asymmetric or even cyclic; the walk drops what does not resolve and never
//! visits an id twice, so it always terminates.

use serde::Serialize;
use std::collections::HashSet;

use crate::Catalog;

/// Ordered stages from the root ancestor down. Ids within a stage are in
/// discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EvolutionChain {
    pub stages: Vec<Vec<u32>>,
}

/// What a detail view shows for evolutions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Evolution {
    Evolves(EvolutionChain),
    DoesNotEvolve,
}

impl EvolutionChain {
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn root(&self) -> Option<u32> {
        self.stages.first().and_then(|s| s.first()).copied()
    }

    pub fn member_ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.stages.iter().flatten().copied()
    }

    pub fn contains(&self, id: u32) -> bool {
        self.member_ids().any(|m| m == id)
    }

    /// Stage index holding `id`.
    pub fn depth_of(&self, id: u32) -> Option<usize> {
        self.stages.iter().position(|s| s.contains(&id))
    }

    /// A lone single-member stage (or nothing at all) means no evolution.
    pub fn into_evolution(self) -> Evolution {
        let single = self.stages.len() == 1 && self.stages[0].len() == 1;
        if self.is_empty() || single {
            Evolution::DoesNotEvolve
        } else {
            Evolution::Evolves(self)
        }
    }
}

impl Evolution {
    pub fn chain(&self) -> Option<&EvolutionChain> {
        match self {
            Evolution::Evolves(chain) => Some(chain),
            Evolution::DoesNotEvolve => None,
        }
    }
}

impl Catalog {
    /// Walk `previous_evolution_id` links up from `id`.
    ///
    /// Stops at a missing link, a link that does not resolve, or a link back
    /// to an id already seen on this walk. Returns `None` when `id` itself is
    /// not in the catalog.
    pub fn evolution_root(&self, id: u32) -> Option<u32> {
        let mut current = self.get(id)?;
        let mut seen = HashSet::from([id]);
        while let Some(prev) = current.previous_evolution_id {
            if seen.contains(&prev) {
                break;
            }
            let Some(parent) = self.get(prev) else {
                break;
            };
            seen.insert(prev);
            current = parent;
        }
        Some(current.id)
    }

    /// Reconstruct the full chain containing `id`.
    ///
    /// An id that is not in the catalog yields an empty chain.
    pub fn evolution_chain(&self, id: u32) -> EvolutionChain {
        let Some(root) = self.evolution_root(id) else {
            return EvolutionChain::default();
        };

        let mut stages = Vec::new();
        let mut visited = HashSet::from([root]);
        let mut stage = vec![root];

        while !stage.is_empty() {
            let mut next_stage = Vec::new();
            for member in &stage {
                let Some(record) = self.get(*member) else {
                    continue;
                };
                for next in &record.next_evolution_ids {
                    if !self.contains(*next) {
                        tracing::debug!(from = member, to = next, "dropping dangling evolution link");
                        continue;
                    }
                    if visited.insert(*next) {
                        next_stage.push(*next);
                    }
                }
            }
            stages.push(stage);
            stage = next_stage;
        }

        EvolutionChain { stages }
    }

    pub fn evolution(&self, id: u32) -> Evolution {
        self.evolution_chain(id).into_evolution()
    }
}
