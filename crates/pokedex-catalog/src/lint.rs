//! Dataset lint: evolution-link problems worth knowing about.
//!
//! Chain reconstruction tolerates every one of these, so none is fatal. The
//! lint just makes them visible.

use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

use crate::Catalog;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FindingKind {
    DanglingPrevious { target: u32 },
    DanglingNext { target: u32 },
    PreviousCycle { cycle: Vec<u32> },
    /// `id` lists `target` as next, but `target` points back elsewhere.
    NextNotReciprocated { target: u32, target_previous: Option<u32> },
    /// `id` names `target` as previous, but `target` does not list `id`.
    PreviousNotReciprocated { target: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub id: u32,
    pub severity: Severity,
    #[serde(flatten)]
    pub kind: FindingKind,
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            FindingKind::DanglingPrevious { target } => {
                write!(f, "#{}: previous_evolution_id {} does not exist", self.id, target)
            }
            FindingKind::DanglingNext { target } => {
                write!(f, "#{}: next_evolution_id entry {} does not exist", self.id, target)
            }
            FindingKind::PreviousCycle { cycle } => {
                let path: Vec<String> = cycle.iter().map(|id| format!("#{id}")).collect();
                write!(f, "#{}: previous_evolution_id cycle {}", self.id, path.join(" -> "))
            }
            FindingKind::NextNotReciprocated {
                target,
                target_previous,
            } => match target_previous {
                Some(p) => write!(
                    f,
                    "#{}: lists #{} as next, but #{} evolves from #{}",
                    self.id, target, target, p
                ),
                None => write!(
                    f,
                    "#{}: lists #{} as next, but #{} has no previous_evolution_id",
                    self.id, target, target
                ),
            },
            FindingKind::PreviousNotReciprocated { target } => write!(
                f,
                "#{}: evolves from #{}, but #{} does not list it as next",
                self.id, target, target
            ),
        }
    }
}

pub fn lint(catalog: &Catalog) -> Vec<Finding> {
    let mut out = Vec::new();
    let mut cycles_reported: HashSet<u32> = HashSet::new();

    for r in catalog.list_all() {
        if let Some(prev) = r.previous_evolution_id {
            match catalog.get(prev) {
                None => out.push(Finding {
                    id: r.id,
                    severity: Severity::Error,
                    kind: FindingKind::DanglingPrevious { target: prev },
                }),
                Some(parent) if !parent.next_evolution_ids.contains(&r.id) => out.push(Finding {
                    id: r.id,
                    severity: Severity::Warning,
                    kind: FindingKind::PreviousNotReciprocated { target: prev },
                }),
                Some(_) => {}
            }
        }

        for next in &r.next_evolution_ids {
            match catalog.get(*next) {
                None => out.push(Finding {
                    id: r.id,
                    severity: Severity::Error,
                    kind: FindingKind::DanglingNext { target: *next },
                }),
                Some(child) if child.previous_evolution_id != Some(r.id) => out.push(Finding {
                    id: r.id,
                    severity: Severity::Warning,
                    kind: FindingKind::NextNotReciprocated {
                        target: *next,
                        target_previous: child.previous_evolution_id,
                    },
                }),
                Some(_) => {}
            }
        }

        if cycles_reported.contains(&r.id) {
            continue;
        }
        if let Some(cycle) = previous_cycle_from(catalog, r.id) {
            cycles_reported.extend(cycle.iter().copied());
            out.push(Finding {
                id: r.id,
                severity: Severity::Error,
                kind: FindingKind::PreviousCycle { cycle },
            });
        }
    }

    out
}

/// The cycle reached by following `previous_evolution_id` from `start`, if
/// `start` sits on one.
fn previous_cycle_from(catalog: &Catalog, start: u32) -> Option<Vec<u32>> {
    let mut path = vec![start];
    let mut current = catalog.get(start)?;
    while let Some(prev) = current.previous_evolution_id {
        if prev == start {
            path.push(start);
            return Some(path);
        }
        if path.contains(&prev) {
            // A cycle further up; it is reported from one of its own members.
            return None;
        }
        current = catalog.get(prev)?;
        path.push(prev);
    }
    None
}

pub fn has_errors(findings: &[Finding]) -> bool {
    findings.iter().any(|f| f.severity == Severity::Error)
}
