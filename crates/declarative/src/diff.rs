//! Diff computation between two sets of declarations

use crate::resource::Declaration;
use crate::types::{Kind, ResourceId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// How a declaration changed between two runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Change {
    Added,
    Removed,
    /// Names of the top-level parameters or edge lists that differ
    Modified { fields: Vec<String> },
}

/// A diff for one declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceDiff {
    pub id: ResourceId,
    pub change: Change,
    /// Declaration in the previous set, if it existed
    pub before: Option<Declaration>,
    /// Declaration in the current set, if it exists
    pub after: Option<Declaration>,
}

impl ResourceDiff {
    pub fn is_addition(&self) -> bool {
        matches!(self.change, Change::Added)
    }

    pub fn is_removal(&self) -> bool {
        matches!(self.change, Change::Removed)
    }

    pub fn is_modification(&self) -> bool {
        matches!(self.change, Change::Modified { .. })
    }
}

/// Compare two declaration sets by (kind, name)
///
/// Additions and modifications come in current declaration order,
/// removals afterwards in previous declaration order. Unchanged
/// declarations are left out.
pub fn compute_diffs(previous: &[Declaration], current: &[Declaration]) -> Vec<ResourceDiff> {
    let before: HashMap<&ResourceId, &Declaration> =
        previous.iter().map(|d| (&d.id, d)).collect();
    let after: HashMap<&ResourceId, &Declaration> = current.iter().map(|d| (&d.id, d)).collect();

    let mut diffs = Vec::new();

    for decl in current {
        match before.get(&decl.id) {
            None => diffs.push(ResourceDiff {
                id: decl.id.clone(),
                change: Change::Added,
                before: None,
                after: Some(decl.clone()),
            }),
            Some(old) => {
                let fields = changed_fields(old, decl);
                if !fields.is_empty() {
                    diffs.push(ResourceDiff {
                        id: decl.id.clone(),
                        change: Change::Modified { fields },
                        before: Some((*old).clone()),
                        after: Some(decl.clone()),
                    });
                }
            }
        }
    }

    for decl in previous {
        if !after.contains_key(&decl.id) {
            diffs.push(ResourceDiff {
                id: decl.id.clone(),
                change: Change::Removed,
                before: Some(decl.clone()),
                after: None,
            });
        }
    }

    diffs
}

fn changed_fields(old: &Declaration, new: &Declaration) -> Vec<String> {
    let keys: BTreeSet<&String> = old.params.keys().chain(new.params.keys()).collect();
    let mut fields: Vec<String> = keys
        .into_iter()
        .filter(|k| old.params.get(*k) != new.params.get(*k))
        .cloned()
        .collect();

    if old.depends_on != new.depends_on {
        fields.push("dependsOn".to_string());
    }
    if old.provider != new.provider {
        fields.push("provider".to_string());
    }
    fields
}

/// Diff summary statistics
#[derive(Debug, Clone, Default)]
pub struct DiffSummary {
    /// Number of declarations to add
    pub additions: usize,
    /// Number of declarations to remove
    pub removals: usize,
    /// Number of declarations to modify
    pub modifications: usize,
}

impl DiffSummary {
    /// Create a summary from a list of diffs
    pub fn from_diffs(diffs: &[ResourceDiff]) -> Self {
        let mut summary = Self::default();
        for diff in diffs {
            match diff.change {
                Change::Added => summary.additions += 1,
                Change::Removed => summary.removals += 1,
                Change::Modified { .. } => summary.modifications += 1,
            }
        }
        summary
    }

    /// Total number of changes
    pub fn total(&self) -> usize {
        self.additions + self.removals + self.modifications
    }

    /// Check if there are any changes
    pub fn has_changes(&self) -> bool {
        self.total() > 0
    }
}

/// Group diffs by kind, kinds in their natural order
pub fn group_by_kind(diffs: &[ResourceDiff]) -> BTreeMap<Kind, Vec<&ResourceDiff>> {
    let mut groups: BTreeMap<Kind, Vec<&ResourceDiff>> = BTreeMap::new();
    for diff in diffs {
        groups.entry(diff.id.kind).or_default().push(diff);
    }
    groups
}
