//! Choosing which duplicate to keep.

use std::cmp::{Ordering, Reverse};

use serde::{Deserialize, Serialize};

use tidyfile_core::{FileRecord, KeepStrategy};

use crate::duplicates::DuplicateGroup;

/// Outcome of resolving one duplicate group.
///
/// `keep` is a member of `group`; `remove` is every other member, in
/// discovery order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeepDecision {
    /// The group that was resolved.
    pub group: DuplicateGroup,
    /// The single file to retain.
    pub keep: FileRecord,
    /// Files that may be removed.
    pub remove: Vec<FileRecord>,
}

impl KeepDecision {
    /// Bytes freed if every `remove` entry is deleted.
    pub fn reclaimable_bytes(&self) -> u64 {
        self.remove.iter().map(FileRecord::size).sum()
    }
}

/// Pick the member to keep from `group` under `strategy`.
///
/// Pure function of the group's data: the same group always yields the same
/// decision. Every strategy is a total order, so ties never depend on input
/// position except for `KeepFirst`, whose whole point is input position.
pub fn resolve(group: &DuplicateGroup, strategy: KeepStrategy) -> KeepDecision {
    let index = keep_index(&group.members, strategy);
    let keep = group.members[index].clone();
    let remove = group
        .members
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != index)
        .map(|(_, m)| m.clone())
        .collect();

    KeepDecision {
        group: group.clone(),
        keep,
        remove,
    }
}

/// Resolve every group with the same strategy.
pub fn resolve_all(groups: &[DuplicateGroup], strategy: KeepStrategy) -> Vec<KeepDecision> {
    groups.iter().map(|g| resolve(g, strategy)).collect()
}

fn keep_index(members: &[FileRecord], strategy: KeepStrategy) -> usize {
    let best = match strategy {
        KeepStrategy::KeepFirst => return 0,
        KeepStrategy::KeepOldest => members
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| {
                a.modified()
                    .cmp(&b.modified())
                    .then_with(|| by_path(a, b))
            }),
        KeepStrategy::KeepNewest => members
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| {
                Reverse(a.modified())
                    .cmp(&Reverse(b.modified()))
                    .then_with(|| by_path(a, b))
            }),
        KeepStrategy::KeepShortestPath => members
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| {
                a.path_len()
                    .cmp(&b.path_len())
                    .then_with(|| a.modified().cmp(&b.modified()))
                    .then_with(|| a.path().as_os_str().cmp(b.path().as_os_str()))
            }),
    };
    best.map(|(i, _)| i).unwrap_or(0)
}

/// Shorter path first, then lexicographic.
fn by_path(a: &FileRecord, b: &FileRecord) -> Ordering {
    a.path_len()
        .cmp(&b.path_len())
        .then_with(|| a.path().as_os_str().cmp(b.path().as_os_str()))
}
