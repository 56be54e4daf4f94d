use std::collections::HashSet;
use std::ops::ControlFlow;

use crate::error::Result;
use crate::sanitize::DEFAULT_LABEL_BUDGET;
use crate::sanitize::display_label;
use crate::store::EntryStore;
use crate::store::compare_names;
use crate::types::Candidate;
use crate::types::EntryId;
use crate::types::FieldEntry;
use crate::types::SourceKind;

/// Limits applied when ranking restore candidates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RankLimits {
    pub max_per_group: usize,
    pub label_budget: usize,
}

impl Default for RankLimits {
    fn default() -> Self {
        Self {
            max_per_group: 10,
            label_budget: DEFAULT_LABEL_BUDGET,
        }
    }
}

/// Restore candidates for `host`: first entries captured on that host, then
/// the most recently used entries from other hosts. Each group holds at most
/// `max_per_group` candidates and no entry appears twice.
pub fn rank_for_host(
    store: &dyn EntryStore,
    host: &str,
    max_per_group: usize,
) -> Result<Vec<Candidate>> {
    rank_with_limits(
        store,
        host,
        RankLimits {
            max_per_group,
            ..RankLimits::default()
        },
    )
}

pub fn rank_with_limits(
    store: &dyn EntryStore,
    host: &str,
    limits: RankLimits,
) -> Result<Vec<Candidate>> {
    let by_host = host_group(store, host, limits)?;
    let taken: HashSet<EntryId> = by_host.iter().map(|c| c.entry_id).collect();
    let by_recency = recency_group(store, host, &taken, limits)?;
    tracing::debug!(
        host,
        by_host = by_host.len(),
        by_recency = by_recency.len(),
        "ranked restore candidates"
    );
    Ok(by_host.into_iter().chain(by_recency).collect())
}

fn host_group(store: &dyn EntryStore, host: &str, limits: RankLimits) -> Result<Vec<Candidate>> {
    if host.is_empty() || limits.max_per_group == 0 {
        return Ok(Vec::new());
    }
    let mut group = Vec::with_capacity(limits.max_per_group);
    store.scan_by_host(host, &mut |entry| {
        collect_eligible(&mut group, entry, SourceKind::ByHost, limits)
    })?;
    // The index already approximates this order; filtering can disturb it.
    group.sort_by(|a, b| {
        b.last_used
            .cmp(&a.last_used)
            .then_with(|| compare_names(&a.name, &b.name))
    });
    Ok(renumber(group))
}

fn recency_group(
    store: &dyn EntryStore,
    host: &str,
    taken: &HashSet<EntryId>,
    limits: RankLimits,
) -> Result<Vec<Candidate>> {
    if limits.max_per_group == 0 {
        return Ok(Vec::new());
    }
    let mut group = Vec::with_capacity(limits.max_per_group);
    store.scan_by_recency(&mut |entry| {
        if entry.host == host || taken.contains(&entry.id) {
            return ControlFlow::Continue(());
        }
        collect_eligible(&mut group, entry, SourceKind::ByRecency, limits)
    })?;
    Ok(renumber(group))
}

fn collect_eligible(
    group: &mut Vec<Candidate>,
    entry: FieldEntry,
    source_kind: SourceKind,
    limits: RankLimits,
) -> ControlFlow<()> {
    if let Some(candidate) = candidate_from(entry, source_kind, limits.label_budget) {
        group.push(candidate);
    }
    if group.len() >= limits.max_per_group {
        ControlFlow::Break(())
    } else {
        ControlFlow::Continue(())
    }
}

fn candidate_from(entry: FieldEntry, source_kind: SourceKind, budget: usize) -> Option<Candidate> {
    if entry.is_sensitive() {
        return None;
    }
    let label = display_label(&entry.value, budget);
    if label.is_empty() {
        return None;
    }
    Some(Candidate {
        source_kind,
        entry_id: entry.id,
        name: entry.name,
        label,
        last_used: entry.last_used,
        rank: 0,
    })
}

fn renumber(group: Vec<Candidate>) -> Vec<Candidate> {
    group
        .into_iter()
        .enumerate()
        .map(|(rank, candidate)| Candidate { rank, ..candidate })
        .collect()
}
