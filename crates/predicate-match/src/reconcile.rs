use predicate_core::{DeviceField, DeviceRecord};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{MatchError, Result};
use crate::merge::{MergePolicy, changed_fields, merge_with};
use crate::resolver::{MatchResolver, MatchTier};
use crate::sources::SearchQuery;

/// What happened to one incoming record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    Merged {
        index: usize,
        id: String,
        incoming_id: String,
        tier: MatchTier,
        similarity: f64,
        updated_fields: Vec<DeviceField>,
    },
    Appended {
        index: usize,
        id: String,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReconcileReport {
    /// True when the working set was replaced rather than merged into.
    pub replaced: bool,
    pub outcomes: Vec<Outcome>,
}

impl ReconcileReport {
    pub fn merged_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, Outcome::Merged { .. }))
            .count()
    }

    pub fn appended_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, Outcome::Appended { .. }))
            .count()
    }
}

/// Resolver and merge policy applied together to incoming records.
#[derive(Debug, Clone, Default)]
pub struct Reconciler {
    resolver: MatchResolver,
    policy: MergePolicy,
}

impl Reconciler {
    pub fn new(resolver: MatchResolver, policy: MergePolicy) -> Self {
        Self { resolver, policy }
    }

    fn apply(&self, records: &mut Vec<DeviceRecord>, incoming: DeviceRecord) -> Outcome {
        match self.resolver.resolve(&incoming, records) {
            Some(m) => {
                let current = &records[m.index];
                let merged = merge_with(current, &incoming, &self.policy);
                let updated_fields = changed_fields(current, &merged);
                debug!(
                    id = %merged.id,
                    incoming = %incoming.id,
                    tier = ?m.tier,
                    similarity = m.similarity,
                    updated = updated_fields.len(),
                    "merged incoming record"
                );
                let outcome = Outcome::Merged {
                    index: m.index,
                    id: merged.id.clone(),
                    incoming_id: incoming.id,
                    tier: m.tier,
                    similarity: m.similarity,
                    updated_fields,
                };
                records[m.index] = merged;
                outcome
            }
            None => {
                debug!(id = %incoming.id, name = %incoming.device_name, "no match, appending");
                let outcome = Outcome::Appended {
                    index: records.len(),
                    id: incoming.id.clone(),
                };
                records.push(incoming);
                outcome
            }
        }
    }
}

/// The session's current list of device records.
///
/// Operations return a new working set and leave `self` untouched, so callers
/// can compare old and new state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct WorkingSet {
    records: Vec<DeviceRecord>,
}

impl WorkingSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: Vec<DeviceRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[DeviceRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Merge or append each incoming record in order. Later records can
    /// match ones appended earlier in the same batch.
    pub fn reconcile<I>(&self, incoming: I, reconciler: &Reconciler) -> (WorkingSet, ReconcileReport)
    where
        I: IntoIterator<Item = DeviceRecord>,
    {
        let mut records = self.records.clone();
        let outcomes: Vec<Outcome> = incoming
            .into_iter()
            .map(|record| reconciler.apply(&mut records, record))
            .collect();

        let report = ReconcileReport {
            replaced: false,
            outcomes,
        };
        info!(
            merged = report.merged_count(),
            appended = report.appended_count(),
            total = records.len(),
            "reconciled batch"
        );
        (Self { records }, report)
    }

    /// Apply search results: merged in when the query accumulates, otherwise
    /// they replace every record not selected for comparison. Selected records
    /// are kept and the results are reconciled into them.
    pub fn apply_search(
        &self,
        query: &SearchQuery,
        results: Vec<DeviceRecord>,
        reconciler: &Reconciler,
    ) -> (WorkingSet, ReconcileReport) {
        if query.accumulates() {
            return self.reconcile(results, reconciler);
        }

        let kept = Self {
            records: self.selected().cloned().collect(),
        };
        let dropped = self.len() - kept.len();
        if dropped > 0 {
            warn!(
                dropped,
                kept = kept.len(),
                product_code = ?query.product_code,
                "search replaces working set"
            );
        }

        let (records, mut report) = kept.reconcile(results, reconciler);
        report.replaced = true;
        (records, report)
    }

    pub fn selected(&self) -> impl Iterator<Item = &DeviceRecord> {
        self.records.iter().filter(|r| r.added_to_comparison)
    }

    /// Mark a record for comparison. At most `max_selected` may be marked.
    pub fn select(&self, id: &str, max_selected: usize) -> Result<WorkingSet> {
        let index = self.position(id)?;
        if self.records[index].added_to_comparison {
            return Ok(self.clone());
        }
        if self.selected().count() >= max_selected {
            warn!(id, max_selected, "comparison is full");
            return Err(MatchError::ComparisonFull(max_selected));
        }

        let mut records = self.records.clone();
        records[index].added_to_comparison = true;
        Ok(Self { records })
    }

    pub fn deselect(&self, id: &str) -> Result<WorkingSet> {
        let index = self.position(id)?;
        let mut records = self.records.clone();
        records[index].added_to_comparison = false;
        Ok(Self { records })
    }

    fn position(&self, id: &str) -> Result<usize> {
        self.records
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| MatchError::RecordNotFound(id.to_string()))
    }
}

impl From<Vec<DeviceRecord>> for WorkingSet {
    fn from(records: Vec<DeviceRecord>) -> Self {
        Self::from_records(records)
    }
}
