use predicate_core::{DeviceRecord, EmptyNamePolicy, MatchingConfig};
use serde::Serialize;

use crate::normalize::normalize;
use crate::similarity::normalized_similarity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchTier {
    ClearanceKey,
    NormalizedName,
    Fuzzy,
}

/// A resolved match against the existing working set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Match {
    /// Position of the matched record in the existing collection.
    pub index: usize,
    pub tier: MatchTier,
    /// Name similarity between the two records, whatever tier matched.
    pub similarity: f64,
}

/// Finds the existing record an incoming one refers to.
///
/// Tiers are tried in order and the first hit wins: exact clearance key
/// (case-insensitive, placeholders skipped), equal normalized names, then the
/// best fuzzy name match at or above the similarity threshold. Ties in the
/// fuzzy tier go to the record that comes first.
#[derive(Debug, Clone)]
pub struct MatchResolver {
    similarity_threshold: f64,
    empty_names: EmptyNamePolicy,
}

impl Default for MatchResolver {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.9,
            empty_names: EmptyNamePolicy::Match,
        }
    }
}

impl MatchResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &MatchingConfig) -> Self {
        Self::new()
            .with_threshold(config.similarity_threshold)
            .with_empty_names(config.empty_names)
    }

    /// Clamped to `[0, 1]`. A NaN threshold is ignored.
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        if !threshold.is_nan() {
            self.similarity_threshold = threshold.clamp(0.0, 1.0);
        }
        self
    }

    pub fn with_empty_names(mut self, policy: EmptyNamePolicy) -> Self {
        self.empty_names = policy;
        self
    }

    pub fn threshold(&self) -> f64 {
        self.similarity_threshold
    }

    pub fn resolve(&self, incoming: &DeviceRecord, existing: &[DeviceRecord]) -> Option<Match> {
        let incoming_name = normalize(&incoming.device_name);

        if let Some(key) = incoming.known_clearance_key()
            && let Some(index) = existing.iter().position(|rec| {
                rec.clearance_key
                    .as_deref()
                    .is_some_and(|k| k.eq_ignore_ascii_case(key))
            })
        {
            let similarity =
                normalized_similarity(&normalize(&existing[index].device_name), &incoming_name);
            return Some(Match {
                index,
                tier: MatchTier::ClearanceKey,
                similarity,
            });
        }

        if incoming_name.is_empty() && self.empty_names == EmptyNamePolicy::Ignore {
            return None;
        }

        let existing_names: Vec<String> = existing
            .iter()
            .map(|rec| normalize(&rec.device_name))
            .collect();
        let comparable = |name: &str| !(name.is_empty() && self.empty_names == EmptyNamePolicy::Ignore);

        if let Some(index) = existing_names
            .iter()
            .position(|name| comparable(name) && *name == incoming_name)
        {
            return Some(Match {
                index,
                tier: MatchTier::NormalizedName,
                similarity: 1.0,
            });
        }

        let mut best: Option<Match> = None;
        for (index, name) in existing_names.iter().enumerate() {
            if !comparable(name) {
                continue;
            }
            let similarity = normalized_similarity(name, &incoming_name);
            if similarity < self.similarity_threshold {
                continue;
            }
            if best.is_none_or(|b| similarity > b.similarity) {
                best = Some(Match {
                    index,
                    tier: MatchTier::Fuzzy,
                    similarity,
                });
            }
        }
        best
    }

    pub fn find_match<'a>(
        &self,
        incoming: &DeviceRecord,
        existing: &'a [DeviceRecord],
    ) -> Option<&'a DeviceRecord> {
        self.resolve(incoming, existing).map(|m| &existing[m.index])
    }
}

/// [`MatchResolver::find_match`] with the default threshold and empty-name policy.
pub fn find_match<'a>(
    incoming: &DeviceRecord,
    existing: &'a [DeviceRecord],
) -> Option<&'a DeviceRecord> {
    MatchResolver::default().find_match(incoming, existing)
}
