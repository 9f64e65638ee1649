//! Predicate device matching: normalization, similarity, three-tier resolution and merge.

pub mod clearance;
pub mod error;
pub mod merge;
pub mod normalize;
pub mod reconcile;
pub mod resolver;
pub mod similarity;
pub mod sources;

pub use clearance::ClearanceNumber;
pub use error::{MatchError, Result};
pub use merge::{MergePolicy, changed_fields, merge, merge_with};
pub use normalize::normalize;
pub use reconcile::{Outcome, ReconcileReport, Reconciler, WorkingSet};
pub use resolver::{Match, MatchResolver, MatchTier, find_match};
pub use similarity::{edit_distance, similarity};
pub use sources::{PdfExtraction, SearchDevice, SearchQuery, SearchRequest, SearchResponse};
