use std::collections::BTreeSet;

use predicate_core::{DeviceField, DeviceRecord, UploadPolicy, concrete};

/// Which fields a concrete incoming value may overwrite.
///
/// Every field not listed follows fill-missing-only: the existing value is kept
/// whenever it is concrete. A placeholder never overwrites anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergePolicy {
    overrides: BTreeSet<DeviceField>,
}

impl MergePolicy {
    pub fn fill_missing() -> Self {
        Self::default()
    }

    /// Registry fields read from a clearance letter replace what a search returned.
    pub fn pdf_extraction() -> Self {
        Self::fill_missing()
            .with_override(DeviceField::ProductCode)
            .with_override(DeviceField::DeviceClass)
            .with_override(DeviceField::ClearanceDate)
            .with_override(DeviceField::Manufacturer)
            .with_override(DeviceField::RegulationNumber)
    }

    pub fn with_override(mut self, field: DeviceField) -> Self {
        self.overrides.insert(field);
        self
    }

    pub fn overrides(&self, field: DeviceField) -> bool {
        self.overrides.contains(&field)
    }
}

impl From<UploadPolicy> for MergePolicy {
    fn from(policy: UploadPolicy) -> Self {
        match policy {
            UploadPolicy::FillMissing => Self::fill_missing(),
            UploadPolicy::PdfExtraction => Self::pdf_extraction(),
        }
    }
}

/// Fill-missing-only merge of `incoming` into `existing`.
pub fn merge(existing: &DeviceRecord, incoming: &DeviceRecord) -> DeviceRecord {
    merge_with(existing, incoming, &MergePolicy::fill_missing())
}

/// Merge under an explicit policy. Neither input is modified.
///
/// `id`, `device_name` and `added_to_comparison` always come from `existing`.
/// The clearance key is filled in from `incoming` only when `existing` has none.
pub fn merge_with(
    existing: &DeviceRecord,
    incoming: &DeviceRecord,
    policy: &MergePolicy,
) -> DeviceRecord {
    let mut merged = existing.clone();

    for field in DeviceField::ALL {
        let current = concrete(existing.field(field));
        let offered = concrete(incoming.field(field));

        let value = match (current, offered) {
            (Some(_), Some(new)) if policy.overrides(field) => Some(new),
            (Some(kept), _) => Some(kept),
            (None, _) => incoming.field(field),
        };
        merged.set_field(field, value.map(str::to_string));
    }

    if merged.known_clearance_key().is_none()
        && let Some(key) = incoming.known_clearance_key()
    {
        merged.clearance_key = Some(key.to_string());
    }

    merged
}

/// Fields whose value differs between two versions of a record.
pub fn changed_fields(before: &DeviceRecord, after: &DeviceRecord) -> Vec<DeviceField> {
    DeviceField::ALL
        .into_iter()
        .filter(|f| before.field(*f) != after.field(*f))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_overwritten_concrete_preserved() {
        let existing = DeviceRecord::new("1", "Device")
            .with_field(DeviceField::Manufacturer, "Unknown")
            .with_field(DeviceField::IntendedUse, "For X");
        let incoming = DeviceRecord::new("2", "Device")
            .with_field(DeviceField::Manufacturer, "Acme Corp")
            .with_field(DeviceField::IntendedUse, "For Y");

        let merged = merge(&existing, &incoming);
        assert_eq!(merged.manufacturer.as_deref(), Some("Acme Corp"));
        assert_eq!(merged.intended_use.as_deref(), Some("For X"));
    }

    #[test]
    fn inputs_are_not_mutated() {
        let existing = DeviceRecord::new("1", "Device")
            .with_field(DeviceField::Technology, "N/A")
            .with_field(DeviceField::ProductCode, "QKO");
        let incoming = DeviceRecord::new("2", "Other")
            .with_clearance_key("K123456")
            .with_field(DeviceField::Technology, "Lateral flow");
        let existing_before = existing.clone();
        let incoming_before = incoming.clone();

        let merged = merge_with(&existing, &incoming, &MergePolicy::pdf_extraction());

        assert_eq!(existing, existing_before);
        assert_eq!(incoming, incoming_before);
        assert_ne!(merged, existing);
    }

    #[test]
    fn identity_comes_from_existing() {
        let mut existing = DeviceRecord::new("K123456", "QuickVue Influenza A+B Test")
            .with_clearance_key("K123456");
        existing.added_to_comparison = true;
        let incoming = DeviceRecord::new("uploaded-1", "Quickvue Influenza AB")
            .with_clearance_key("K654321");

        let merged = merge(&existing, &incoming);
        assert_eq!(merged.id, "K123456");
        assert_eq!(merged.device_name, "QuickVue Influenza A+B Test");
        assert_eq!(merged.clearance_key.as_deref(), Some("K123456"));
        assert!(merged.added_to_comparison);
    }

    #[test]
    fn missing_clearance_key_is_filled() {
        let existing = DeviceRecord::new("uploaded-1", "Device").with_clearance_key("Unknown");
        let incoming = DeviceRecord::new("K123456", "Device").with_clearance_key("K123456");

        let merged = merge(&existing, &incoming);
        assert_eq!(merged.clearance_key.as_deref(), Some("K123456"));
        assert_eq!(merged.id, "uploaded-1");
    }

    #[test]
    fn placeholders_are_case_sensitive() {
        let existing = DeviceRecord::new("1", "Device").with_field(DeviceField::Manufacturer, "unknown");
        let incoming = DeviceRecord::new("2", "Device").with_field(DeviceField::Manufacturer, "Acme");

        assert_eq!(merge(&existing, &incoming).manufacturer.as_deref(), Some("unknown"));
    }

    #[test]
    fn absent_existing_adopts_incoming_as_is() {
        let existing = DeviceRecord::new("1", "Device").with_field(DeviceField::ClearanceDate, "Unknown");
        let incoming = DeviceRecord::new("2", "Device");

        let merged = merge(&existing, &incoming);
        assert_eq!(merged.clearance_date, None);
    }

    #[test]
    fn pdf_policy_overrides_registry_fields_only() {
        let existing = DeviceRecord::new("1", "Device")
            .with_field(DeviceField::Manufacturer, "Acme")
            .with_field(DeviceField::IntendedUse, "For X")
            .with_field(DeviceField::ClearanceDate, "2019-01-01");
        let incoming = DeviceRecord::new("2", "Device")
            .with_field(DeviceField::Manufacturer, "Acme Corporation")
            .with_field(DeviceField::IntendedUse, "For Y")
            .with_field(DeviceField::ClearanceDate, "Unknown");

        let merged = merge_with(&existing, &incoming, &MergePolicy::pdf_extraction());
        assert_eq!(merged.manufacturer.as_deref(), Some("Acme Corporation"));
        assert_eq!(merged.intended_use.as_deref(), Some("For X"));
        assert_eq!(merged.clearance_date.as_deref(), Some("2019-01-01"));
    }

    #[test]
    fn upload_policy_conversion() {
        assert_eq!(MergePolicy::from(UploadPolicy::FillMissing), MergePolicy::fill_missing());
        assert!(MergePolicy::from(UploadPolicy::PdfExtraction).overrides(DeviceField::ProductCode));
        assert!(!MergePolicy::pdf_extraction().overrides(DeviceField::Technology));
    }

    #[test]
    fn changed_fields_lists_differences() {
        let before = DeviceRecord::new("1", "Device").with_field(DeviceField::Manufacturer, "Unknown");
        let after = before.clone().with_field(DeviceField::Manufacturer, "Acme");
        assert_eq!(changed_fields(&before, &after), vec![DeviceField::Manufacturer]);
        assert!(changed_fields(&before, &before).is_empty());
    }
}
