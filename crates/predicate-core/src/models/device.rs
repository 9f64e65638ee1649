use serde::{Deserialize, Deserializer, Serialize};

use super::DeviceField;

/// Strings that mean "not yet known". Compared exactly: `"unknown"` is a concrete value.
pub const PLACEHOLDERS: &[&str] = &["", "Unknown", "N/A"];

pub fn is_placeholder(value: &str) -> bool {
    PLACEHOLDERS.contains(&value)
}

/// Returns the value only if it is present and not a placeholder.
pub fn concrete(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !is_placeholder(v))
}

/// A predicate device as held in the session working set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRecord {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: String,

    #[serde(default, deserialize_with = "lenient_string")]
    pub device_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clearance_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regulation_number: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clearance_date: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intended_use: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technology: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub performance_summary: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_code: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_class: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_description: Option<String>,

    /// Selection state of the comparison view. Never used for matching.
    #[serde(default)]
    pub added_to_comparison: bool,
}

impl DeviceRecord {
    pub fn new(id: impl Into<String>, device_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            device_name: device_name.into(),
            ..Default::default()
        }
    }

    pub fn with_clearance_key(mut self, key: impl Into<String>) -> Self {
        self.clearance_key = Some(key.into());
        self
    }

    pub fn with_field(mut self, field: DeviceField, value: impl Into<String>) -> Self {
        self.set_field(field, Some(value.into()));
        self
    }

    /// The clearance key, if it can serve as an exact match key.
    pub fn known_clearance_key(&self) -> Option<&str> {
        concrete(self.clearance_key.as_deref())
    }

    pub fn field(&self, field: DeviceField) -> Option<&str> {
        self.slot(field).as_deref()
    }

    pub fn set_field(&mut self, field: DeviceField, value: Option<String>) {
        *self.slot_mut(field) = value;
    }

    /// Fields that still hold no concrete value.
    pub fn missing_fields(&self) -> Vec<DeviceField> {
        DeviceField::ALL
            .into_iter()
            .filter(|f| concrete(self.field(*f)).is_none())
            .collect()
    }

    fn slot(&self, field: DeviceField) -> &Option<String> {
        match field {
            DeviceField::Manufacturer => &self.manufacturer,
            DeviceField::RegulationNumber => &self.regulation_number,
            DeviceField::ClearanceDate => &self.clearance_date,
            DeviceField::IntendedUse => &self.intended_use,
            DeviceField::Technology => &self.technology,
            DeviceField::PerformanceSummary => &self.performance_summary,
            DeviceField::ProductCode => &self.product_code,
            DeviceField::DeviceClass => &self.device_class,
            DeviceField::DeviceDescription => &self.device_description,
        }
    }

    fn slot_mut(&mut self, field: DeviceField) -> &mut Option<String> {
        match field {
            DeviceField::Manufacturer => &mut self.manufacturer,
            DeviceField::RegulationNumber => &mut self.regulation_number,
            DeviceField::ClearanceDate => &mut self.clearance_date,
            DeviceField::IntendedUse => &mut self.intended_use,
            DeviceField::Technology => &mut self.technology,
            DeviceField::PerformanceSummary => &mut self.performance_summary,
            DeviceField::ProductCode => &mut self.product_code,
            DeviceField::DeviceClass => &mut self.device_class,
            DeviceField::DeviceDescription => &mut self.device_description,
        }
    }
}

// Null, numbers and other non-string values become "".
fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => s,
        _ => String::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholders_are_case_sensitive() {
        assert!(is_placeholder(""));
        assert!(is_placeholder("Unknown"));
        assert!(is_placeholder("N/A"));
        assert!(!is_placeholder("unknown"));
        assert!(!is_placeholder("n/a"));
        assert!(!is_placeholder(" "));
    }

    #[test]
    fn test_known_clearance_key_skips_placeholder() {
        let rec = DeviceRecord::new("a", "Device").with_clearance_key("Unknown");
        assert_eq!(rec.known_clearance_key(), None);

        let rec = DeviceRecord::new("a", "Device").with_clearance_key("K123456");
        assert_eq!(rec.known_clearance_key(), Some("K123456"));
    }

    #[test]
    fn test_field_accessors() {
        let mut rec = DeviceRecord::new("a", "Device")
            .with_field(DeviceField::Manufacturer, "Acme Corp");
        assert_eq!(rec.field(DeviceField::Manufacturer), Some("Acme Corp"));

        rec.set_field(DeviceField::Manufacturer, None);
        assert_eq!(rec.manufacturer, None);
    }

    #[test]
    fn test_missing_fields_counts_placeholders() {
        let rec = DeviceRecord::new("a", "Device")
            .with_field(DeviceField::Manufacturer, "Unknown")
            .with_field(DeviceField::IntendedUse, "For X");
        let missing = rec.missing_fields();
        assert!(missing.contains(&DeviceField::Manufacturer));
        assert!(!missing.contains(&DeviceField::IntendedUse));
        assert_eq!(missing.len(), DeviceField::ALL.len() - 1);
    }

    #[test]
    fn test_null_name_deserializes_to_empty() {
        let rec: DeviceRecord =
            serde_json::from_str(r#"{"id":"x","device_name":null}"#).unwrap();
        assert_eq!(rec.device_name, "");

        let rec: DeviceRecord = serde_json::from_str(r#"{"id":"x","device_name":42}"#).unwrap();
        assert_eq!(rec.device_name, "");

        let rec: DeviceRecord = serde_json::from_str(r#"{"id":"x"}"#).unwrap();
        assert_eq!(rec.device_name, "");
        assert!(!rec.added_to_comparison);
    }
}
